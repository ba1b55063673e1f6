//! Character catalog queries.

use super::models::{Character, Element, PopularCharacter, WeaponType};
use super::{Store, Tables};

/// Filters for the catalog listing. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CharacterQuery {
    pub element: Option<String>,
    pub weapon_type: Option<String>,
    pub rarity: Option<u8>,
    pub region: Option<String>,
    pub search: Option<String>,
}

impl CharacterQuery {
    fn accepts(&self, character: &Character) -> bool {
        let search = self.search.as_deref().map(str::to_lowercase);
        self.element
            .as_deref()
            .map_or(true, |e| character.element.as_str() == e)
            && self
                .weapon_type
                .as_deref()
                .map_or(true, |w| character.weapon_type.as_str() == w)
            && self.rarity.map_or(true, |r| character.rarity == r)
            && self.region.as_deref().map_or(true, |r| character.region == r)
            && search.map_or(true, |s| character.name.to_lowercase().contains(&s))
    }
}

impl Tables {
    fn public_build_count(&self, character_id: i64) -> usize {
        self.public_builds()
            .filter(|b| b.character_id == character_id)
            .count()
    }

    fn sorted_characters(&self, filter: impl Fn(&Character) -> bool) -> Vec<Character> {
        let mut characters: Vec<Character> = self
            .characters
            .values()
            .filter(|c| filter(c))
            .cloned()
            .collect();
        characters.sort_by(|a, b| a.name.cmp(&b.name));
        characters
    }
}

impl Store {
    /// Catalog entries matching `query`, ordered by name.
    pub async fn list_characters(&self, query: &CharacterQuery) -> Vec<Character> {
        let tables = self.tables.read().await;
        tables.sorted_characters(|c| query.accepts(c))
    }

    pub async fn character(&self, id: i64) -> Option<Character> {
        self.tables.read().await.characters.get(&id).cloned()
    }

    pub async fn characters_by_element(&self, element: Element) -> Vec<Character> {
        let tables = self.tables.read().await;
        tables.sorted_characters(|c| c.element == element)
    }

    pub async fn characters_by_weapon(&self, weapon: WeaponType) -> Vec<Character> {
        let tables = self.tables.read().await;
        tables.sorted_characters(|c| c.weapon_type == weapon)
    }

    pub async fn characters_by_rarity(&self, rarity: u8) -> Vec<Character> {
        let tables = self.tables.read().await;
        tables.sorted_characters(|c| c.rarity == rarity)
    }

    /// Characters with the most public builds first.
    pub async fn popular_characters(&self, limit: usize) -> Vec<PopularCharacter> {
        let tables = self.tables.read().await;
        let mut popular: Vec<PopularCharacter> = tables
            .characters
            .values()
            .map(|c| PopularCharacter {
                builds_count: tables.public_build_count(c.id),
                character: c.clone(),
            })
            .collect();
        popular.sort_by(|a, b| {
            b.builds_count
                .cmp(&a.builds_count)
                .then(a.character.id.cmp(&b.character.id))
        });
        popular.truncate(limit);
        popular
    }

    /// Number of public builds for character `id`.
    pub async fn character_build_count(&self, id: i64) -> usize {
        self.tables.read().await.public_build_count(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{NewBuild, NewUser};

    #[tokio::test]
    async fn test_catalog_filters() {
        let store = Store::in_memory();

        let all = store.list_characters(&CharacterQuery::default()).await;
        assert!(!all.is_empty());
        assert!(all.windows(2).all(|w| w[0].name <= w[1].name));

        let pyro = store.characters_by_element(Element::Pyro).await;
        assert!(!pyro.is_empty());
        assert!(pyro.iter().all(|c| c.element == Element::Pyro));

        let query = CharacterQuery {
            element: Some("Pyro".into()),
            rarity: Some(5),
            ..Default::default()
        };
        let filtered = store.list_characters(&query).await;
        assert!(filtered
            .iter()
            .all(|c| c.element == Element::Pyro && c.rarity == 5));

        let bows = store.characters_by_weapon(WeaponType::Bow).await;
        assert!(bows.iter().all(|c| c.weapon_type == WeaponType::Bow));

        let four = store.characters_by_rarity(4).await;
        assert!(four.iter().all(|c| c.rarity == 4));
        assert!(store.characters_by_rarity(3).await.is_empty());
    }

    #[tokio::test]
    async fn test_name_search_is_case_insensitive() {
        let store = Store::in_memory();
        let first = store.character(1).await.unwrap();
        let needle = first.name[..2].to_uppercase();

        let query = CharacterQuery {
            search: Some(needle),
            ..Default::default()
        };
        let found = store.list_characters(&query).await;
        assert!(found.iter().any(|c| c.id == first.id));
    }

    #[tokio::test]
    async fn test_popular_counts_public_builds() {
        let store = Store::in_memory();
        let user = store
            .create_user(NewUser {
                username: "ada".into(),
                email: "ada@x.com".into(),
                password_hash: "hash".into(),
                avatar: None,
            })
            .await
            .unwrap();

        for is_public in [true, true, false] {
            store
                .create_build(NewBuild {
                    user_id: user.id,
                    character_id: 3,
                    title: "Build".into(),
                    description: None,
                    artifact_set: None,
                    artifact_main_stats: None,
                    artifact_sub_stats: None,
                    weapon_name: None,
                    weapon_refinement: 1,
                    talent_priority: None,
                    team_composition: None,
                    is_public,
                    tags: None,
                })
                .await
                .unwrap();
        }

        let popular = store.popular_characters(3).await;
        assert_eq!(popular.len(), 3);
        assert_eq!(popular[0].character.id, 3);
        assert_eq!(popular[0].builds_count, 2);
        assert_eq!(store.character_build_count(3).await, 2);
        assert_eq!(store.character_builds(3).await.len(), 2);
    }
}
