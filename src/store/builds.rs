//! Builds: listing, search, ownership-agnostic CRUD.
//!
//! Ownership and visibility are decided by the handlers; this module only
//! keeps the tables consistent (favorites follow their build on delete).

use std::cmp::Ordering;

use super::models::{BuildPatch, BuildRecord, BuildView, NewBuild};
use super::{next_id, timestamp, Store, StoreError, Tables};

/// Column a build listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Rating,
    ViewsCount,
    FavoritesCount,
}

impl SortKey {
    /// Parse a `sort` query value; unknown values fall back to creation time.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("rating") => SortKey::Rating,
            Some("views_count") => SortKey::ViewsCount,
            Some("favorites_count") => SortKey::FavoritesCount,
            _ => SortKey::CreatedAt,
        }
    }

    fn compare(self, a: &BuildRecord, b: &BuildRecord) -> Ordering {
        match self {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Rating => a.rating.total_cmp(&b.rating),
            SortKey::ViewsCount => a.views_count.cmp(&b.views_count),
            SortKey::FavoritesCount => a.favorites_count.cmp(&b.favorites_count),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse an `order` query value, case-insensitively. Defaults to descending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

/// Filters and ordering for the public build listing.
#[derive(Debug, Clone, Default)]
pub struct BuildQuery {
    pub character_id: Option<i64>,
    pub element: Option<String>,
    pub search: Option<String>,
    pub sort: SortKey,
    pub order: SortOrder,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn newest_first(a: &BuildRecord, b: &BuildRecord) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

fn best_rated_first(a: &BuildRecord, b: &BuildRecord) -> Ordering {
    b.rating.total_cmp(&a.rating).then_with(|| newest_first(a, b))
}

impl Tables {
    /// Public builds whose title, description or character name contains `needle`.
    fn matching<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = &'a BuildRecord> + 'a {
        let needle = needle.to_lowercase();
        self.public_builds().filter(move |b| {
            contains_ci(&b.title, &needle)
                || b.description
                    .as_deref()
                    .is_some_and(|d| contains_ci(d, &needle))
                || self
                    .characters
                    .get(&b.character_id)
                    .is_some_and(|c| contains_ci(&c.name, &needle))
        })
    }
}

impl Store {
    pub async fn list_public_builds(&self, query: &BuildQuery) -> Vec<BuildView> {
        let tables = self.tables.read().await;

        let mut builds: Vec<&BuildRecord> = match &query.search {
            Some(search) => tables.matching(search).collect(),
            None => tables.public_builds().collect(),
        };
        builds.retain(|b| {
            query.character_id.map_or(true, |id| b.character_id == id)
                && query.element.as_deref().map_or(true, |element| {
                    tables
                        .characters
                        .get(&b.character_id)
                        .is_some_and(|c| c.element.as_str() == element)
                })
        });

        builds.sort_by(|a, b| {
            let ord = query.sort.compare(a, b).then(a.id.cmp(&b.id));
            match query.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        tables.views(builds)
    }

    /// Every build of `user_id`, private ones included, newest first.
    pub async fn user_builds(&self, user_id: i64) -> Vec<BuildView> {
        let tables = self.tables.read().await;
        let mut builds: Vec<&BuildRecord> = tables
            .builds
            .values()
            .filter(|b| b.user_id == user_id)
            .collect();
        builds.sort_by(|a, b| newest_first(a, b));
        tables.views(builds)
    }

    /// Rated public builds, best first; ties broken by favorites.
    pub async fn top_rated_builds(&self, limit: usize) -> Vec<BuildView> {
        let tables = self.tables.read().await;
        let mut builds: Vec<&BuildRecord> =
            tables.public_builds().filter(|b| b.rating > 0.0).collect();
        builds.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then(b.favorites_count.cmp(&a.favorites_count))
        });
        builds.truncate(limit);
        tables.views(builds)
    }

    pub async fn recent_builds(&self, limit: usize) -> Vec<BuildView> {
        let tables = self.tables.read().await;
        let mut builds: Vec<&BuildRecord> = tables.public_builds().collect();
        builds.sort_by(|a, b| newest_first(a, b));
        builds.truncate(limit);
        tables.views(builds)
    }

    pub async fn search_builds(&self, needle: &str, limit: usize) -> Vec<BuildView> {
        let tables = self.tables.read().await;
        let mut builds: Vec<&BuildRecord> = tables.matching(needle).collect();
        builds.sort_by(|a, b| best_rated_first(a, b));
        builds.truncate(limit);
        tables.views(builds)
    }

    /// Public builds of one character, best rated first.
    pub async fn character_builds(&self, character_id: i64) -> Vec<BuildView> {
        let tables = self.tables.read().await;
        let mut builds: Vec<&BuildRecord> = tables
            .public_builds()
            .filter(|b| b.character_id == character_id)
            .collect();
        builds.sort_by(|a, b| best_rated_first(a, b));
        tables.views(builds)
    }

    pub async fn build(&self, id: i64) -> Option<BuildRecord> {
        self.tables.read().await.builds.get(&id).cloned()
    }

    /// Count one view of build `id` and return its joined view.
    pub async fn record_view(&self, id: i64) -> Option<BuildView> {
        let mut tables = self.tables.write().await;
        let build = tables.builds.get_mut(&id)?;
        build.views_count += 1;
        let build = build.clone();
        tables.view(&build)
    }

    pub async fn create_build(&self, new: NewBuild) -> Result<BuildView, StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.characters.contains_key(&new.character_id) {
            return Err(StoreError::NotFound("Character"));
        }
        if !tables.users.contains_key(&new.user_id) {
            return Err(StoreError::NotFound("User"));
        }

        let now = timestamp();
        let build = BuildRecord {
            id: next_id(&mut tables.sequences.builds),
            user_id: new.user_id,
            character_id: new.character_id,
            title: new.title,
            description: new.description,
            artifact_set: new.artifact_set,
            artifact_main_stats: new.artifact_main_stats,
            artifact_sub_stats: new.artifact_sub_stats,
            weapon_name: new.weapon_name,
            weapon_refinement: new.weapon_refinement,
            talent_priority: new.talent_priority,
            team_composition: new.team_composition,
            is_public: new.is_public,
            tags: new.tags,
            rating: 0.0,
            views_count: 0,
            favorites_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.builds.insert(build.id, build.clone());
        tables.view(&build).ok_or(StoreError::NotFound("Build"))
    }

    pub async fn update_build(&self, id: i64, patch: BuildPatch) -> Result<BuildView, StoreError> {
        let mut tables = self.tables.write().await;
        let build = tables
            .builds
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Build"))?;
        patch.apply(build);
        build.updated_at = timestamp();
        let build = build.clone();
        tables.view(&build).ok_or(StoreError::NotFound("Build"))
    }

    /// Remove build `id` together with every favorite pointing at it.
    pub async fn delete_build(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .builds
            .remove(&id)
            .ok_or(StoreError::NotFound("Build"))?;
        tables.favorites.retain(|_, f| f.build_id != id);
        Ok(())
    }
}
