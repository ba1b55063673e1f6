//! Favorites and the per-build favorite counter.
//!
//! Every mutation recomputes `favorites_count` for the affected build while
//! the write lock is still held.

use super::models::{Favorite, FavoriteView};
use super::{next_id, timestamp, Store, StoreError, Tables};

const ALREADY_FAVORITE: &str = "This build is already in your favorites";

impl Tables {
    fn find_favorite(&self, user_id: i64, build_id: i64) -> Option<i64> {
        self.favorites
            .values()
            .find(|f| f.user_id == user_id && f.build_id == build_id)
            .map(|f| f.id)
    }

    fn recount_favorites(&mut self, build_id: i64) {
        let count = self
            .favorites
            .values()
            .filter(|f| f.build_id == build_id)
            .count() as u64;
        if let Some(build) = self.builds.get_mut(&build_id) {
            build.favorites_count = count;
        }
    }

    fn insert_favorite(&mut self, user_id: i64, build_id: i64) -> Favorite {
        let favorite = Favorite {
            id: next_id(&mut self.sequences.favorites),
            user_id,
            build_id,
            created_at: timestamp(),
        };
        self.favorites.insert(favorite.id, favorite.clone());
        self.recount_favorites(build_id);
        favorite
    }
}

impl Store {
    pub async fn add_favorite(&self, user_id: i64, build_id: i64) -> Result<Favorite, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.builds.contains_key(&build_id) {
            return Err(StoreError::NotFound("Build"));
        }
        if tables.find_favorite(user_id, build_id).is_some() {
            return Err(StoreError::Conflict(ALREADY_FAVORITE.into()));
        }
        Ok(tables.insert_favorite(user_id, build_id))
    }

    /// Remove a favorite. Returns `false` when the pair was not favorited.
    pub async fn remove_favorite(&self, user_id: i64, build_id: i64) -> bool {
        let mut tables = self.tables.write().await;
        let Some(id) = tables.find_favorite(user_id, build_id) else {
            return false;
        };
        tables.favorites.remove(&id);
        tables.recount_favorites(build_id);
        true
    }

    /// Flip the favorite state; returns the new state.
    pub async fn toggle_favorite(&self, user_id: i64, build_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.builds.contains_key(&build_id) {
            return Err(StoreError::NotFound("Build"));
        }
        match tables.find_favorite(user_id, build_id) {
            Some(id) => {
                tables.favorites.remove(&id);
                tables.recount_favorites(build_id);
                Ok(false)
            }
            None => {
                tables.insert_favorite(user_id, build_id);
                Ok(true)
            }
        }
    }

    pub async fn is_favorite(&self, user_id: i64, build_id: i64) -> bool {
        self.tables
            .read()
            .await
            .find_favorite(user_id, build_id)
            .is_some()
    }

    /// Build ids favorited by `user_id`, in the order they were favorited.
    pub async fn favorite_build_ids(&self, user_id: i64) -> Vec<i64> {
        let tables = self.tables.read().await;
        tables
            .favorites
            .values()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.build_id)
            .collect()
    }

    /// Favorited public builds of `user_id`, most recently favorited first.
    pub async fn user_favorites(&self, user_id: i64) -> Vec<FavoriteView> {
        let tables = self.tables.read().await;
        let mut favorites: Vec<&Favorite> = tables
            .favorites
            .values()
            .filter(|f| f.user_id == user_id)
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        favorites
            .into_iter()
            .filter_map(|f| {
                let build = tables.builds.get(&f.build_id).filter(|b| b.is_public)?;
                Some(FavoriteView {
                    build: tables.view(build)?,
                    favorited_at: f.created_at,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{BuildPatch, NewBuild, NewUser};

    async fn fixture() -> (Store, i64, i64) {
        let store = Store::in_memory();
        let mut ids = Vec::new();
        for name in ["ada", "bob"] {
            let user = store
                .create_user(NewUser {
                    username: name.into(),
                    email: format!("{name}@x.com"),
                    password_hash: "hash".into(),
                    avatar: None,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let build = store
            .create_build(NewBuild {
                user_id: ids[0],
                character_id: 1,
                title: "Build".into(),
                description: None,
                artifact_set: None,
                artifact_main_stats: None,
                artifact_sub_stats: None,
                weapon_name: None,
                weapon_refinement: 1,
                talent_priority: None,
                team_composition: None,
                is_public: true,
                tags: None,
            })
            .await
            .unwrap();
        (store, ids[1], build.build.id)
    }

    #[tokio::test]
    async fn test_counter_follows_favorites() {
        let (store, bob, build) = fixture().await;

        store.add_favorite(bob, build).await.unwrap();
        assert_eq!(store.build(build).await.unwrap().favorites_count, 1);
        assert!(store.is_favorite(bob, build).await);

        assert!(matches!(
            store.add_favorite(bob, build).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.build(build).await.unwrap().favorites_count, 1);

        assert!(store.remove_favorite(bob, build).await);
        assert!(!store.remove_favorite(bob, build).await);
        assert_eq!(store.build(build).await.unwrap().favorites_count, 0);
    }

    #[tokio::test]
    async fn test_toggle() {
        let (store, bob, build) = fixture().await;

        assert!(store.toggle_favorite(bob, build).await.unwrap());
        assert_eq!(store.favorite_build_ids(bob).await, vec![build]);
        assert!(!store.toggle_favorite(bob, build).await.unwrap());
        assert!(store.favorite_build_ids(bob).await.is_empty());
        assert!(matches!(
            store.toggle_favorite(bob, 999).await,
            Err(StoreError::NotFound("Build"))
        ));
    }

    #[tokio::test]
    async fn test_listing_hides_private_builds() {
        let (store, bob, build) = fixture().await;
        store.add_favorite(bob, build).await.unwrap();
        assert_eq!(store.user_favorites(bob).await.len(), 1);

        let hide = BuildPatch {
            is_public: Some(false),
            ..Default::default()
        };
        store.update_build(build, hide).await.unwrap();
        assert!(store.user_favorites(bob).await.is_empty());
        assert_eq!(store.favorite_build_ids(bob).await, vec![build]);
    }

    #[tokio::test]
    async fn test_delete_build_drops_favorites() {
        let (store, bob, build) = fixture().await;
        store.add_favorite(bob, build).await.unwrap();
        store.delete_build(build).await.unwrap();

        assert!(!store.is_favorite(bob, build).await);
        assert_eq!(store.user_stats(bob).await, (0, 0));
    }
}
