//! User accounts.

use super::models::{NewUser, UserPatch, UserRecord};
use super::{next_id, timestamp, Store, StoreError, Tables};

const EMAIL_TAKEN: &str = "This email is already in use";
const USERNAME_TAKEN: &str = "This username is already taken";

impl Tables {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }
}

impl Store {
    /// Insert a user. Email uniqueness is checked before username uniqueness.
    pub async fn create_user(&self, new: NewUser) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.email_taken(&new.email, None) {
            return Err(StoreError::Conflict(EMAIL_TAKEN.into()));
        }
        if tables.username_taken(&new.username, None) {
            return Err(StoreError::Conflict(USERNAME_TAKEN.into()));
        }

        let now = timestamp();
        let user = UserRecord {
            id: next_id(&mut tables.sequences.users),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            avatar: new.avatar,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn user_by_id(&self, id: i64) -> Option<UserRecord> {
        self.tables.read().await.users.get(&id).cloned()
    }

    pub async fn user_by_email(&self, email: &str) -> Option<UserRecord> {
        let tables = self.tables.read().await;
        tables.users.values().find(|u| u.email == email).cloned()
    }

    /// Apply `patch` to user `id`. Uniqueness ignores the user's own row.
    pub async fn update_user(&self, id: i64, patch: UserPatch) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&id) {
            return Err(StoreError::NotFound("User"));
        }
        if let Some(username) = &patch.username {
            if tables.username_taken(username, Some(id)) {
                return Err(StoreError::Conflict(USERNAME_TAKEN.into()));
            }
        }
        if let Some(email) = &patch.email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::Conflict(EMAIL_TAKEN.into()));
            }
        }

        let user = tables
            .users
            .get_mut(&id)
            .ok_or(StoreError::NotFound("User"))?;
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(hash) = patch.password_hash {
            user.password_hash = hash;
        }
        if let Some(avatar) = patch.avatar {
            user.avatar = Some(avatar);
        }
        user.updated_at = timestamp();
        Ok(user.clone())
    }

    /// `(builds_count, favorites_count)` for a user, private builds included.
    pub async fn user_stats(&self, id: i64) -> (usize, usize) {
        let tables = self.tables.read().await;
        let builds = tables.builds.values().filter(|b| b.user_id == id).count();
        let favorites = tables.favorites.values().filter(|f| f.user_id == id).count();
        (builds, favorites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn test_unique_email_and_username() {
        let store = Store::in_memory();
        let ada = store.create_user(new_user("ada", "ada@x.com")).await.unwrap();
        assert_eq!(ada.id, 1);

        let err = store
            .create_user(new_user("ada", "ada@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), EMAIL_TAKEN);

        let err = store
            .create_user(new_user("ada", "other@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), USERNAME_TAKEN);

        assert_eq!(store.user_by_email("ada@x.com").await.unwrap().id, ada.id);
        assert!(store.user_by_email("nobody@x.com").await.is_none());
    }

    #[tokio::test]
    async fn test_update_ignores_own_row() {
        let store = Store::in_memory();
        let ada = store.create_user(new_user("ada", "ada@x.com")).await.unwrap();
        store.create_user(new_user("bob", "bob@x.com")).await.unwrap();

        let same = UserPatch {
            username: Some("ada".into()),
            email: Some("ada@x.com".into()),
            ..Default::default()
        };
        assert!(store.update_user(ada.id, same).await.is_ok());

        let stolen = UserPatch {
            username: Some("bob".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_user(ada.id, stolen).await,
            Err(StoreError::Conflict(_))
        ));

        let avatar = UserPatch {
            avatar: Some("a.png".into()),
            ..Default::default()
        };
        let updated = store.update_user(ada.id, avatar).await.unwrap();
        assert_eq!(updated.avatar.as_deref(), Some("a.png"));
        assert_eq!(updated.username, "ada");

        assert!(matches!(
            store.update_user(99, UserPatch::default()).await,
            Err(StoreError::NotFound("User"))
        ));
    }
}
