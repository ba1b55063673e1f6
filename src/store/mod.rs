//! Persistence gateway.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     StoreConfig → open() → load JSON snapshot (if present)
//!     → seed character catalog when empty
//!
//! Request:
//!     handler → Store query method
//!     → acquire RwLock (read for queries, write for mutations)
//!     → operate on Tables → release at end of the call
//!
//! Shutdown:
//!     save() → serialize Tables → write snapshot
//! ```
//!
//! # Design Decisions
//! - One explicit handle, cloned into application state (Arc inside)
//! - Every public method is one unit of work under one lock acquisition
//! - Uniqueness and counter invariants are enforced inside the write lock
//! - Ids come from per-table sequences and are never reused

mod builds;
mod characters;
mod favorites;
pub mod models;
mod seed;
mod users;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::StoreConfig;

pub use builds::{BuildQuery, SortKey, SortOrder};
pub use characters::CharacterQuery;
pub use models::{
    BuildPatch, BuildRecord, BuildView, Character, Element, Favorite, FavoriteView, NewBuild,
    NewUser, PopularCharacter, UserPatch, UserProfile, UserRecord, WeaponType, RARITIES,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness rule was violated. Carries the client-facing message.
    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Sequences {
    users: i64,
    characters: i64,
    builds: i64,
    favorites: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    users: BTreeMap<i64, UserRecord>,
    characters: BTreeMap<i64, Character>,
    builds: BTreeMap<i64, BuildRecord>,
    favorites: BTreeMap<i64, Favorite>,
    sequences: Sequences,
}

impl Tables {
    /// Join a build with its character and author. `None` if either is gone.
    fn view(&self, build: &BuildRecord) -> Option<BuildView> {
        let character = self.characters.get(&build.character_id)?;
        let author = self.users.get(&build.user_id)?;
        Some(BuildView {
            build: build.clone(),
            character_name: character.name.clone(),
            element: character.element,
            weapon_type: character.weapon_type,
            rarity: character.rarity,
            region: character.region.clone(),
            character_icon: character.icon_url.clone(),
            author: author.username.clone(),
            author_avatar: author.avatar.clone(),
        })
    }

    fn views<'a>(&'a self, builds: impl IntoIterator<Item = &'a BuildRecord>) -> Vec<BuildView> {
        builds.into_iter().filter_map(|b| self.view(b)).collect()
    }

    fn public_builds(&self) -> impl Iterator<Item = &BuildRecord> {
        self.builds.values().filter(|b| b.is_public)
    }
}

/// Shared handle to the application's data.
#[derive(Debug, Clone)]
pub struct Store {
    tables: Arc<RwLock<Tables>>,
    snapshot: Option<PathBuf>,
}

impl Store {
    /// Open the store described by `config`, loading its snapshot if one exists.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let snapshot = config.snapshot_path.as_ref().map(PathBuf::from);

        let existing = match &snapshot {
            Some(path) => tokio::fs::try_exists(path).await?.then_some(path),
            None => None,
        };
        let mut tables = match existing {
            Some(path) => {
                let tables = load_snapshot(path).await?;
                tracing::info!(
                    path = %path.display(),
                    users = tables.users.len(),
                    builds = tables.builds.len(),
                    "Loaded store snapshot"
                );
                tables
            }
            None => Tables::default(),
        };

        if config.seed_catalog && tables.characters.is_empty() {
            let seeded = seed::seed_catalog(&mut tables);
            tracing::info!(characters = seeded, "Seeded character catalog");
        }

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
            snapshot,
        })
    }

    /// A seeded store with no snapshot file.
    pub fn in_memory() -> Self {
        let mut tables = Tables::default();
        seed::seed_catalog(&mut tables);
        Self {
            tables: Arc::new(RwLock::new(tables)),
            snapshot: None,
        }
    }

    /// Write the snapshot, if a path is configured.
    pub async fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let bytes = {
            let tables = self.tables.read().await;
            serde_json::to_vec_pretty(&*tables)?
        };

        // Staged write, then rename over the target.
        let staging = staging_path(path);
        tokio::fs::write(&staging, &bytes).await?;
        tokio::fs::rename(&staging, path).await?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved store snapshot");
        Ok(())
    }
}

async fn load_snapshot(path: &Path) -> Result<Tables, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// `<path>.tmp`, next to the snapshot so the rename stays on one filesystem.
fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_owned();
    staged.push(".tmp");
    PathBuf::from(staged)
}

fn timestamp() -> i64 {
    crate::auth::unix_now()
}
