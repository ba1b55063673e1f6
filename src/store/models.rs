//! Persisted records and the joined views handed to handlers.
//!
//! # Design Decisions
//! - Records are what the snapshot stores; views are computed per query
//! - Views flatten the underlying record so clients see one flat object
//! - Element and weapon names are closed sets, parsed case-sensitively

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A registered account, including its password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserRecord {
    /// The account as shown to clients.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public projection of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
}

/// Fields a user may change on their own profile. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub avatar: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.avatar.is_none()
    }
}

/// Error for a value outside one of the closed catalog sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value `{0}`")]
pub struct UnknownVariant(pub String);

macro_rules! closed_set {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| UnknownVariant(s.to_string()))
            }
        }
    };
}

closed_set! {
    /// Elemental affinity of a character.
    Element { Pyro, Hydro, Anemo, Electro, Dendro, Cryo, Geo }
}

closed_set! {
    /// Weapon class a character wields.
    WeaponType { Sword, Claymore, Polearm, Bow, Catalyst }
}

/// Star ratings a character can have.
pub const RARITIES: [u8; 2] = [4, 5];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub element: Element,
    pub weapon_type: WeaponType,
    pub rarity: u8,
    pub region: String,
    pub icon_url: Option<String>,
    pub description: Option<String>,
}

/// A character together with the number of public builds for it.
#[derive(Debug, Clone, Serialize)]
pub struct PopularCharacter {
    #[serde(flatten)]
    pub character: Character,
    pub builds_count: usize,
}

/// A published build as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    pub id: i64,
    pub user_id: i64,
    pub character_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub artifact_set: Option<String>,
    pub artifact_main_stats: Option<Value>,
    pub artifact_sub_stats: Option<Value>,
    pub weapon_name: Option<String>,
    pub weapon_refinement: u8,
    pub talent_priority: Option<String>,
    pub team_composition: Option<Value>,
    pub is_public: bool,
    pub tags: Option<Value>,
    pub rating: f64,
    pub views_count: u64,
    pub favorites_count: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for a new build. The owner comes from the session, never the body.
#[derive(Debug, Clone)]
pub struct NewBuild {
    pub user_id: i64,
    pub character_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub artifact_set: Option<String>,
    pub artifact_main_stats: Option<Value>,
    pub artifact_sub_stats: Option<Value>,
    pub weapon_name: Option<String>,
    pub weapon_refinement: u8,
    pub talent_priority: Option<String>,
    pub team_composition: Option<Value>,
    pub is_public: bool,
    pub tags: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub artifact_set: Option<String>,
    pub artifact_main_stats: Option<Value>,
    pub artifact_sub_stats: Option<Value>,
    pub weapon_name: Option<String>,
    pub weapon_refinement: Option<u8>,
    pub talent_priority: Option<String>,
    pub team_composition: Option<Value>,
    pub is_public: Option<bool>,
    pub tags: Option<Value>,
}

impl BuildPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.artifact_set.is_none()
            && self.artifact_main_stats.is_none()
            && self.artifact_sub_stats.is_none()
            && self.weapon_name.is_none()
            && self.weapon_refinement.is_none()
            && self.talent_priority.is_none()
            && self.team_composition.is_none()
            && self.is_public.is_none()
            && self.tags.is_none()
    }

    pub(crate) fn apply(self, build: &mut BuildRecord) {
        if let Some(title) = self.title {
            build.title = title;
        }
        if let Some(refinement) = self.weapon_refinement {
            build.weapon_refinement = refinement;
        }
        if let Some(is_public) = self.is_public {
            build.is_public = is_public;
        }

        let optional = [
            (&mut build.description, self.description),
            (&mut build.artifact_set, self.artifact_set),
            (&mut build.weapon_name, self.weapon_name),
            (&mut build.talent_priority, self.talent_priority),
        ];
        for (slot, value) in optional {
            if value.is_some() {
                *slot = value;
            }
        }

        let json = [
            (&mut build.artifact_main_stats, self.artifact_main_stats),
            (&mut build.artifact_sub_stats, self.artifact_sub_stats),
            (&mut build.team_composition, self.team_composition),
            (&mut build.tags, self.tags),
        ];
        for (slot, value) in json {
            if value.is_some() {
                *slot = value;
            }
        }
    }
}

/// A build joined with its character and author.
#[derive(Debug, Clone, Serialize)]
pub struct BuildView {
    #[serde(flatten)]
    pub build: BuildRecord,
    pub character_name: String,
    pub element: Element,
    pub weapon_type: WeaponType,
    pub rarity: u8,
    pub region: String,
    pub character_icon: Option<String>,
    pub author: String,
    pub author_avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub build_id: i64,
    pub created_at: i64,
}

/// A favorited build, as listed for its user.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteView {
    #[serde(flatten)]
    pub build: BuildView,
    pub favorited_at: i64,
}
