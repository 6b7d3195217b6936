use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Message record, not tied to any user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A card saved by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub card_name: String,
    pub scryfall_id: Option<String>,
    pub ability_type: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Insert payload for a favourite; ids and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewFavorite {
    pub user_id: i64,
    pub card_name: String,
    pub scryfall_id: Option<String>,
    pub ability_type: Option<String>,
    pub notes: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct FavoritePatch {
    pub notes: Option<String>,
    pub ability_type: Option<String>,
}

impl FavoritePatch {
    pub fn is_empty(&self) -> bool {
        self.notes.is_none() && self.ability_type.is_none()
    }

    pub(crate) fn apply(self, fav: &mut Favorite) {
        if let Some(notes) = self.notes {
            fav.notes = Some(notes);
        }
        if let Some(ability_type) = self.ability_type {
            fav.ability_type = Some(ability_type);
        }
    }
}
