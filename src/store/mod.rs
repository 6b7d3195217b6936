//! Entity store: users, messages and favourites behind one repository trait.
//!
//! Two backings exist: [`MemoryStore`] for tests and database-less runs, and
//! [`PgStore`] for production. Both keep the same invariants: usernames are
//! unique, ids are never reused, and deleting a user removes that user's
//! favourites in the same atomic step.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod postgres;
pub mod repo_types;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repo_types::{Favorite, FavoritePatch, Message, NewFavorite, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Message,
    Favorite,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "User",
            Entity::Message => "Message",
            Entity::Favorite => "Favorite",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, username: &str) -> StoreResult<User>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn get_user(&self, id: i64) -> StoreResult<User>;
    async fn update_user(&self, id: i64, username: &str) -> StoreResult<User>;
    /// Removes the user together with all of their favourites.
    async fn delete_user(&self, id: i64) -> StoreResult<User>;

    async fn create_message(&self, text: &str) -> StoreResult<Message>;
    /// Newest first.
    async fn list_messages(&self) -> StoreResult<Vec<Message>>;
    async fn get_message(&self, id: i64) -> StoreResult<Message>;
    async fn update_message(&self, id: i64, text: &str) -> StoreResult<Message>;
    async fn delete_message(&self, id: i64) -> StoreResult<Message>;

    async fn create_favorite(&self, new: NewFavorite) -> StoreResult<Favorite>;
    /// Newest first; an unknown user simply has no favourites.
    async fn list_favorites_for_user(&self, user_id: i64) -> StoreResult<Vec<Favorite>>;
    async fn get_favorite(&self, id: i64) -> StoreResult<Favorite>;
    async fn update_favorite(&self, id: i64, patch: FavoritePatch) -> StoreResult<Favorite>;
    async fn delete_favorite(&self, id: i64) -> StoreResult<Favorite>;
}

/// Trims a required text field, rejecting blank input.
pub(crate) fn required<'a>(value: &'a str, message: &str) -> StoreResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidInput(message.to_string()));
    }
    Ok(trimmed)
}

pub(crate) const USERNAME_REQUIRED: &str = "Username is required";
pub(crate) const TEXT_REQUIRED: &str = "Text is required";
pub(crate) const CARD_NAME_REQUIRED: &str = "Card name is required";
pub(crate) const UNKNOWN_USER: &str = "User does not exist";
