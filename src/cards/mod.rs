//! Read-only card lookup backed by an external card database.

use async_trait::async_trait;
use axum::Router;
use uuid::Uuid;

pub mod dto;
pub mod filter;
mod handlers;
mod scryfall;

pub use dto::{Card, CardList, SearchFilter};
pub use scryfall::{CardError, ScryfallClient};

use crate::state::AppState;

#[async_trait]
pub trait CardSource: Send + Sync {
    /// Cards whose name (or oracle text, for [`SearchFilter::Ability`])
    /// contains `term`, ignoring case.
    async fn search(&self, term: &str, filter: SearchFilter) -> Result<CardList, CardError>;
    async fn random(&self, ability: Option<&str>) -> Result<CardList, CardError>;
    async fn get(&self, id: Uuid) -> Result<Option<Card>, CardError>;
}

pub fn router() -> Router<AppState> {
    handlers::card_routes()
}
