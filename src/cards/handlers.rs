use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{Card, CardList, RandomParams, SearchFilter, SearchParams};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    validation::{optional, required},
};

pub fn card_routes() -> Router<AppState> {
    Router::new()
        .route("/cards/search", get(search_cards))
        .route("/cards/random", get(random_card))
        .route("/cards/:id", get(get_card))
}

#[instrument(skip(state))]
pub async fn search_cards(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<CardList>> {
    let term = required(params.q, "Search query is required")?;
    let filter = SearchFilter::parse(params.filter.as_deref()).ok_or_else(|| {
        warn!(filter = ?params.filter, "unknown search filter");
        ApiError::InvalidInput("Filter must be 'name' or 'ability'".into())
    })?;

    let list = state.cards.search(&term, filter).await?;
    info!(%term, ?filter, total = list.total_cards, "card search");
    Ok(Json(list))
}

#[instrument(skip(state))]
pub async fn random_card(
    State(state): State<AppState>,
    Query(params): Query<RandomParams>,
) -> ApiResult<Json<CardList>> {
    let ability = optional(params.ability);
    let list = state.cards.random(ability.as_deref()).await?;
    Ok(Json(list))
}

#[instrument(skip(state))]
pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Card>> {
    let not_found = || ApiError::NotFound("Card not found".into());
    // anything that is not a Scryfall id cannot exist upstream
    let id: Uuid = id.parse().map_err(|_| not_found())?;
    let card = state.cards.get(id).await?.ok_or_else(not_found)?;
    Ok(Json(card))
}
