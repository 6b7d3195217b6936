use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CreateFavoriteBody, UpdateFavoriteBody};
use crate::{
    dto::Deleted,
    error::ApiResult,
    state::AppState,
    store::Favorite,
    validation::{EntityId, Valid, ValidOrEmpty},
};

/// `GET /favorites/:id` takes a user id; `PUT`/`DELETE` take a favourite id.
pub fn favorite_routes() -> Router<AppState> {
    Router::new().route("/favorites", post(create_favorite)).route(
        "/favorites/:id",
        get(list_user_favorites)
            .put(update_favorite)
            .delete(delete_favorite),
    )
}

#[instrument(skip(state, body))]
pub async fn create_favorite(
    State(state): State<AppState>,
    body: Valid<CreateFavoriteBody>,
) -> ApiResult<(StatusCode, Json<Favorite>)> {
    let Valid(new) = body;
    let favorite = state.store.create_favorite(new).await?;
    info!(
        favorite_id = favorite.id,
        user_id = favorite.user_id,
        card = %favorite.card_name,
        "favorite saved"
    );
    Ok((StatusCode::CREATED, Json(favorite)))
}

#[instrument(skip(state))]
pub async fn list_user_favorites(
    State(state): State<AppState>,
    EntityId(user_id): EntityId,
) -> ApiResult<Json<Vec<Favorite>>> {
    Ok(Json(state.store.list_favorites_for_user(user_id).await?))
}

#[instrument(skip(state, body))]
pub async fn update_favorite(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    body: ValidOrEmpty<UpdateFavoriteBody>,
) -> ApiResult<Json<Favorite>> {
    let ValidOrEmpty(patch) = body;
    let favorite = state.store.update_favorite(id, patch).await?;
    info!(favorite_id = id, "favorite updated");
    Ok(Json(favorite))
}

#[instrument(skip(state))]
pub async fn delete_favorite(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> ApiResult<Json<Deleted<Favorite>>> {
    let favorite = state.store.delete_favorite(id).await?;
    info!(favorite_id = id, "favorite removed");
    Ok(Json(Deleted::new("Favorite removed successfully", favorite)))
}
