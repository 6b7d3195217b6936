use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::UserBody;
use crate::{
    dto::Deleted,
    error::ApiResult,
    state::AppState,
    store::User,
    validation::{EntityId, Valid},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    body: Valid<UserBody>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Valid(username) = body;
    let user = state.store.create_user(&username).await?;
    info!(user_id = user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users().await?))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> ApiResult<Json<User>> {
    Ok(Json(state.store.get_user(id).await?))
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    body: Valid<UserBody>,
) -> ApiResult<Json<User>> {
    let Valid(username) = body;
    let user = state.store.update_user(id, &username).await?;
    info!(user_id = id, username = %user.username, "user renamed");
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> ApiResult<Json<Deleted<User>>> {
    let user = state.store.delete_user(id).await?;
    info!(user_id = id, "user deleted with favorites");
    Ok(Json(Deleted::new("User deleted successfully", user)))
}
