use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::MessageBody;
use crate::{
    dto::Deleted,
    error::ApiResult,
    state::AppState,
    store::Message,
    validation::{EntityId, Valid},
};

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(create_message).get(list_messages))
        .route(
            "/messages/:id",
            get(get_message).put(update_message).delete(delete_message),
        )
}

#[instrument(skip(state, body))]
pub async fn create_message(
    State(state): State<AppState>,
    body: Valid<MessageBody>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let Valid(text) = body;
    let message = state.store.create_message(&text).await?;
    info!(message_id = message.id, "message created");
    Ok((StatusCode::CREATED, Json(message)))
}

/// Newest first.
#[instrument(skip(state))]
pub async fn list_messages(State(state): State<AppState>) -> ApiResult<Json<Vec<Message>>> {
    Ok(Json(state.store.list_messages().await?))
}

#[instrument(skip(state))]
pub async fn get_message(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> ApiResult<Json<Message>> {
    Ok(Json(state.store.get_message(id).await?))
}

#[instrument(skip(state, body))]
pub async fn update_message(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    body: Valid<MessageBody>,
) -> ApiResult<Json<Message>> {
    let Valid(text) = body;
    let message = state.store.update_message(id, &text).await?;
    info!(message_id = id, "message updated");
    Ok(Json(message))
}

#[instrument(skip(state))]
pub async fn delete_message(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> ApiResult<Json<Deleted<Message>>> {
    let message = state.store.delete_message(id).await?;
    info!(message_id = id, "message deleted");
    Ok(Json(Deleted::new("Message deleted successfully", message)))
}
