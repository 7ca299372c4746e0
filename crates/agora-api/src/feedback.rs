use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use agora_db::StoreError;
use agora_types::api::Detail;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

pub async fn like_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Detail>, ApiError> {
    match state.db.like_message(user.id, message_id) {
        Ok(()) => Ok(Json(Detail::new("Like set"))),
        Err(StoreError::OwnContent) => {
            Err(ApiError::forbidden("You cannot like your own message"))
        }
        Err(StoreError::DuplicateReaction) => Err(ApiError::bad_request("Like already set")),
        Err(StoreError::NotFound) => Err(ApiError::not_found("Message not found")),
        Err(e) => Err(e.into()),
    }
}

pub async fn dislike_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Detail>, ApiError> {
    match state.db.dislike_message(user.id, message_id) {
        Ok(()) => Ok(Json(Detail::new("Dislike set"))),
        Err(StoreError::OwnContent) => {
            Err(ApiError::forbidden("You cannot dislike your own message"))
        }
        Err(StoreError::DuplicateReaction) => Err(ApiError::bad_request("Dislike already set")),
        Err(StoreError::NotFound) => Err(ApiError::not_found("Message not found")),
        Err(e) => Err(e.into()),
    }
}
