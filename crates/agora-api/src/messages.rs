use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use tracing::error;
use uuid::Uuid;

use agora_db::models::InboxRow;
use agora_db::StoreError;
use agora_types::api::{
    Detail, InboxEntry, MessageView, SendMessageRequest, SendMessageResponse, UpdateMessageRequest,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message_id = Uuid::new_v4();
    let now = chrono::Utc::now();

    state
        .db
        .insert_message(message_id, user.id, req.recipient_id, &req.message, now)?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            detail: "Message sent".into(),
            id: message_id,
            sender_id: user.id,
            recipient_id: req.recipient_id,
            message: req.message,
            created_at: now,
        }),
    ))
}

/// Inbox is recipient-only: the path id must be the caller's own. Sent
/// messages do not show up here.
pub async fn list_inbox(
    State(state): State<AppState>,
    Path(recipient_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<InboxEntry>>, ApiError> {
    if user.id != recipient_id {
        return Err(ApiError::forbidden("You can only read your own messages"));
    }

    // Run the join-heavy listing off the async runtime
    let db_state = state.clone();
    let rows = tokio::task::spawn_blocking(move || db_state.db.inbox(recipient_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {e}");
            ApiError::Internal(e.to_string())
        })??;

    Ok(Json(rows.into_iter().map(inbox_entry).collect()))
}

pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateMessageRequest>,
) -> Result<Json<Detail>, ApiError> {
    match state.db.edit_message(user.id, message_id, &req.message) {
        Ok(()) => Ok(Json(Detail::new("Message updated"))),
        Err(StoreError::NotFound) => Err(ApiError::not_found("Message not found")),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Detail>, ApiError> {
    match state.db.soft_delete_message(user.id, message_id) {
        Ok(()) => Ok(Json(Detail::new("Message deleted"))),
        Err(StoreError::NotFound) => Err(ApiError::not_found("Message not found")),
        Err(e) => Err(e.into()),
    }
}

fn inbox_entry(row: InboxRow) -> InboxEntry {
    InboxEntry {
        message: MessageView {
            id: row.message.id,
            sender_id: row.message.sender_id,
            recipient_id: row.message.recipient_id,
            message: row.message.body,
            created_at: row.message.created_at,
            edited_at: row.message.edited_at,
            is_deleted: row.message.is_deleted,
        },
        username: row.sender_username,
        is_liked: row.is_liked.then_some(true),
        is_disliked: row.is_disliked.then_some(true),
    }
}
