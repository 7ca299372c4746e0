use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use agora_db::models::PostRow;
use agora_db::StoreError;
use agora_types::api::{
    CreatePostRequest, CreatePostResponse, Detail, PostReactionRequest, PostView,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = Uuid::new_v4();

    state
        .db
        .create_post(post_id, user.id, &req.post, chrono::Utc::now())?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            detail: "Post created".into(),
            post_id,
        }),
    ))
}

/// Everyone sees every post; the bearer gate is the only restriction.
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    let posts = state.db.list_posts()?;

    Ok(Json(posts.into_iter().map(post_view).collect()))
}

pub async fn edit_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<Json<Detail>, ApiError> {
    match state.db.edit_post(user.id, post_id, &req.post) {
        Ok(()) => Ok(Json(Detail::new(format!("Post {post_id} updated")))),
        Err(StoreError::NotFound) => Err(ApiError::not_found("Post not found")),
        Err(StoreError::NotOwner) => {
            Err(ApiError::forbidden("You can only edit your own posts"))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Detail>, ApiError> {
    match state.db.delete_post(user.id, post_id) {
        Ok(()) => Ok(Json(Detail::new("Post deleted"))),
        Err(StoreError::NotFound) => Err(ApiError::not_found("Post not found")),
        Err(e) => Err(e.into()),
    }
}

pub async fn react_to_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PostReactionRequest>,
) -> Result<Json<Detail>, ApiError> {
    match state.db.react_to_post(user.id, post_id, req.kind) {
        Ok(()) => Ok(Json(Detail::new(format!(
            "You reacted with {} to post {post_id}",
            req.kind
        )))),
        Err(StoreError::NotFound) => Err(ApiError::not_found("Post not found")),
        Err(StoreError::DuplicateReaction) => {
            Err(ApiError::bad_request("You already reacted to this post"))
        }
        // Unlike message feedback, reacting to your own post is a 400.
        Err(StoreError::OwnContent) => {
            Err(ApiError::bad_request("You cannot react to your own posts"))
        }
        Err(e) => Err(e.into()),
    }
}

fn post_view(row: PostRow) -> PostView {
    PostView {
        post_id: row.id,
        user_id: row.user_id,
        post: row.body,
        likes_count: row.likes_count,
        dislikes_count: row.dislikes_count,
        created_at: row.created_at,
        edited_at: row.edited_at,
    }
}
