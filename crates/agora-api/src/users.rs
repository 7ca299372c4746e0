use axum::{extract::State, Json};

use agora_types::api::UserSummary;

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.db.list_users()?;

    Ok(Json(
        users
            .into_iter()
            .map(|u| UserSummary {
                id: u.id,
                username: u.username,
            })
            .collect(),
    ))
}
