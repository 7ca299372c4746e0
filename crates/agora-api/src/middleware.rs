use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::token::{self, TokenValidity};

/// Authenticated identity injected into request extensions by
/// [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Bearer-token gate for the protected routes. Two independent checks must
/// both pass: the signature has to verify, and the literal token string has
/// to match the row currently stored for its user. Either failing is a
/// plain 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("You need to sign in"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("You need to sign in"))?;

    let claims = match token::verify(&state.jwt_secret, token) {
        TokenValidity::Valid(claims) => claims,
        TokenValidity::Invalid(reason) => {
            debug!(?reason, "rejected bearer token");
            return Err(ApiError::unauthorized("You need to sign in"));
        }
    };

    let row = state
        .db
        .get_token(token)?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    req.extensions_mut().insert(AuthUser {
        id: row.user_id,
        username: claims.sub,
    });

    Ok(next.run(req).await)
}
