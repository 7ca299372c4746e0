use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Form, Json};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use agora_db::Database;
use agora_types::api::{SigninForm, SigninResponse, SignupRequest, SignupResponse};

use crate::error::ApiError;
use crate::token;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Exact, case-sensitive match.
    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(ApiError::conflict("A user with this name already exists"));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?
        .to_string();

    state
        .db
        .create_user(Uuid::new_v4(), &req.username, &password_hash)?;

    info!(username = %req.username, "user created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            detail: "User created".into(),
            username: req.username,
        }),
    ))
}

pub async fn signin(
    State(state): State<AppState>,
    Form(form): Form<SigninForm>,
) -> Result<Json<SigninResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_username(&form.username)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(format!("stored hash unreadable: {e}")))?;

    if Argon2::default()
        .verify_password(form.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(ApiError::unauthorized("Wrong password"));
    }

    let access_token = token::issue(&state.jwt_secret, &user.username)
        .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))?;

    // One token row per user; the id and secret only matter on first login.
    state
        .db
        .upsert_token(user.id, &access_token, Uuid::new_v4(), &token_secret())?;

    Ok(Json(SigninResponse {
        detail: "Signed in".into(),
        id: user.id,
        username: user.username,
        access_token,
        token_type: "bearer".into(),
    }))
}

fn token_secret() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
