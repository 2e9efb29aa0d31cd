use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json,
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rail_core::Role;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, middleware::Claims, state::AppState};

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct SignupResponse {
    username: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    role: Role,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    state.users.signup(&req.username, &req.password).await?;

    Ok((StatusCode::CREATED, Json(SignupResponse {
        username: req.username.trim().to_string(),
    })))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<Json<AuthResponse>, AppError> {
    let role = state.users
        .authenticate(&req.username, &req.password)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("Invalid credentials".to_string()))?;

    let token = issue_token(&state, req.username.trim(), role)?;
    Ok(Json(AuthResponse { token, role }))
}

pub fn issue_token(state: &AppState, username: &str, role: Role) -> Result<String, AppError> {
    let claims = Claims {
        sub: username.to_owned(),
        role,
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(state.auth.secret.as_bytes()))
        .context("Token encoding failed")?;

    Ok(token)
}
