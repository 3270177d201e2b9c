use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use parkwise_core::model::{NewUser, Role, User};
use parkwise_shared::Masked;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::AppError, extract::AppJson, middleware::Claims, state::{AppState, AuthConfig}};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: Masked<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: Masked<String>,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    role: Role,
    user_id: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn issue_token(auth: &AuthConfig, user: &User) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role,
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

/// POST /v1/auth/register
async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state
        .users
        .create_user(&NewUser {
            username: req.username,
            email: req.email,
            password: req.password,
            role: Role::User,
        })
        .await?;

    info!("Registered user {} ({})", user.id, user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /v1/auth/login
async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::AuthenticationError("Invalid credentials".to_string());

    let user = state.users.find_by_email(&req.email).await?.ok_or_else(invalid)?;
    if user.password != req.password {
        return Err(invalid());
    }

    let token = issue_token(&state.auth, &user)?;
    info!("User {} logged in as {}", user.id, user.role);

    Ok(Json(AuthResponse { token, role: user.role, user_id: user.id }))
}
