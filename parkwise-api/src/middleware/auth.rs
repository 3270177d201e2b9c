use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use parkwise_core::model::Role;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::AuthenticationError("Malformed token subject".to_string()))
    }
}

fn authenticate(state: &AppState, req: &Request) -> Result<Claims, AppError> {
    let Authorization(bearer) = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

// ============================================================================
// Role Middleware
// ============================================================================

async fn require_role(state: AppState, role: Role, mut req: Request, next: Next) -> Result<Response, AppError> {
    let claims = authenticate(&state, &req)?;

    if claims.role != role {
        return Err(AppError::AuthorizationError(format!("{} access required", role)));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub async fn user_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(state, Role::User, req, next).await
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(state, Role::Admin, req, next).await
}
