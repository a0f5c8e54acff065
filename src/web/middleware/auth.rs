use axum::{
    body::Body as AxumBody,
    extract::{Extension, State},
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::entities::user;
use crate::web::models::{AuthenticatedUser, Claims};
use crate::web::{AppState, error::AppError};

fn extract_token(req: &Request<AxumBody>, jar: &CookieJar) -> Option<String> {
    // Authorization header first, then the cookie
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .or_else(|| jar.get("token").map(|c| c.value().to_string()))
}

/// Resolves the caller, if any.
///
/// Inserts `Option<AuthenticatedUser>` into the request extensions: `None`
/// when no token was sent. A token that fails verification, or that names a
/// user who no longer exists, is rejected with 401 rather than downgraded to
/// anonymous.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_token(&req, &jar) else {
        req.extensions_mut().insert(None::<AuthenticatedUser>);
        return Ok(next.run(req).await);
    };

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!(error = ?e, "JWT decoding error during auth middleware.");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    let user_id = token_data.claims.user_id;
    if user::Entity::find_by_id(user_id)
        .one(&state.db_pool)
        .await?
        .is_none()
    {
        warn!(user_id, "Token refers to an unknown user.");
        return Err(AppError::Unauthorized("Invalid or expired token".to_string()));
    }

    debug!(user_id, "Request authenticated.");
    req.extensions_mut().insert(Some(AuthenticatedUser {
        id: user_id,
        username: token_data.claims.sub,
    }));
    Ok(next.run(req).await)
}

/// Route layer for endpoints that need a caller. Runs after [`optional_auth`]
/// and exposes the caller as a plain `Extension<AuthenticatedUser>`.
pub async fn require_auth(
    Extension(auth_user): Extension<Option<AuthenticatedUser>>,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let user = auth_user.ok_or_else(|| {
        AppError::Unauthorized("Authentication credentials were not provided".to_string())
    })?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
