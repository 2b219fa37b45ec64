//! Session check for the protected routers.

use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};
use std::sync::Arc;
use tracing::warn;

use crate::db::error::ServiceError;
use crate::db::services::user_service;
use crate::web::models::{AuthenticatedUser, Claims};
use crate::web::{AppState, error::AppError};

pub const AUTH_COOKIE: &str = "token";

/// The `Authorization: Bearer` header wins over the session cookie.
fn session_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            jar.get(AUTH_COOKIE)
                .map(|cookie| cookie.value().to_owned())
                .filter(|token| !token.is_empty())
        })
}

pub fn decode_session(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        warn!(error = ?e, "Rejected session token.");
        AppError::InvalidCredentials
    })
}

/// Resolves the session to a stored user. A valid signature is not enough:
/// the account it names must still exist, since entries reference it.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(req.headers(), &jar).ok_or(AppError::InvalidCredentials)?;
    let claims = decode_session(&token, &state.config.jwt_secret)?;

    let user = match user_service::get_user_by_id(&state.db_pool, claims.user_id).await {
        Ok(user) => user,
        Err(ServiceError::NotFound { .. }) => {
            warn!(user_id = claims.user_id, "Session names an unknown user.");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    req.extensions_mut().insert(AuthenticatedUser {
        id: user.id,
        email: user.email,
    });
    Ok(next.run(req).await)
}
