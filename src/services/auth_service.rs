use axum::Extension;
use bcrypt::verify;
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};
use validator::ValidateEmail;

use crate::db::entities::user;
use crate::db::error::ServiceError;
use crate::db::services::user_service;
use crate::server::config::ServerConfig;
use crate::web::error::AppError;
use crate::web::models::{
    AuthenticatedUser, Claims, LoginRequest, LoginResponse, RegisterRequest, UserResponse,
};

pub const MIN_PASSWORD_LENGTH: usize = 2;

pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
}

pub async fn register_user(
    db: &DatabaseConnection,
    req: RegisterRequest,
    hash_cost: u32,
) -> Result<UserResponse, AppError> {
    let email = req.email.trim();
    if !is_valid_email(email) {
        return Err(AppError::InvalidInput("A valid email address is required.".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    if req.password != req.password_confirm {
        return Err(AppError::InvalidInput("Passwords must match.".to_string()));
    }

    let user_model = user_service::create_user(db, email, &req.password, hash_cost).await?;

    Ok(UserResponse {
        id: user_model.id,
        email: user_model.email,
    })
}

pub async fn login_user(
    db: &DatabaseConnection,
    req: LoginRequest,
    config: &ServerConfig,
) -> Result<LoginResponse, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput("Email and password are required.".to_string()));
    }

    let user = match user_service::get_user_by_email(db, &req.email).await {
        Ok(u) => u,
        Err(ServiceError::NotFound { .. }) => return Err(AppError::UserNotFound),
        Err(e) => return Err(e.into()),
    };

    let valid_password = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;

    if !valid_password {
        warn!(user_id = user.id, "Rejected login with wrong password.");
        return Err(AppError::InvalidCredentials);
    }

    create_jwt_for_user(&user, &config.jwt_secret, config.token_ttl_hours)
}

pub fn create_jwt_for_user(
    user: &user::Model,
    jwt_secret: &str,
    ttl_hours: i64,
) -> Result<LoginResponse, AppError> {
    let expiration = TimeDelta::try_hours(ttl_hours)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .and_then(|expires_at| usize::try_from(expires_at.timestamp()).ok())
        .ok_or_else(|| {
            AppError::TokenCreationError(format!("Token lifetime of {ttl_hours} hours is out of range"))
        })?;

    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        exp: expiration,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::TokenCreationError(format!("Failed to create token: {e}")))?;

    Ok(LoginResponse {
        token,
        user_id: user.id,
        email: user.email.clone(),
    })
}

/// Creates the configured default account if it does not exist yet.
pub async fn seed_default_user(
    db: &DatabaseConnection,
    config: &ServerConfig,
) -> Result<(), ServiceError> {
    let (Some(email), Some(password)) = (&config.seed_user_email, &config.seed_user_password)
    else {
        return Ok(());
    };

    match user_service::create_user(db, email, password, config.bcrypt_cost).await {
        Ok(user) => {
            info!(user_id = user.id, "Seeded default user.");
            Ok(())
        }
        Err(ServiceError::Duplicate { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}

pub async fn me(
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<axum::Json<UserResponse>, AppError> {
    Ok(axum::Json(UserResponse {
        id: user.id,
        email: user.email,
    }))
}
