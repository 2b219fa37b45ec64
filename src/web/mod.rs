use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode, header},
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::server::config::ServerConfig;
use crate::services::auth_service;
use crate::web::{
    middleware::auth,
    models::{LoginRequest, RegisterRequest},
    routes::*,
};

pub use crate::web::error::AppError;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
}

async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<models::UserResponse>), AppError> {
    let user_response =
        auth_service::register_user(&app_state.db_pool, payload, app_state.config.bcrypt_cost)
            .await?;
    Ok((StatusCode::CREATED, Json(user_response)))
}

fn auth_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((auth::AUTH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let login_response =
        auth_service::login_user(&app_state.db_pool, payload, &app_state.config).await?;

    let cookie = auth_cookie(login_response.token.clone(), app_state.config.cookie_secure);
    Ok(([(header::SET_COOKIE, cookie.to_string())], Json(login_response)))
}

async fn logout_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut cookie = auth_cookie(String::new(), app_state.config.cookie_secure);
    cookie.make_removal();
    (
        [(header::SET_COOKIE, cookie.to_string())],
        Json(serde_json::json!({ "message": "You have been logged out" })),
    )
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(db_pool: DatabaseConnection, config: Arc<ServerConfig>) -> Router {
    let app_state = Arc::new(AppState { db_pool, config });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route(
            "/api/auth/me",
            get(auth_service::me).route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .nest(
            "/api/entries",
            entry_routes::create_public_router().merge(
                entry_routes::create_protected_router()
                    .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
            ),
        )
        .nest(
            "/api/tags",
            tag_routes::create_tags_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .with_state(app_state)
        .layer(cors)
}
