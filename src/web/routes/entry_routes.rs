use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::entities::entry;
use crate::db::services::{self, entry_service, tag_sync_service};
use crate::web::models::{AuthenticatedUser, EntryRequest, EntryResponse};
use crate::web::{AppError, AppState};

pub const INDEX_PAGE_SIZE: u64 = 8;
pub const LIST_PAGE_SIZE: u64 = 24;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Deserialize)]
pub struct ListEntriesQuery {
    limit: Option<u64>,
}

/// Attaches each entry's current tag names.
pub(crate) async fn to_responses(
    db: &DatabaseConnection,
    entries: Vec<entry::Model>,
) -> Result<Vec<EntryResponse>, AppError> {
    let mut responses = Vec::with_capacity(entries.len());
    for entry in entries {
        let tags = services::tags_for_entry(db, &entry).await?;
        responses.push(EntryResponse::new(entry, tags));
    }
    Ok(responses)
}

// --- Public Handlers ---

async fn list_entries_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<Vec<EntryResponse>>, AppError> {
    let limit = query.limit.unwrap_or(LIST_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let entries = entry_service::list_entries(&app_state.db_pool, limit).await?;
    Ok(Json(to_responses(&app_state.db_pool, entries).await?))
}

async fn recent_entries_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<EntryResponse>>, AppError> {
    let entries = entry_service::list_entries(&app_state.db_pool, INDEX_PAGE_SIZE).await?;
    Ok(Json(to_responses(&app_state.db_pool, entries).await?))
}

// --- Protected Handlers ---

async fn create_entry_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<EntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), AppError> {
    let db = &app_state.db_pool;
    let entry = entry_service::create_entry(db, authenticated_user.id, payload.into_input()?).await?;

    tag_sync_service::sync_tags_for_entry(db, &entry).await?;

    let tags = services::tags_for_entry(db, &entry).await?;
    Ok((StatusCode::CREATED, Json(EntryResponse::new(entry, tags))))
}

async fn get_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Path(entry_id): Path<i32>,
) -> Result<Json<EntryResponse>, AppError> {
    let db = &app_state.db_pool;
    let entry = entry_service::get_entry_by_id(db, entry_id).await?;
    let tags = services::tags_for_entry(db, &entry).await?;
    Ok(Json(EntryResponse::new(entry, tags)))
}

async fn update_entry_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(entry_id): Path<i32>,
    Json(payload): Json<EntryRequest>,
) -> Result<Json<EntryResponse>, AppError> {
    let db = &app_state.db_pool;
    let entry = entry_service::update_entry(
        db,
        entry_id,
        authenticated_user.id,
        payload.into_input()?,
    )
    .await?;

    // Add before prune so a tag kept across the edit is never dropped in between.
    let added = tag_sync_service::sync_tags_for_entry(db, &entry).await?;
    let removed = tag_sync_service::prune_stale_associations(db, &entry).await?;
    info!(entry_id, added, removed, "Re-synced tags after edit.");

    let tags = services::tags_for_entry(db, &entry).await?;
    Ok(Json(EntryResponse::new(entry, tags)))
}

async fn delete_entry_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(entry_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    entry_service::delete_entry(&app_state.db_pool, entry_id, authenticated_user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Routers ---

pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_entries_handler))
        .route("/recent", get(recent_entries_handler))
}

pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", axum::routing::post(create_entry_handler))
        .route(
            "/{entry_id}",
            get(get_entry_handler)
                .put(update_entry_handler)
                .delete(delete_entry_handler),
        )
}
