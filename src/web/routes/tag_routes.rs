use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use std::sync::Arc;

use crate::db::services::{entry_service, tag_service, tag_sync_service};
use crate::web::models::{CreateTagRequest, EntryResponse, TagResponse};
use crate::web::routes::entry_routes::to_responses;
use crate::web::{AppError, AppState};

// --- Route Handlers ---

async fn create_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<TagResponse>), AppError> {
    let db = &app_state.db_pool;
    let tag = tag_service::create_tag(db, &payload.name).await?;

    let tagged_entries = tag_sync_service::sync_entries_for_tag(db, &tag).await?;

    Ok((
        StatusCode::CREATED,
        Json(TagResponse {
            id: tag.id,
            name: tag.name,
            tagged_entries,
        }),
    ))
}

async fn list_tags_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<tag_service::TagWithCount>>, AppError> {
    let tags = tag_service::list_tags_with_count(&app_state.db_pool).await?;
    Ok(Json(tags))
}

async fn tag_entries_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<Json<Vec<EntryResponse>>, AppError> {
    let db = &app_state.db_pool;
    let tag = tag_service::get_tag_by_id(db, tag_id).await?;
    let entries = entry_service::entries_for_tag(db, &tag).await?;
    Ok(Json(to_responses(db, entries).await?))
}

async fn delete_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    tag_service::delete_tag(&app_state.db_pool, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Router ---

pub fn create_tags_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tags_handler).post(create_tag_handler))
        .route("/{tag_id}", delete(delete_tag_handler))
        .route("/{tag_id}/entries", get(tag_entries_handler))
}
