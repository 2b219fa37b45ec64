use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::db::entities::{entry, prelude::Entry, tag};
use crate::db::error::ServiceError;
use crate::db::services::entry_tag_service;

/// Validated field values for creating or editing an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInput {
    pub title: String,
    pub time_spent: i32,
    pub date_created: NaiveDate,
    pub content: String,
    pub resources: Option<String>,
}

impl EntryInput {
    /// Trims the text fields and rejects values the journal cannot store.
    pub fn normalized(self) -> Result<Self, ServiceError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(ServiceError::Validation("Title is required.".to_string()));
        }
        let content = self.content.trim().to_owned();
        if content.is_empty() {
            return Err(ServiceError::Validation("Content is required.".to_string()));
        }
        if self.time_spent < 0 {
            return Err(ServiceError::Validation(
                "Time spent cannot be negative.".to_string(),
            ));
        }
        let resources = self
            .resources
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty());

        Ok(EntryInput {
            title,
            time_spent: self.time_spent,
            date_created: self.date_created,
            content,
            resources,
        })
    }
}

async fn ensure_title_available(
    db: &DatabaseConnection,
    title: &str,
    except_id: Option<i32>,
) -> Result<(), ServiceError> {
    let mut query = Entry::find().filter(entry::Column::Title.eq(title));
    if let Some(id) = except_id {
        query = query.filter(entry::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(ServiceError::duplicate("Entry", title));
    }
    Ok(())
}

/// Creates a new entry owned by `user_id`.
pub async fn create_entry(
    db: &DatabaseConnection,
    user_id: i32,
    input: EntryInput,
) -> Result<entry::Model, ServiceError> {
    let input = input.normalized()?;
    ensure_title_available(db, &input.title, None).await?;

    let title = input.title.clone();
    let new_entry = entry::ActiveModel {
        user_id: Set(user_id),
        title: Set(input.title),
        time_spent: Set(input.time_spent),
        date_created: Set(input.date_created),
        content: Set(input.content),
        resources: Set(input.resources),
        ..Default::default()
    };

    let model = new_entry
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write(e, "Entry", &title))?;
    info!(entry_id = model.id, user_id, "Created entry.");
    Ok(model)
}

/// Retrieves an entry by its ID.
pub async fn get_entry_by_id(
    db: &DatabaseConnection,
    entry_id: i32,
) -> Result<entry::Model, ServiceError> {
    Entry::find_by_id(entry_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Entry", entry_id))
}

/// Retrieves an entry only if `user_id` owns it. Entries owned by someone
/// else are reported as missing.
pub async fn get_owned_entry(
    db: &DatabaseConnection,
    entry_id: i32,
    user_id: i32,
) -> Result<entry::Model, ServiceError> {
    Entry::find_by_id(entry_id)
        .filter(entry::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Entry", entry_id))
}

/// Most recent entries first, by date then by id.
pub async fn list_entries(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<entry::Model>, ServiceError> {
    Ok(Entry::find()
        .order_by_desc(entry::Column::DateCreated)
        .order_by_desc(entry::Column::Id)
        .limit(limit)
        .all(db)
        .await?)
}

/// Entries currently associated with a tag.
pub async fn entries_for_tag(
    db: &DatabaseConnection,
    tag: &tag::Model,
) -> Result<Vec<entry::Model>, ServiceError> {
    Ok(tag
        .find_related(Entry)
        .order_by_desc(entry::Column::DateCreated)
        .order_by_desc(entry::Column::Id)
        .all(db)
        .await?)
}

/// Rewrites an entry in place. Ownership never changes on edit.
///
/// This only touches the entry row; the caller re-runs tag sync and pruning
/// afterwards.
pub async fn update_entry(
    db: &DatabaseConnection,
    entry_id: i32,
    user_id: i32,
    input: EntryInput,
) -> Result<entry::Model, ServiceError> {
    let input = input.normalized()?;
    let existing = get_owned_entry(db, entry_id, user_id).await?;
    ensure_title_available(db, &input.title, Some(entry_id)).await?;

    let title = input.title.clone();
    let mut active_entry = existing.into_active_model();
    active_entry.title = Set(input.title);
    active_entry.time_spent = Set(input.time_spent);
    active_entry.date_created = Set(input.date_created);
    active_entry.content = Set(input.content);
    active_entry.resources = Set(input.resources);

    let model = active_entry
        .update(db)
        .await
        .map_err(|e| ServiceError::from_write(e, "Entry", &title))?;
    debug!(entry_id, "Updated entry.");
    Ok(model)
}

/// Deletes an entry and every association that references it, in one
/// transaction.
pub async fn delete_entry(
    db: &DatabaseConnection,
    entry_id: i32,
    user_id: i32,
) -> Result<(), ServiceError> {
    let removed_associations = db
        .transaction::<_, u64, ServiceError>(move |txn| {
            Box::pin(async move {
                let entry = Entry::find_by_id(entry_id)
                    .filter(entry::Column::UserId.eq(user_id))
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Entry", entry_id))?;

                let removed = entry_tag_service::delete_associations_for_entry(txn, entry.id).await?;
                entry.delete(txn).await?;
                Ok(removed)
            })
        })
        .await?;

    info!(entry_id, removed_associations, "Deleted entry.");
    Ok(())
}
