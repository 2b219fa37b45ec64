use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use serde::Serialize;
use tracing::info;

use crate::db::entities::{
    entry_tag,
    prelude::{EntryTag, Tag},
    tag,
};
use crate::db::error::ServiceError;
use crate::db::services::entry_tag_service;

// --- Tag Service Functions ---

/// A tag together with the number of entries it is associated with.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagWithCount {
    pub id: i32,
    pub name: String,
    pub entry_count: i64,
}

/// Tag names are matched against whitespace-delimited tokens, so a name
/// containing whitespace could never match and is rejected.
pub fn normalize_tag_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("Tag name is required.".to_string()));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ServiceError::Validation(
            "Tag name cannot contain whitespace.".to_string(),
        ));
    }
    Ok(name.to_owned())
}

/// Creates a new tag.
pub async fn create_tag(db: &DatabaseConnection, name: &str) -> Result<tag::Model, ServiceError> {
    let name = normalize_tag_name(name)?;

    if Tag::find()
        .filter(tag::Column::Name.eq(name.as_str()))
        .one(db)
        .await?
        .is_some()
    {
        return Err(ServiceError::duplicate("Tag", name));
    }

    let new_tag = tag::ActiveModel {
        name: Set(name.clone()),
        ..Default::default()
    };
    let model = new_tag
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write(e, "Tag", &name))?;
    info!(tag_id = model.id, name = %model.name, "Created tag.");
    Ok(model)
}

pub async fn get_tag_by_id(db: &DatabaseConnection, tag_id: i32) -> Result<tag::Model, ServiceError> {
    Tag::find_by_id(tag_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Tag", tag_id))
}

pub async fn get_tag_by_name(db: &DatabaseConnection, name: &str) -> Result<tag::Model, ServiceError> {
    Tag::find()
        .filter(tag::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Tag", name))
}

/// Retrieves all tags ordered by name, each with its entry count.
pub async fn list_tags_with_count(db: &DatabaseConnection) -> Result<Vec<TagWithCount>, ServiceError> {
    let tags = Tag::find().order_by_asc(tag::Column::Name).all(db).await?;

    let counts: HashMap<i32, i64> = EntryTag::find()
        .select_only()
        .column(entry_tag::Column::TagId)
        .column_as(Expr::col(entry_tag::Column::EntryId).count(), "entry_count")
        .group_by(entry_tag::Column::TagId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(tags
        .into_iter()
        .map(|t| TagWithCount {
            entry_count: counts.get(&t.id).copied().unwrap_or(0),
            id: t.id,
            name: t.name,
        })
        .collect())
}

/// Deletes a tag and every association that references it, in one
/// transaction.
pub async fn delete_tag(db: &DatabaseConnection, tag_id: i32) -> Result<(), ServiceError> {
    let removed_associations = db
        .transaction::<_, u64, ServiceError>(move |txn| {
            Box::pin(async move {
                let tag = Tag::find_by_id(tag_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Tag", tag_id))?;

                let removed = entry_tag_service::delete_associations_for_tag(txn, tag.id).await?;
                tag.delete(txn).await?;
                Ok(removed)
            })
        })
        .await?;

    info!(tag_id, removed_associations, "Deleted tag.");
    Ok(())
}
