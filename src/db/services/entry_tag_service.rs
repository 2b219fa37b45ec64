//! Row-level access to the `entry_tags` join table.
//!
//! Writes here are idempotent: adding a pair that exists and removing a pair
//! that does not are both successful no-ops.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};

use crate::db::entities::{
    entry, entry_tag,
    prelude::{EntryTag, Tag},
    tag,
};
use crate::db::error::is_unique_violation;

/// Associates a tag with an entry. Returns `true` when a row was written and
/// `false` when the pair already existed.
pub async fn create_association<C>(db: &C, entry_id: i32, tag_id: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let association = entry_tag::ActiveModel {
        entry_id: Set(entry_id),
        tag_id: Set(tag_id),
    };

    let result = EntryTag::insert(association)
        .on_conflict(
            OnConflict::columns([entry_tag::Column::EntryId, entry_tag::Column::TagId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(rows_affected) => Ok(rows_affected > 0),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Removes a tag from an entry. Returns `false` if the pair was not there.
pub async fn remove_association<C>(db: &C, entry_id: i32, tag_id: i32) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let result = EntryTag::delete_many()
        .filter(entry_tag::Column::EntryId.eq(entry_id))
        .filter(entry_tag::Column::TagId.eq(tag_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Removes a set of tags from one entry in a single statement.
pub async fn remove_associations<C>(db: &C, entry_id: i32, tag_ids: &[i32]) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    if tag_ids.is_empty() {
        return Ok(0);
    }
    let result = EntryTag::delete_many()
        .filter(entry_tag::Column::EntryId.eq(entry_id))
        .filter(entry_tag::Column::TagId.is_in(tag_ids.iter().copied()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete_associations_for_entry<C>(db: &C, entry_id: i32) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let result = EntryTag::delete_many()
        .filter(entry_tag::Column::EntryId.eq(entry_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete_associations_for_tag<C>(db: &C, tag_id: i32) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let result = EntryTag::delete_many()
        .filter(entry_tag::Column::TagId.eq(tag_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn associations_for_entry<C>(db: &C, entry_id: i32) -> Result<Vec<entry_tag::Model>, DbErr>
where
    C: ConnectionTrait,
{
    EntryTag::find()
        .filter(entry_tag::Column::EntryId.eq(entry_id))
        .order_by_asc(entry_tag::Column::TagId)
        .all(db)
        .await
}

pub async fn associations_for_tag<C>(db: &C, tag_id: i32) -> Result<Vec<entry_tag::Model>, DbErr>
where
    C: ConnectionTrait,
{
    EntryTag::find()
        .filter(entry_tag::Column::TagId.eq(tag_id))
        .order_by_asc(entry_tag::Column::EntryId)
        .all(db)
        .await
}

/// Retrieves the tags currently associated with an entry, ordered by name.
pub async fn tags_for_entry<C>(db: &C, entry: &entry::Model) -> Result<Vec<tag::Model>, DbErr>
where
    C: ConnectionTrait,
{
    entry
        .find_related(Tag)
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await
}
