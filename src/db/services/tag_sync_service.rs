//! Keeps the entry/tag association in step with entry content.
//!
//! The relation is derived, never authored: a pair exists when the tag's name
//! shows up in the entry's content as of the last time one of these ran for
//! that entry or tag. Handlers call them at fixed points:
//!
//! * entry created: [`sync_tags_for_entry`]
//! * entry edited: [`sync_tags_for_entry`], then [`prune_stale_associations`]
//! * tag created: [`sync_entries_for_tag`]
//!
//! Deletes cascade in the entry and tag services instead.
//!
//! Matching is not symmetric. Entry-side sync and pruning compare whole
//! whitespace-delimited tokens, case-sensitively. Tag-side sync matches the
//! name as a plain substring of the content, so a new tag `map` also tags an
//! entry that only mentions `maps`.
//!
//! None of these run inside one transaction. Two requests racing on the same
//! entry settle on the same rows because inserts ignore existing pairs and
//! deletes ignore missing ones.

use std::collections::BTreeSet;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::debug;

use crate::db::entities::{
    entry, entry_tag,
    prelude::{Entry, EntryTag, Tag},
    tag,
};
use crate::db::services::entry_tag_service;

/// Splits content into its distinct whitespace-delimited tokens, case kept as written.
pub fn content_tokens(content: &str) -> BTreeSet<&str> {
    content.split_whitespace().collect()
}

/// Tags an entry with every known tag whose name is one of its content
/// tokens. Never removes anything. Returns the number of pairs written.
pub async fn sync_tags_for_entry<C>(db: &C, entry: &entry::Model) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let tokens = content_tokens(&entry.content);
    if tokens.is_empty() {
        return Ok(0);
    }

    // Matched in memory: one bind parameter per token overflows the backend's
    // limit on long entries.
    let matching_tags: Vec<i32> = Tag::find()
        .select_only()
        .column(tag::Column::Id)
        .column(tag::Column::Name)
        .order_by_asc(tag::Column::Id)
        .into_tuple::<(i32, String)>()
        .all(db)
        .await?
        .into_iter()
        .filter(|(_, name)| tokens.contains(name.as_str()))
        .map(|(tag_id, _)| tag_id)
        .collect();

    let mut created = 0;
    for &tag_id in &matching_tags {
        if entry_tag_service::create_association(db, entry.id, tag_id).await? {
            created += 1;
        }
    }

    debug!(
        entry_id = entry.id,
        matched = matching_tags.len(),
        created,
        "Synced tags for entry."
    );
    Ok(created)
}

/// Tags every existing entry whose content contains the tag name as a
/// substring. Returns the number of pairs written.
pub async fn sync_entries_for_tag<C>(db: &C, tag: &tag::Model) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    // Done in memory: SQL LIKE folds ASCII case on SQLite and treats `%`/`_`
    // as wildcards, neither of which is a plain substring test.
    let entries: Vec<(i32, String)> = Entry::find()
        .select_only()
        .column(entry::Column::Id)
        .column(entry::Column::Content)
        .order_by_asc(entry::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    let mut created = 0;
    for (entry_id, content) in &entries {
        if content.contains(tag.name.as_str())
            && entry_tag_service::create_association(db, *entry_id, tag.id).await?
        {
            created += 1;
        }
    }

    debug!(
        tag_id = tag.id,
        scanned = entries.len(),
        created,
        "Synced entries for tag."
    );
    Ok(created)
}

/// Removes the entry's association with every tag whose name is no longer
/// among its content tokens. Only the entry's current associations can be
/// affected, so only those are examined. Returns the number of pairs removed.
pub async fn prune_stale_associations<C>(db: &C, entry: &entry::Model) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let tokens = content_tokens(&entry.content);

    let associated: Vec<(entry_tag::Model, Option<tag::Model>)> = EntryTag::find()
        .filter(entry_tag::Column::EntryId.eq(entry.id))
        .find_also_related(Tag)
        .all(db)
        .await?;

    let stale_tag_ids: Vec<i32> = associated
        .into_iter()
        .filter_map(|(association, tag)| match tag {
            Some(tag) if tokens.contains(tag.name.as_str()) => None,
            _ => Some(association.tag_id),
        })
        .collect();

    let removed = entry_tag_service::remove_associations(db, entry.id, &stale_tag_ids).await?;

    debug!(entry_id = entry.id, removed, "Pruned stale associations.");
    Ok(removed)
}
