//! Database access for the journal, grouped by entity. Public functions are
//! re-exported so callers can use `crate::db::services::*`.

pub mod entry_service;
pub mod entry_tag_service;
pub mod tag_service;
pub mod tag_sync_service;
pub mod user_service;

pub use entry_service::*;
pub use entry_tag_service::*;
pub use tag_service::*;
pub use tag_sync_service::*;
pub use user_service::*;
