pub mod entry_routes;
pub mod tag_routes;
