use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use tracing::info;

use crate::db::entities::prelude::{Entry, EntryTag, Tag, User};

pub mod entities;
pub mod error;
pub mod services;

/// Opens the connection pool. Each statement borrows a connection from the
/// pool and hands it back when it finishes, whatever the outcome.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(max_connections)
        .sqlx_logging(false);
    Database::connect(opt).await
}

/// Creates the journal tables if they are missing. Parents are created
/// before the join table so the foreign keys resolve.
pub async fn initialize(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let statements = vec![
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Entry),
        schema.create_table_from_entity(Tag),
        schema.create_table_from_entity(EntryTag),
    ];

    for mut statement in statements {
        statement.if_not_exists();
        db.execute(backend.build(&statement)).await?;
    }

    info!("Database schema is ready.");
    Ok(())
}
