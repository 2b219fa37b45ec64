#![allow(dead_code)]

use chrono::NaiveDate;
use learning_journal::db;
use learning_journal::db::entities::{entry, tag, user};
use learning_journal::db::services::{entry_service, tag_service, user_service, EntryInput};
use learning_journal::server::config::{MIN_BCRYPT_COST, ServerConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub const TEST_PASSWORD: &str = "password";

/// In-memory SQLite with a single pooled connection, so every statement sees
/// the same database.
pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect sqlite");
    db::initialize(&db).await.expect("initialize schema");
    db
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        max_connections: 1,
        listen_addr: "127.0.0.1:0".to_string(),
        jwt_secret: "test-secret".to_string(),
        token_ttl_hours: 1,
        bcrypt_cost: MIN_BCRYPT_COST,
        log_dir: "logs".to_string(),
        cookie_secure: false,
        seed_user_email: None,
        seed_user_password: None,
    }
}

pub async fn create_user(db: &DatabaseConnection, email: &str) -> user::Model {
    user_service::create_user(db, email, TEST_PASSWORD, MIN_BCRYPT_COST)
        .await
        .expect("create user")
}

pub fn entry_input(title: &str, content: &str) -> EntryInput {
    EntryInput {
        title: title.to_string(),
        time_spent: 1,
        date_created: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
        content: content.to_string(),
        resources: None,
    }
}

pub async fn create_entry(
    db: &DatabaseConnection,
    owner: &user::Model,
    title: &str,
    content: &str,
) -> entry::Model {
    entry_service::create_entry(db, owner.id, entry_input(title, content))
        .await
        .expect("create entry")
}

pub async fn create_tag(db: &DatabaseConnection, name: &str) -> tag::Model {
    tag_service::create_tag(db, name).await.expect("create tag")
}

pub async fn tag_names(db: &DatabaseConnection, entry: &entry::Model) -> Vec<String> {
    learning_journal::db::services::tags_for_entry(db, entry)
        .await
        .expect("tags for entry")
        .into_iter()
        .map(|t| t.name)
        .collect()
}
