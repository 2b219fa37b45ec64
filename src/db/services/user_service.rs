use bcrypt::hash;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::info;

use crate::db::entities::{prelude::User, user};
use crate::db::error::ServiceError;

// --- User Service Functions ---

/// Creates a new user. The password is hashed before it reaches the
/// database, and the row is written inside a transaction so a half-written
/// user is never visible.
pub async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    hash_cost: u32,
) -> Result<user::Model, ServiceError> {
    let email = email.trim().to_owned();
    let password_hash = hash(password, hash_cost)?;

    let user = db
        .transaction::<_, user::Model, ServiceError>(move |txn| {
            Box::pin(async move {
                if User::find()
                    .filter(user::Column::Email.eq(email.as_str()))
                    .one(txn)
                    .await?
                    .is_some()
                {
                    return Err(ServiceError::duplicate("User", email));
                }

                let new_user = user::ActiveModel {
                    email: Set(email.clone()),
                    password_hash: Set(password_hash),
                    ..Default::default()
                };
                new_user
                    .insert(txn)
                    .await
                    .map_err(|e| ServiceError::from_write(e, "User", &email))
            })
        })
        .await?;

    info!(user_id = user.id, "Created user.");
    Ok(user)
}

/// Retrieves a user by their ID.
pub async fn get_user_by_id(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<user::Model, ServiceError> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("User", user_id))
}

/// Retrieves a user by their email address.
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<user::Model, ServiceError> {
    User::find()
        .filter(user::Column::Email.eq(email.trim()))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("User", email))
}
