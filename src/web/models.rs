use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::entities::{entry, tag};
use crate::db::services::EntryInput;
use crate::web::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i32,
    pub email: String,
}

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // email
    pub user_id: i32,
    pub exp: usize,
}

/// Struct to hold authenticated user details, to be passed as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryRequest {
    pub title: String,
    pub time_spent: Option<i32>,
    /// `dd/mm/yyyy` or `yyyy-mm-dd`; today when absent.
    pub date_created: Option<String>,
    pub content: String,
    pub resources: Option<String>,
}

const ENTRY_DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

pub fn parse_entry_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    ENTRY_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Invalid date '{raw}', expected dd/mm/yyyy or yyyy-mm-dd."
            ))
        })
}

impl EntryRequest {
    pub fn into_input(self) -> Result<EntryInput, AppError> {
        let date_created = match self.date_created.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_entry_date(raw)?,
            _ => Utc::now().date_naive(),
        };
        Ok(EntryInput {
            title: self.title,
            time_spent: self.time_spent.unwrap_or(0),
            date_created,
            content: self.content,
            resources: self.resources,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub time_spent: i32,
    pub date_created: NaiveDate,
    pub content: String,
    pub resources: Option<String>,
    pub tags: Vec<String>,
}

impl EntryResponse {
    pub fn new(entry: entry::Model, tags: Vec<tag::Model>) -> Self {
        EntryResponse {
            id: entry.id,
            user_id: entry.user_id,
            title: entry.title,
            time_spent: entry.time_spent,
            date_created: entry.date_created,
            content: entry.content,
            resources: entry.resources,
            tags: tags.into_iter().map(|t| t.name).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    /// Entries tagged when the tag was created.
    pub tagged_entries: u64,
}
