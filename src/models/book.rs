//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// A catalog title. Physical copies are tracked individually in `copies`
/// and loaded separately from the `copies` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    #[serde(default)]
    pub id: i32,
    pub title: String,
    pub author: String,
    pub details: String,
    pub course: String,
    pub branch: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    /// Declared copy count; equals `copies.len()` at creation time
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub copies: Vec<BookCopy>,
}

/// One physical, individually-issuable copy of a title.
/// `copy_code` is a short human-readable code (two uppercase letters
/// followed by four digits), unique across the whole catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookCopy {
    pub copy_code: String,
    pub book_id: i32,
    pub issued: bool,
}

/// Register book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "Details are required"))]
    pub details: String,
    #[validate(length(min = 1, message = "Course is required"))]
    pub course: String,
    #[validate(length(min = 1, message = "Branch is required"))]
    pub branch: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[validate(range(min = 1, message = "Stock must be a positive integer"))]
    pub stock: i32,
}

/// Book search parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Exact copy code lookup
    pub copy_code: Option<String>,
    /// Case-insensitive title substring
    pub title: Option<String>,
    /// Case-insensitive author substring
    pub author: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
