//! Bulk import row types and reports
//!
//! The upload endpoints accept rows already parsed from a spreadsheet on the
//! client side. Rows are validated one by one; invalid rows are reported
//! with the offending row echoed back and a single reason.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One student row of a bulk upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentImportRow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub file_no: String,
    #[serde(default)]
    pub parent_name: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub branch: String,
}

/// One book row of a bulk upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookImportRow {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    #[schema(value_type = String)]
    pub price: Decimal,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub branch: String,
}

/// A rejected row with the reason it was rejected
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvalidRow<T> {
    pub row: T,
    pub reason: String,
}

impl<T> InvalidRow<T> {
    pub fn new(row: T, reason: impl Into<String>) -> Self {
        Self {
            row,
            reason: reason.into(),
        }
    }
}

/// Outcome of a bulk upload: how many rows were inserted and which were not
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportReport<T: for<'a> ToSchema<'a>> {
    pub inserted: usize,
    pub invalid: Vec<InvalidRow<T>>,
}
