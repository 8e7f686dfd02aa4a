//! Loan (issue record) model and circulation outcome types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::borrower::BorrowerKind;

/// One loan of one copy to one borrower. The partial unique index on
/// `loans (copy_code) WHERE NOT returned` guarantees at most one open loan
/// per copy, so the catalog's `issued` flag can never disagree with an
/// open loan under a committed transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub copy_code: String,
    pub borrower_kind: BorrowerKind,
    pub borrower_id: i32,
    pub issue_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned: bool,
}

/// One copy that could not be issued, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FailedCopy {
    pub book_id: String,
    pub reason: String,
}

impl FailedCopy {
    pub fn not_found(book_id: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            reason: "Book not found".to_string(),
        }
    }

    pub fn already_issued(book_id: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            reason: "Book already issued".to_string(),
        }
    }
}

/// Result of an issue call. `issued` and `failed` are disjoint and together
/// cover the requested codes exactly once per occurrence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct IssueOutcome {
    pub issued: Vec<String>,
    pub failed: Vec<FailedCopy>,
}

/// Result of a return call. Codes with no open loan for the borrower land
/// in `not_found` without aborting the rest of the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReturnOutcome {
    pub returned: Vec<String>,
    pub not_found: Vec<String>,
}

/// An open loan as shown to the borrower, with the fine accrued so far
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssuedBookView {
    pub copy_code: String,
    pub title: String,
    pub author: String,
    pub issue_date: DateTime<Utc>,
    /// Derived at call time, never stored
    pub fine: i64,
}

/// Row backing [`IssuedBookView`] and [`HistoryEntry`] (loan joined with its title)
#[derive(Debug, Clone, FromRow)]
pub struct LoanWithTitle {
    pub copy_code: String,
    pub title: String,
    pub author: String,
    pub issue_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned: bool,
}

/// One entry of a borrower's full loan history
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub copy_code: String,
    pub title: String,
    pub issue_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
}

impl From<LoanWithTitle> for HistoryEntry {
    fn from(row: LoanWithTitle) -> Self {
        HistoryEntry {
            copy_code: row.copy_code,
            title: row.title,
            issue_date: row.issue_date,
            return_date: row.return_date,
            status: if row.returned { "Returned" } else { "Issued" }.to_string(),
        }
    }
}
