//! Loans repository: the issue/return transaction core
//!
//! Availability lives in two places: the `copies.issued` flag (kept for
//! cheap catalog queries) and the open loan row. Both are only ever written
//! inside the same transaction, and the flag is flipped with a conditional
//! update whose match count is checked, so two racing issue calls for the
//! same copy cannot both succeed.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        borrower::BorrowerKind,
        loan::{FailedCopy, IssueOutcome, LoanWithTitle, ReturnOutcome},
    },
};

/// Decide the fate of each requested copy code against a snapshot of the
/// catalog: codes absent from `found` fail as not found, codes absent from
/// `available` fail as already issued, and a code requested twice succeeds
/// only for its first occurrence.
pub fn plan_issue(
    requested: &[String],
    found: &HashSet<String>,
    available: &HashSet<String>,
) -> IssueOutcome {
    let mut outcome = IssueOutcome::default();
    let mut taken: HashSet<&str> = HashSet::new();

    for code in requested {
        if !found.contains(code) {
            outcome.failed.push(FailedCopy::not_found(code));
        } else if available.contains(code) && taken.insert(code) {
            outcome.issued.push(code.clone());
        } else {
            outcome.failed.push(FailedCopy::already_issued(code));
        }
    }

    outcome
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Issue copies to a borrower. Partial success commits; zero successes
    /// roll back so a fully failed call leaves no trace.
    pub async fn issue(
        &self,
        kind: BorrowerKind,
        borrower_id: i32,
        copy_codes: &[String],
    ) -> AppResult<IssueOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Lock the requested rows so the availability snapshot stays
        // authoritative for the rest of the transaction.
        let rows: Vec<(String, bool)> = sqlx::query_as(
            "SELECT copy_code, issued FROM copies WHERE copy_code = ANY($1) FOR UPDATE",
        )
        .bind(copy_codes)
        .fetch_all(&mut *tx)
        .await?;

        let found: HashSet<String> = rows.iter().map(|(c, _)| c.clone()).collect();
        let available: HashSet<String> = rows
            .iter()
            .filter(|(_, issued)| !issued)
            .map(|(c, _)| c.clone())
            .collect();

        let plan = plan_issue(copy_codes, &found, &available);
        let mut outcome = IssueOutcome {
            issued: Vec::with_capacity(plan.issued.len()),
            failed: plan.failed,
        };

        for code in plan.issued {
            // Flip to issued only if still available; a zero match count
            // demotes the code instead of double-issuing the copy.
            let flipped =
                sqlx::query("UPDATE copies SET issued = TRUE WHERE copy_code = $1 AND NOT issued")
                    .bind(&code)
                    .execute(&mut *tx)
                    .await?;
            if flipped.rows_affected() == 0 {
                outcome.failed.push(FailedCopy::already_issued(&code));
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO loans (copy_code, borrower_kind, borrower_id, issue_date, returned)
                VALUES ($1, $2, $3, $4, FALSE)
                "#,
            )
            .bind(&code)
            .bind(kind)
            .bind(borrower_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            outcome.issued.push(code);
        }

        if outcome.issued.is_empty() {
            tx.rollback().await?;
        } else {
            tx.commit().await?;
        }

        Ok(outcome)
    }

    /// Return copies for a borrower. Closing the loan and releasing the
    /// copy happen in one transaction; codes with no open loan for this
    /// borrower are reported, not fatal.
    pub async fn return_books(
        &self,
        kind: BorrowerKind,
        borrower_id: i32,
        copy_codes: &[String],
    ) -> AppResult<ReturnOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut outcome = ReturnOutcome::default();

        for code in copy_codes {
            let closed = sqlx::query(
                r#"
                UPDATE loans SET returned = TRUE, return_date = $1
                WHERE copy_code = $2 AND borrower_kind = $3 AND borrower_id = $4 AND NOT returned
                "#,
            )
            .bind(now)
            .bind(code)
            .bind(kind)
            .bind(borrower_id)
            .execute(&mut *tx)
            .await?;

            if closed.rows_affected() == 0 {
                // Never issued to this borrower, or already returned
                outcome.not_found.push(code.clone());
                continue;
            }

            sqlx::query("UPDATE copies SET issued = FALSE WHERE copy_code = $1")
                .bind(code)
                .execute(&mut *tx)
                .await?;

            outcome.returned.push(code.clone());
        }

        if outcome.returned.is_empty() {
            tx.rollback().await?;
        } else {
            tx.commit().await?;
        }

        Ok(outcome)
    }

    /// Open loans for a borrower, oldest first, joined with their title
    pub async fn open_loans(
        &self,
        kind: BorrowerKind,
        borrower_id: i32,
    ) -> AppResult<Vec<LoanWithTitle>> {
        let loans = sqlx::query_as::<_, LoanWithTitle>(
            r#"
            SELECT l.copy_code, b.title, b.author, l.issue_date, l.return_date, l.returned
            FROM loans l
            JOIN copies c ON l.copy_code = c.copy_code
            JOIN books b ON c.book_id = b.id
            WHERE l.borrower_kind = $1 AND l.borrower_id = $2 AND NOT l.returned
            ORDER BY l.issue_date
            "#,
        )
        .bind(kind)
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Full loan history for a borrower, oldest first
    pub async fn history(
        &self,
        kind: BorrowerKind,
        borrower_id: i32,
    ) -> AppResult<Vec<LoanWithTitle>> {
        let loans = sqlx::query_as::<_, LoanWithTitle>(
            r#"
            SELECT l.copy_code, b.title, b.author, l.issue_date, l.return_date, l.returned
            FROM loans l
            JOIN copies c ON l.copy_code = c.copy_code
            JOIN books b ON c.book_id = b.id
            WHERE l.borrower_kind = $1 AND l.borrower_id = $2
            ORDER BY l.issue_date
            "#,
        )
        .bind(kind)
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn set(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plan_covers_every_requested_code_exactly_once() {
        let requested = codes(&["AB1234", "CD5678", "EF9999"]);
        let found = set(&["AB1234", "CD5678"]);
        let available = set(&["AB1234"]);

        let outcome = plan_issue(&requested, &found, &available);

        assert_eq!(outcome.issued, codes(&["AB1234"]));
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(
            outcome.issued.len() + outcome.failed.len(),
            requested.len()
        );
        // issued and failed are disjoint
        for f in &outcome.failed {
            assert!(!outcome.issued.contains(&f.book_id));
        }
    }

    #[test]
    fn plan_reports_unknown_codes_as_not_found() {
        let requested = codes(&["ZZ0000"]);
        let outcome = plan_issue(&requested, &HashSet::new(), &HashSet::new());

        assert!(outcome.issued.is_empty());
        assert_eq!(outcome.failed[0].book_id, "ZZ0000");
        assert_eq!(outcome.failed[0].reason, "Book not found");
    }

    #[test]
    fn plan_reports_unavailable_codes_as_already_issued() {
        let requested = codes(&["AB1234"]);
        let found = set(&["AB1234"]);
        let outcome = plan_issue(&requested, &found, &HashSet::new());

        assert!(outcome.issued.is_empty());
        assert_eq!(outcome.failed[0].reason, "Book already issued");
    }

    #[test]
    fn duplicate_request_succeeds_once_and_fails_once() {
        let requested = codes(&["AB1234", "AB1234"]);
        let found = set(&["AB1234"]);
        let available = set(&["AB1234"]);

        let outcome = plan_issue(&requested, &found, &available);

        assert_eq!(outcome.issued, codes(&["AB1234"]));
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].book_id, "AB1234");
        assert_eq!(outcome.failed[0].reason, "Book already issued");
    }

    #[test]
    fn all_unavailable_plans_zero_issues() {
        let requested = codes(&["AB1234", "CD5678"]);
        let found = set(&["AB1234", "CD5678"]);
        let outcome = plan_issue(&requested, &found, &HashSet::new());

        assert!(outcome.issued.is_empty());
        assert_eq!(outcome.failed.len(), 2);
        assert!(outcome
            .failed
            .iter()
            .all(|f| f.reason == "Book already issued"));
    }
}
