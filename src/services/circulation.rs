//! Circulation service: issue, return, fines, borrower views

use chrono::{DateTime, Duration, Utc};

use crate::{
    config::FinesConfig,
    error::{AppError, AppResult, ErrorCode},
    models::{
        borrower::{Borrower, BorrowerKind},
        loan::{HistoryEntry, IssueOutcome, IssuedBookView, ReturnOutcome},
    },
    repository::Repository,
};

const SECS_PER_DAY: i64 = 86_400;

/// Fine accrued on a loan issued at `issue_date`, as of `now`.
/// Zero until the grace period ends, then `rate_per_day` per started day.
pub fn fine_amount(
    issue_date: DateTime<Utc>,
    now: DateTime<Utc>,
    grace_days: i64,
    rate_per_day: i64,
) -> i64 {
    let due = issue_date + Duration::days(grace_days);
    let overdue_secs = (now - due).num_seconds();
    if overdue_secs <= 0 {
        return 0;
    }
    let overdue_days = (overdue_secs + SECS_PER_DAY - 1) / SECS_PER_DAY;
    overdue_days * rate_per_day
}

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    fines: FinesConfig,
}

impl CirculationService {
    pub fn new(repository: Repository, fines: FinesConfig) -> Self {
        Self { repository, fines }
    }

    /// Issue copies to a borrower. Partial success is a success; a call
    /// where every copy fails is rejected without persisting anything.
    pub async fn issue_books(
        &self,
        kind: BorrowerKind,
        identifier: &str,
        copy_codes: &[String],
    ) -> AppResult<IssueOutcome> {
        let borrower = self.resolve_borrower(kind, identifier, copy_codes).await?;

        let outcome = self
            .repository
            .loans
            .issue(kind, borrower.id(), copy_codes)
            .await?;

        if outcome.issued.is_empty() {
            return Err(AppError::no_operation(
                ErrorCode::NoBooksIssued,
                "No books could be issued. All requested books are either unavailable or already issued.",
                &outcome.failed,
            ));
        }

        tracing::info!(
            kind = %kind,
            identifier,
            issued = outcome.issued.len(),
            failed = outcome.failed.len(),
            "books issued"
        );

        Ok(outcome)
    }

    /// Return copies for a borrower. Copies with no open loan are reported
    /// in `not_found`; a call returning nothing is rejected.
    pub async fn return_books(
        &self,
        kind: BorrowerKind,
        identifier: &str,
        copy_codes: &[String],
    ) -> AppResult<ReturnOutcome> {
        let borrower = self.resolve_borrower(kind, identifier, copy_codes).await?;

        let outcome = self
            .repository
            .loans
            .return_books(kind, borrower.id(), copy_codes)
            .await?;

        if outcome.returned.is_empty() {
            return Err(AppError::no_operation(
                ErrorCode::NoBooksReturned,
                "No books found in issued list or already returned.",
                &outcome.not_found,
            ));
        }

        tracing::info!(
            kind = %kind,
            identifier,
            returned = outcome.returned.len(),
            not_found = outcome.not_found.len(),
            "books returned"
        );

        Ok(outcome)
    }

    /// Open loans for a borrower with the fine accrued so far
    pub async fn issued_books(
        &self,
        kind: BorrowerKind,
        borrower_id: i32,
    ) -> AppResult<Vec<IssuedBookView>> {
        let now = Utc::now();
        let grace = kind.grace_days(&self.fines);

        let loans = self.repository.loans.open_loans(kind, borrower_id).await?;

        Ok(loans
            .into_iter()
            .map(|loan| IssuedBookView {
                fine: fine_amount(loan.issue_date, now, grace, self.fines.rate_per_day),
                copy_code: loan.copy_code,
                title: loan.title,
                author: loan.author,
                issue_date: loan.issue_date,
            })
            .collect())
    }

    /// Full loan history for a borrower
    pub async fn history(
        &self,
        kind: BorrowerKind,
        borrower_id: i32,
    ) -> AppResult<Vec<HistoryEntry>> {
        let loans = self.repository.loans.history(kind, borrower_id).await?;
        Ok(loans.into_iter().map(HistoryEntry::from).collect())
    }

    async fn resolve_borrower(
        &self,
        kind: BorrowerKind,
        identifier: &str,
        copy_codes: &[String],
    ) -> AppResult<Borrower> {
        if identifier.trim().is_empty() {
            return Err(AppError::Validation(
                "User identifier (File No or Employee ID) is required".to_string(),
            ));
        }
        if copy_codes.is_empty() {
            return Err(AppError::Validation(
                "At least one book ID is required".to_string(),
            ));
        }

        self.repository
            .borrowers
            .resolve(kind, identifier)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No {} found with the provided identifier", kind))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(days_ago: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        (now - Duration::days(days_ago), now)
    }

    #[test]
    fn no_fine_within_grace_period() {
        let (issued, now) = at(30);
        assert_eq!(fine_amount(issued, now, 30, 5), 0);
    }

    #[test]
    fn one_day_overdue_charges_one_day() {
        let (issued, now) = at(31);
        assert_eq!(fine_amount(issued, now, 30, 5), 5);
    }

    #[test]
    fn fine_scales_linearly_with_overdue_days() {
        for extra in 1..=10 {
            let (issued, now) = at(30 + extra);
            assert_eq!(fine_amount(issued, now, 30, 5), extra * 5);
        }
    }

    #[test]
    fn partial_overdue_day_rounds_up() {
        let now = Utc::now();
        let issued = now - Duration::days(30) - Duration::hours(1);
        assert_eq!(fine_amount(issued, now, 30, 5), 5);
    }

    #[test]
    fn student_grace_comes_from_configuration() {
        let fines = FinesConfig {
            student_grace_days: 15,
            faculty_grace_days: 30,
            rate_per_day: 5,
        };
        let (issued, now) = at(16);
        let grace = BorrowerKind::Student.grace_days(&fines);
        assert_eq!(fine_amount(issued, now, grace, fines.rate_per_day), 5);

        let grace = BorrowerKind::Faculty.grace_days(&fines);
        assert_eq!(fine_amount(issued, now, grace, fines.rate_per_day), 0);
    }
}
