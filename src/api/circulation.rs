//! Circulation endpoints: issue, return and borrower views

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        borrower::BorrowerKind,
        loan::{HistoryEntry, IssueOutcome, IssuedBookView, ReturnOutcome},
    },
};

use super::AuthenticatedUser;

/// Issue or return request. The kind picks the account table, the
/// identifier is a file number or employee ID accordingly.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CirculationRequest {
    pub kind: BorrowerKind,
    pub identifier: String,
    /// Copy codes, one per physical copy
    pub copy_codes: Vec<String>,
}

/// Issue copies to a borrower. Succeeds if at least one copy could be
/// issued; rejected copies are listed with reasons.
#[utoipa::path(
    post,
    path = "/circulation/issue",
    tag = "circulation",
    security(("bearer_auth" = [])),
    request_body = CirculationRequest,
    responses(
        (status = 200, description = "At least one copy issued", body = IssueOutcome),
        (status = 400, description = "No copy could be issued"),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn issue_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CirculationRequest>,
) -> AppResult<Json<IssueOutcome>> {
    claims.require_librarian()?;

    let outcome = state
        .services
        .circulation
        .issue_books(request.kind, &request.identifier, &request.copy_codes)
        .await?;
    Ok(Json(outcome))
}

/// Return copies held by a borrower
#[utoipa::path(
    post,
    path = "/circulation/return",
    tag = "circulation",
    security(("bearer_auth" = [])),
    request_body = CirculationRequest,
    responses(
        (status = 200, description = "At least one copy returned", body = ReturnOutcome),
        (status = 400, description = "No copy could be returned"),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn return_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CirculationRequest>,
) -> AppResult<Json<ReturnOutcome>> {
    claims.require_librarian()?;

    let outcome = state
        .services
        .circulation
        .return_books(request.kind, &request.identifier, &request.copy_codes)
        .await?;
    Ok(Json(outcome))
}

/// The authenticated borrower's open loans with accrued fines
#[utoipa::path(
    get,
    path = "/me/issued-books",
    tag = "circulation",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Open loans with fines", body = Vec<IssuedBookView>),
        (status = 403, description = "Borrower account required")
    )
)]
pub async fn my_issued_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<IssuedBookView>>> {
    let kind = claims.require_borrower()?;

    let books = state
        .services
        .circulation
        .issued_books(kind, claims.user_id)
        .await?;
    Ok(Json(books))
}

/// The authenticated borrower's full loan history
#[utoipa::path(
    get,
    path = "/me/history",
    tag = "circulation",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loan history, oldest first", body = Vec<HistoryEntry>),
        (status = 403, description = "Borrower account required")
    )
)]
pub async fn my_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    let kind = claims.require_borrower()?;

    let history = state
        .services
        .circulation
        .history(kind, claims.user_id)
        .await?;
    Ok(Json(history))
}
