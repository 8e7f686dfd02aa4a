//! Catalog endpoints: register, search and bulk upload

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookQuery, CreateBook},
        import::{BookImportRow, ImportReport},
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Register a new book title with its physical copies
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book registered with generated copy codes", body = Book),
        (status = 400, description = "Invalid book data"),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_librarian()?;

    let created = state.services.catalog.register_book(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Search books by copy code, title or author
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("copy_code" = Option<String>, Query, description = "Exact copy code"),
        ("title" = Option<String>, Query, description = "Search in title"),
        ("author" = Option<String>, Query, description = "Search by author"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<i64>, Query, description = "Items per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Matching books with their copies", body = PaginatedResponse<Book>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    claims.require_librarian()?;

    let (items, total) = state.services.catalog.search_books(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(10),
    }))
}

/// Bulk-register books from parsed spreadsheet rows
#[utoipa::path(
    post,
    path = "/books/upload",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = Vec<BookImportRow>,
    responses(
        (status = 200, description = "Upload report with per-row rejections", body = ImportReport<BookImportRow>),
        (status = 400, description = "Empty upload"),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn upload_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(rows): Json<Vec<BookImportRow>>,
) -> AppResult<Json<ImportReport<BookImportRow>>> {
    claims.require_librarian()?;

    let report = state.services.catalog.upload_books(rows).await?;
    Ok(Json(report))
}
