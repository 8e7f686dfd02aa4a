//! Account management endpoints: students, faculty and librarians

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{
        borrower::{CreateFaculty, CreateStudent, Faculty, Student, StudentQuery},
        import::{ImportReport, StudentImportRow},
        staff::{CreateLibrarian, Staff},
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Plain pagination parameters for the admin listings
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    fn resolve(&self) -> (i64, i64) {
        (
            self.page.unwrap_or(1).max(1),
            self.per_page.unwrap_or(10).clamp(1, 100),
        )
    }
}

/// Register a student account
#[utoipa::path(
    post,
    path = "/students",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student registered", body = Student),
        (status = 400, description = "Invalid data or duplicate file number"),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn register_student(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(student): Json<CreateStudent>,
) -> AppResult<(StatusCode, Json<Student>)> {
    claims.require_librarian()?;

    let created = state.services.registration.register_student(student).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Search students by file number or name
#[utoipa::path(
    get,
    path = "/students",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("file_no" = Option<String>, Query, description = "Exact file number"),
        ("name" = Option<String>, Query, description = "Search by name"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<i64>, Query, description = "Items per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Matching students", body = PaginatedResponse<Student>),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn search_students(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<StudentQuery>,
) -> AppResult<Json<PaginatedResponse<Student>>> {
    claims.require_librarian()?;

    let (items, total) = state.services.registration.search_students(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(10),
    }))
}

/// Bulk-register students from parsed spreadsheet rows
#[utoipa::path(
    post,
    path = "/students/upload",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = Vec<StudentImportRow>,
    responses(
        (status = 200, description = "Upload report with per-row rejections", body = ImportReport<StudentImportRow>),
        (status = 400, description = "Empty upload"),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn upload_students(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(rows): Json<Vec<StudentImportRow>>,
) -> AppResult<Json<ImportReport<StudentImportRow>>> {
    claims.require_librarian()?;

    let report = state.services.registration.upload_students(rows).await?;
    Ok(Json(report))
}

/// Register a faculty account (admin only)
#[utoipa::path(
    post,
    path = "/faculty",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateFaculty,
    responses(
        (status = 201, description = "Faculty registered", body = Faculty),
        (status = 400, description = "Invalid data or duplicate employee ID"),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn register_faculty(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(faculty): Json<CreateFaculty>,
) -> AppResult<(StatusCode, Json<Faculty>)> {
    claims.require_admin()?;

    let created = state.services.registration.register_faculty(faculty).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List faculty accounts (admin only)
#[utoipa::path(
    get,
    path = "/faculty",
    tag = "users",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Faculty accounts", body = PaginatedResponse<Faculty>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_faculty(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Faculty>>> {
    claims.require_admin()?;

    let (page, per_page) = query.resolve();
    let (items, total) = state.services.registration.list_faculty(page, per_page).await?;

    Ok(Json(PaginatedResponse { items, total, page, per_page }))
}

/// List student accounts (admin only)
#[utoipa::path(
    get,
    path = "/students/all",
    tag = "users",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Student accounts", body = PaginatedResponse<Student>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_students(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Student>>> {
    claims.require_admin()?;

    let (page, per_page) = query.resolve();
    let (items, total) = state.services.registration.list_students(page, per_page).await?;

    Ok(Json(PaginatedResponse { items, total, page, per_page }))
}

/// Register a librarian account (admin only)
#[utoipa::path(
    post,
    path = "/librarians",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateLibrarian,
    responses(
        (status = 201, description = "Librarian registered", body = Staff),
        (status = 400, description = "Invalid data or duplicate email"),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn register_librarian(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(librarian): Json<CreateLibrarian>,
) -> AppResult<(StatusCode, Json<Staff>)> {
    claims.require_admin()?;

    let created = state.services.registration.register_librarian(librarian).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List librarian accounts (admin only)
#[utoipa::path(
    get,
    path = "/librarians",
    tag = "users",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Librarian accounts", body = PaginatedResponse<Staff>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_librarians(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Staff>>> {
    claims.require_admin()?;

    let (page, per_page) = query.resolve();
    let (items, total) = state.services.registration.list_librarians(page, per_page).await?;

    Ok(Json(PaginatedResponse { items, total, page, per_page }))
}
