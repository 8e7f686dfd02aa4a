//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, circulation, health, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Granthalaya API",
        version = "0.9.0",
        description = "College Library Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        auth::forgot_password,
        auth::reset_password,
        // Books
        books::create_book,
        books::search_books,
        books::upload_books,
        // Users
        users::register_student,
        users::search_students,
        users::upload_students,
        users::list_students,
        users::register_faculty,
        users::list_faculty,
        users::register_librarian,
        users::list_librarians,
        // Circulation
        circulation::issue_books,
        circulation::return_books,
        circulation::my_issued_books,
        circulation::my_history,
        // Stats
        stats::dashboard,
    ),
    components(
        schemas(
            // Auth
            crate::models::auth::Role,
            crate::models::auth::LoginRequest,
            crate::models::auth::LoginResponse,
            crate::models::auth::ForgotPasswordRequest,
            crate::models::auth::ResetPasswordRequest,
            crate::models::auth::Profile,
            auth::MessageResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookCopy,
            crate::models::book::CreateBook,
            crate::models::book::BookQuery,
            crate::models::import::BookImportRow,
            // Users
            crate::models::borrower::BorrowerKind,
            crate::models::borrower::Student,
            crate::models::borrower::Faculty,
            crate::models::borrower::CreateStudent,
            crate::models::borrower::CreateFaculty,
            crate::models::borrower::StudentQuery,
            crate::models::import::StudentImportRow,
            crate::models::staff::Staff,
            crate::models::staff::StaffRole,
            crate::models::staff::CreateLibrarian,
            // Circulation
            circulation::CirculationRequest,
            crate::models::loan::Loan,
            crate::models::loan::FailedCopy,
            crate::models::loan::IssueOutcome,
            crate::models::loan::ReturnOutcome,
            crate::models::loan::IssuedBookView,
            crate::models::loan::HistoryEntry,
            // Stats
            crate::services::stats::DashboardStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "users", description = "Account management"),
        (name = "circulation", description = "Issue and return"),
        (name = "stats", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
