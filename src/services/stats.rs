//! Dashboard statistics

use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, repository::Repository};

/// Headline counts for the librarian dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_students: i64,
    /// Physical copies in the catalog, not distinct titles
    pub total_books: i64,
    pub issued_books: i64,
    pub available_books: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let total_students = self.repository.borrowers.count_students().await?;
        let copies = self.repository.books.copy_counts().await?;

        Ok(DashboardStats {
            total_students,
            total_books: copies.total,
            issued_books: copies.issued,
            available_books: copies.total - copies.issued,
        })
    }
}
