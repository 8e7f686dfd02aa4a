//! Books repository for database operations

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookCopy, BookQuery, CreateBook},
};

/// Copy counts used by the dashboard
#[derive(Debug, Clone, Copy)]
pub struct CopyCounts {
    pub total: i64,
    pub issued: i64,
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a book by ID with its copies
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let mut book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        book.copies = self.copies_for(&[id]).await?;
        Ok(book)
    }

    /// Insert one book together with its copies, atomically
    pub async fn create_with_copies(&self, book: &CreateBook, codes: &[String]) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;
        let id = Self::insert_one(&mut tx, book, codes).await?;
        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Insert a validated batch of books, atomically. Returns the ids.
    pub async fn insert_many(&self, batch: &[(CreateBook, Vec<String>)]) -> AppResult<Vec<i32>> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(batch.len());
        for (book, codes) in batch {
            ids.push(Self::insert_one(&mut tx, book, codes).await?);
        }
        tx.commit().await?;
        Ok(ids)
    }

    async fn insert_one(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        book: &CreateBook,
        codes: &[String],
    ) -> AppResult<i32> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (title, author, details, course, branch, price, stock, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.details)
        .bind(&book.course)
        .bind(&book.branch)
        .bind(book.price)
        .bind(book.stock)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        for code in codes {
            // The primary key is the real uniqueness guarantee for copy
            // codes; the generator's pre-check only keeps retries rare.
            sqlx::query("INSERT INTO copies (copy_code, book_id, issued) VALUES ($1, $2, FALSE)")
                .bind(code)
                .bind(id)
                .execute(&mut **tx)
                .await
                .map_err(|e| match e {
                    sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                        AppError::Conflict(format!("Copy code {} already exists", code))
                    }
                    other => AppError::Database(other),
                })?;
        }

        Ok(id)
    }

    /// Point query used by the copy-code generator
    pub async fn copy_code_exists(&self, code: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM copies WHERE copy_code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// All distinct titles, for bulk-import duplicate detection
    pub async fn distinct_titles(&self) -> AppResult<HashSet<String>> {
        let titles: Vec<String> = sqlx::query_scalar("SELECT DISTINCT title FROM books")
            .fetch_all(&self.pool)
            .await?;
        Ok(titles.into_iter().collect())
    }

    /// Search books with pagination; copies are loaded for the page
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref code) = query.copy_code {
            params.push(code.clone());
            conditions.push(format!(
                "EXISTS(SELECT 1 FROM copies c WHERE c.book_id = b.id AND c.copy_code = ${})",
                params.len()
            ));
        }
        if let Some(ref title) = query.title {
            params.push(format!("%{}%", title));
            conditions.push(format!("b.title ILIKE ${}", params.len()));
        }
        if let Some(ref author) = query.author {
            params.push(format!("%{}%", author));
            conditions.push(format!("b.author ILIKE ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM books b {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT b.* FROM books b {} ORDER BY b.title LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let mut select_builder = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let mut books = select_builder.fetch_all(&self.pool).await?;

        self.attach_copies(&mut books).await?;

        Ok((books, total))
    }

    /// Load the copies of each book on a result page
    async fn attach_copies(&self, books: &mut [Book]) -> AppResult<()> {
        if books.is_empty() {
            return Ok(());
        }
        let ids: Vec<i32> = books.iter().map(|b| b.id).collect();
        let copies = self.copies_for(&ids).await?;
        for book in books.iter_mut() {
            book.copies = copies.iter().filter(|c| c.book_id == book.id).cloned().collect();
        }
        Ok(())
    }

    async fn copies_for(&self, book_ids: &[i32]) -> AppResult<Vec<BookCopy>> {
        let copies = sqlx::query_as::<_, BookCopy>(
            "SELECT copy_code, book_id, issued FROM copies WHERE book_id = ANY($1) ORDER BY copy_code",
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Copy totals for the dashboard, in one aggregate query
    pub async fn copy_counts(&self) -> AppResult<CopyCounts> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE issued) AS issued FROM copies",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CopyCounts {
            total: row.get("total"),
            issued: row.get("issued"),
        })
    }
}
