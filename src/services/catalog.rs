//! Catalog service: book registration, copy code generation, search

use std::collections::HashSet;

use rand::Rng;
use rust_decimal::Decimal;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, CreateBook},
        import::{BookImportRow, ImportReport, InvalidRow},
    },
    repository::Repository,
    services::{first_validation_message, validation_message},
};

/// Attempts per copy before the generator gives up. The code space holds
/// 26 * 26 * 9000 combinations, so hitting this bound means the catalog
/// is nearly full, not bad luck.
const MAX_CODE_ATTEMPTS: u32 = 1000;

/// One candidate copy code: two uppercase letters and four digits, e.g.
/// `QS5182`. Kept synchronous so the RNG never lives across an await.
fn random_copy_code() -> String {
    let mut rng = rand::thread_rng();
    let a = rng.gen_range(b'A'..=b'Z') as char;
    let b = rng.gen_range(b'A'..=b'Z') as char;
    let digits: u32 = rng.gen_range(1000..=9999);
    format!("{}{}{}", a, b, digits)
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a title and mint one copy per unit of stock
    pub async fn register_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate().map_err(validation_message)?;
        if book.price < Decimal::ZERO {
            return Err(AppError::Validation(
                "Price must not be negative".to_string(),
            ));
        }

        let mut reserved = HashSet::new();
        let codes = self
            .generate_copy_codes(book.stock as usize, &mut reserved)
            .await?;

        let created = self.repository.books.create_with_copies(&book, &codes).await?;

        tracing::info!(book_id = created.id, copies = codes.len(), title = %created.title, "book registered");
        Ok(created)
    }

    /// Bulk book upload. Rows are validated independently; valid rows are
    /// inserted in a single transaction, the rest come back with reasons.
    /// A title already in the catalog, or repeated within the upload, is
    /// rejected as a duplicate.
    pub async fn upload_books(
        &self,
        rows: Vec<BookImportRow>,
    ) -> AppResult<ImportReport<BookImportRow>> {
        if rows.is_empty() {
            return Err(AppError::Validation("No book rows provided".to_string()));
        }

        let mut seen_titles = self.repository.books.distinct_titles().await?;
        let mut reserved_codes = HashSet::new();
        let mut batch: Vec<(CreateBook, Vec<String>)> = Vec::new();
        let mut invalid = Vec::new();

        for row in rows {
            let book = match Self::row_to_book(&row, &seen_titles) {
                Ok(book) => book,
                Err(reason) => {
                    invalid.push(InvalidRow::new(row, reason));
                    continue;
                }
            };
            seen_titles.insert(book.title.clone());
            let codes = self
                .generate_copy_codes(book.stock as usize, &mut reserved_codes)
                .await?;
            batch.push((book, codes));
        }

        let inserted = if batch.is_empty() {
            0
        } else {
            self.repository.books.insert_many(&batch).await?.len()
        };

        tracing::info!(inserted, rejected = invalid.len(), "book upload processed");
        Ok(ImportReport { inserted, invalid })
    }

    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Mint `count` fresh copy codes, unique against both the catalog and
    /// the codes already reserved in this call chain. Bounded retries so a
    /// saturated code space fails loudly instead of spinning.
    async fn generate_copy_codes(
        &self,
        count: usize,
        reserved: &mut HashSet<String>,
    ) -> AppResult<Vec<String>> {
        let mut codes = Vec::with_capacity(count);
        for _ in 0..count {
            let mut minted = None;
            for _ in 0..MAX_CODE_ATTEMPTS {
                let candidate = random_copy_code();
                if reserved.contains(&candidate) {
                    continue;
                }
                if self.repository.books.copy_code_exists(&candidate).await? {
                    continue;
                }
                minted = Some(candidate);
                break;
            }
            let code = minted.ok_or_else(|| {
                AppError::Internal("copy code space exhausted, could not mint a fresh code".into())
            })?;
            reserved.insert(code.clone());
            codes.push(code);
        }
        Ok(codes)
    }

    fn row_to_book(row: &BookImportRow, seen_titles: &HashSet<String>) -> Result<CreateBook, String> {
        let book = CreateBook {
            title: row.title.trim().to_string(),
            author: row.author.trim().to_string(),
            details: row.details.trim().to_string(),
            course: row.course.trim().to_string(),
            branch: row.branch.trim().to_string(),
            price: row.price,
            stock: row.stock,
        };
        if let Err(e) = book.validate() {
            return Err(first_validation_message(&e));
        }
        if book.price < Decimal::ZERO {
            return Err("Price must not be negative".to_string());
        }
        if seen_titles.contains(&book.title) {
            return Err("Book with this title already exists".to_string());
        }
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use regex::Regex;

    static CODE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}\d{4}$").unwrap());

    #[test]
    fn copy_codes_are_two_letters_four_digits() {
        for _ in 0..200 {
            let code = random_copy_code();
            assert!(CODE_SHAPE.is_match(&code), "bad code: {}", code);
        }
    }

    #[test]
    fn digit_part_never_has_a_leading_zero() {
        for _ in 0..200 {
            let code = random_copy_code();
            assert_ne!(code.as_bytes()[2], b'0');
        }
    }

    #[test]
    fn rejects_duplicate_title_within_batch() {
        let row = BookImportRow {
            title: "Operating System Concepts".to_string(),
            author: "Silberschatz".to_string(),
            details: "10th edition".to_string(),
            stock: 3,
            price: Decimal::new(450, 0),
            course: "B.Tech".to_string(),
            branch: "CSE".to_string(),
        };
        let mut seen = HashSet::new();
        assert!(CatalogService::row_to_book(&row, &seen).is_ok());
        seen.insert("Operating System Concepts".to_string());
        let err = CatalogService::row_to_book(&row, &seen).unwrap_err();
        assert_eq!(err, "Book with this title already exists");
    }

    #[test]
    fn rejects_row_with_missing_title() {
        let row = BookImportRow {
            title: String::new(),
            author: "Anon".to_string(),
            details: "x".to_string(),
            stock: 1,
            price: Decimal::ZERO,
            course: "B.Tech".to_string(),
            branch: "CSE".to_string(),
        };
        assert!(CatalogService::row_to_book(&row, &HashSet::new()).is_err());
    }
}
