//! Data models for Granthalaya

pub mod auth;
pub mod book;
pub mod borrower;
pub mod import;
pub mod loan;
pub mod staff;

// Re-export commonly used types
pub use auth::{Claims, LoginRequest, LoginResponse, Role};
pub use book::{Book, BookCopy};
pub use borrower::{Borrower, BorrowerKind, Faculty, Student};
pub use loan::{IssueOutcome, Loan, ReturnOutcome};
pub use staff::{Staff, StaffRole};
