//! Borrower models: students and faculty

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::config::FinesConfig;

/// The two kinds of borrower account. Selected once at the API boundary;
/// everything downstream dispatches on the enum, not on a request string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowerKind {
    Student,
    Faculty,
}

impl BorrowerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowerKind::Student => "student",
            BorrowerKind::Faculty => "faculty",
        }
    }

    /// Days a loan may be held before a fine starts accruing
    pub fn grace_days(&self, fines: &FinesConfig) -> i64 {
        match self {
            BorrowerKind::Student => fines.student_grace_days,
            BorrowerKind::Faculty => fines.faculty_grace_days,
        }
    }
}

impl std::fmt::Display for BorrowerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(BorrowerKind::Student),
            "faculty" => Ok(BorrowerKind::Faculty),
            _ => Err(format!("Invalid borrower kind: {}", s)),
        }
    }
}

// SQLx conversion: loans store the kind as text
impl sqlx::Type<Postgres> for BorrowerKind {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowerKind {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowerKind {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Branches a student can belong to
pub const ALLOWED_BRANCHES: &[&str] = &[
    "CSE", "ECE", "EE", "Cyber", "Mining", "ME", "Automobile", "Civil",
];

/// Student account. Identified by a 5-digit file number.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub file_no: String,
    pub parent_name: String,
    pub mobile: String,
    pub department: String,
    pub branch: String,
    #[serde(skip_serializing)]
    pub reset_otp: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Faculty account. Identified by an employee ID.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Faculty {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub employee_id: String,
    pub department: String,
    pub mobile: String,
    #[serde(skip_serializing)]
    pub reset_otp: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A resolved borrower of either kind
#[derive(Debug, Clone)]
pub enum Borrower {
    Student(Student),
    Faculty(Faculty),
}

impl Borrower {
    pub fn id(&self) -> i32 {
        match self {
            Borrower::Student(s) => s.id,
            Borrower::Faculty(f) => f.id,
        }
    }

    pub fn kind(&self) -> BorrowerKind {
        match self {
            Borrower::Student(_) => BorrowerKind::Student,
            Borrower::Faculty(_) => BorrowerKind::Faculty,
        }
    }

    /// The public identifier: file number for students, employee ID for faculty
    pub fn identifier(&self) -> &str {
        match self {
            Borrower::Student(s) => &s.file_no,
            Borrower::Faculty(f) => &f.employee_id,
        }
    }
}

/// Register student request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStudent {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    /// 5-digit file number, unique per student
    pub file_no: String,
    #[validate(length(min = 1, message = "Parent name is required"))]
    pub parent_name: String,
    /// 10-digit mobile number
    pub mobile: String,
    #[validate(length(min = 1, message = "Department is required"))]
    pub department: String,
    pub branch: String,
}

/// Register faculty request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateFaculty {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
    #[validate(length(min = 1, message = "Employee ID is required"))]
    pub employee_id: String,
    #[validate(length(min = 1, message = "Department is required"))]
    pub department: String,
    pub mobile: String,
}

/// Student search parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct StudentQuery {
    /// Exact file number lookup
    pub file_no: Option<String>,
    /// Case-insensitive name substring
    pub name: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
