//! Staff repository: admin and librarian accounts

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::staff::{CreateLibrarian, Staff, StaffRole},
};

#[derive(Clone)]
pub struct StaffRepository {
    pool: Pool<Postgres>,
}

impl StaffRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_email(&self, role: StaffRole, email: &str) -> AppResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff WHERE role = $1 AND LOWER(email) = LOWER($2)",
        )
        .bind(role)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(staff)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(staff)
    }

    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM staff WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a librarian account; `password` is the argon2 hash
    pub async fn create_librarian(
        &self,
        librarian: &CreateLibrarian,
        password: &str,
    ) -> AppResult<Staff> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Staff>(
            r#"
            INSERT INTO staff (role, name, email, password, mobile, library_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(StaffRole::Librarian)
        .bind(&librarian.name)
        .bind(&librarian.email)
        .bind(password)
        .bind(&librarian.mobile)
        .bind(&librarian.library_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn list_by_role(
        &self,
        role: StaffRole,
        page: i64,
        per_page: i64,
    ) -> AppResult<(Vec<Staff>, i64)> {
        let offset = (page - 1) * per_page;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff WHERE role = $1 ORDER BY name LIMIT $2 OFFSET $3",
        )
        .bind(role)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok((staff, total))
    }

    /// Store a password-reset OTP for a staff account
    pub async fn set_reset_otp(
        &self,
        email: &str,
        otp: &str,
        expiry: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE staff SET reset_otp = $1, otp_expiry = $2, updated_at = $3 WHERE LOWER(email) = LOWER($4)",
        )
        .bind(otp)
        .bind(expiry)
        .bind(Utc::now())
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replace the password and clear any pending OTP
    pub async fn reset_password(&self, email: &str, password: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE staff SET password = $1, reset_otp = NULL, otp_expiry = NULL, updated_at = $2 WHERE LOWER(email) = LOWER($3)",
        )
        .bind(password)
        .bind(Utc::now())
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
