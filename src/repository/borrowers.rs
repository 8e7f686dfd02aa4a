//! Borrowers repository: students and faculty

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::borrower::{
        Borrower, BorrowerKind, CreateFaculty, CreateStudent, Faculty, Student, StudentQuery,
    },
};

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Postgres>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Resolve a borrower by its public identifier (file number or
    /// employee ID depending on the kind)
    pub async fn resolve(
        &self,
        kind: BorrowerKind,
        identifier: &str,
    ) -> AppResult<Option<Borrower>> {
        match kind {
            BorrowerKind::Student => Ok(self
                .student_by_file_no(identifier)
                .await?
                .map(Borrower::Student)),
            BorrowerKind::Faculty => Ok(self
                .faculty_by_employee_id(identifier)
                .await?
                .map(Borrower::Faculty)),
        }
    }

    pub async fn student_by_file_no(&self, file_no: &str) -> AppResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE file_no = $1")
            .bind(file_no)
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    pub async fn faculty_by_employee_id(&self, employee_id: &str) -> AppResult<Option<Faculty>> {
        let faculty = sqlx::query_as::<_, Faculty>("SELECT * FROM faculty WHERE employee_id = $1")
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(faculty)
    }

    pub async fn student_by_email(&self, email: &str) -> AppResult<Option<Student>> {
        let student =
            sqlx::query_as::<_, Student>("SELECT * FROM students WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(student)
    }

    pub async fn faculty_by_email(&self, email: &str) -> AppResult<Option<Faculty>> {
        let faculty =
            sqlx::query_as::<_, Faculty>("SELECT * FROM faculty WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(faculty)
    }

    pub async fn student_by_id(&self, id: i32) -> AppResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    pub async fn faculty_by_id(&self, id: i32) -> AppResult<Option<Faculty>> {
        let faculty = sqlx::query_as::<_, Faculty>("SELECT * FROM faculty WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(faculty)
    }

    pub async fn file_no_exists(&self, file_no: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE file_no = $1)")
                .bind(file_no)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    pub async fn employee_id_exists(&self, employee_id: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM faculty WHERE employee_id = $1)")
                .bind(employee_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    pub async fn faculty_email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM faculty WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a student; `password` is the argon2 hash
    pub async fn create_student(
        &self,
        student: &CreateStudent,
        password: &str,
    ) -> AppResult<Student> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (name, email, password, file_no, parent_name, mobile, department, branch, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(&student.name)
        .bind(&student.email)
        .bind(password)
        .bind(&student.file_no)
        .bind(&student.parent_name)
        .bind(&student.mobile)
        .bind(&student.department)
        .bind(&student.branch)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Create a faculty member; `password` is the argon2 hash
    pub async fn create_faculty(
        &self,
        faculty: &CreateFaculty,
        password: &str,
    ) -> AppResult<Faculty> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Faculty>(
            r#"
            INSERT INTO faculty (name, email, password, employee_id, department, mobile, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(&faculty.name)
        .bind(&faculty.email)
        .bind(password)
        .bind(&faculty.employee_id)
        .bind(&faculty.department)
        .bind(&faculty.mobile)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Insert a validated batch of students in one transaction.
    /// Each entry pairs the row with its already-hashed password.
    pub async fn insert_students(&self, batch: &[(CreateStudent, String)]) -> AppResult<usize> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for (student, password) in batch {
            sqlx::query(
                r#"
                INSERT INTO students (name, email, password, file_no, parent_name, mobile, department, branch, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
                "#,
            )
            .bind(&student.name)
            .bind(&student.email)
            .bind(password)
            .bind(&student.file_no)
            .bind(&student.parent_name)
            .bind(&student.mobile)
            .bind(&student.department)
            .bind(&student.branch)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(batch.len())
    }

    /// Search students with pagination
    pub async fn search_students(&self, query: &StudentQuery) -> AppResult<(Vec<Student>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref file_no) = query.file_no {
            params.push(file_no.clone());
            conditions.push(format!("file_no = ${}", params.len()));
        }
        if let Some(ref name) = query.name {
            params.push(format!("%{}%", name));
            conditions.push(format!("name ILIKE ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM students {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT * FROM students {} ORDER BY name LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let mut select_builder = sqlx::query_as::<_, Student>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let students = select_builder.fetch_all(&self.pool).await?;

        Ok((students, total))
    }

    pub async fn list_students(&self, page: i64, per_page: i64) -> AppResult<(Vec<Student>, i64)> {
        let offset = (page - 1) * per_page;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        let students = sqlx::query_as::<_, Student>(
            "SELECT * FROM students ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok((students, total))
    }

    pub async fn list_faculty(&self, page: i64, per_page: i64) -> AppResult<(Vec<Faculty>, i64)> {
        let offset = (page - 1) * per_page;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM faculty")
            .fetch_one(&self.pool)
            .await?;
        let faculty = sqlx::query_as::<_, Faculty>(
            "SELECT * FROM faculty ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok((faculty, total))
    }

    pub async fn count_students(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Store a password-reset OTP for a borrower account
    pub async fn set_reset_otp(
        &self,
        kind: BorrowerKind,
        email: &str,
        otp: &str,
        expiry: DateTime<Utc>,
    ) -> AppResult<()> {
        let query = format!(
            "UPDATE {} SET reset_otp = $1, otp_expiry = $2, updated_at = $3 WHERE LOWER(email) = LOWER($4)",
            Self::table(kind)
        );
        sqlx::query(&query)
            .bind(otp)
            .bind(expiry)
            .bind(Utc::now())
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace the password and clear any pending OTP
    pub async fn reset_password(
        &self,
        kind: BorrowerKind,
        email: &str,
        password: &str,
    ) -> AppResult<()> {
        let query = format!(
            "UPDATE {} SET password = $1, reset_otp = NULL, otp_expiry = NULL, updated_at = $2 WHERE LOWER(email) = LOWER($3)",
            Self::table(kind)
        );
        sqlx::query(&query)
            .bind(password)
            .bind(Utc::now())
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn table(kind: BorrowerKind) -> &'static str {
        match kind {
            BorrowerKind::Student => "students",
            BorrowerKind::Faculty => "faculty",
        }
    }
}
