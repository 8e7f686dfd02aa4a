//! Borrower and staff registration service

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrower::{CreateFaculty, CreateStudent, Faculty, Student, StudentQuery, ALLOWED_BRANCHES},
        import::{ImportReport, InvalidRow, StudentImportRow},
        staff::{CreateLibrarian, Staff, StaffRole},
    },
    repository::Repository,
    services::{auth::hash_password, first_validation_message, validation_message},
};

static FILE_NO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}$").unwrap());
static MOBILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").unwrap());

/// Staff and faculty passwords must carry an uppercase letter, a digit and
/// a special character on top of the length minimum.
fn check_strong_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a digit".to_string());
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Password must contain a special character".to_string());
    }
    Ok(())
}

fn check_student_fields(student: &CreateStudent) -> Result<(), String> {
    if !FILE_NO.is_match(&student.file_no) {
        return Err("File No must be exactly 5 digits".to_string());
    }
    if !MOBILE.is_match(&student.mobile) {
        return Err("Mobile number must be exactly 10 digits".to_string());
    }
    if !ALLOWED_BRANCHES.contains(&student.branch.as_str()) {
        return Err(format!("Invalid branch: {}", student.branch));
    }
    Ok(())
}

#[derive(Clone)]
pub struct RegistrationService {
    repository: Repository,
}

impl RegistrationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn register_student(&self, student: CreateStudent) -> AppResult<Student> {
        student.validate().map_err(validation_message)?;
        check_student_fields(&student).map_err(AppError::Validation)?;

        if self.repository.borrowers.file_no_exists(&student.file_no).await? {
            return Err(AppError::Conflict(
                "Student with this File No already exists".to_string(),
            ));
        }

        let hashed = hash_password(&student.password)?;
        let created = self.repository.borrowers.create_student(&student, &hashed).await?;
        tracing::info!(file_no = %created.file_no, "student registered");
        Ok(created)
    }

    /// Bulk student upload. Each row is validated on its own; valid rows
    /// go in as one transaction. A file number already registered, or
    /// repeated within the upload, rejects the row.
    pub async fn upload_students(
        &self,
        rows: Vec<StudentImportRow>,
    ) -> AppResult<ImportReport<StudentImportRow>> {
        if rows.is_empty() {
            return Err(AppError::Validation("No student rows provided".to_string()));
        }

        let mut seen_file_nos: HashSet<String> = HashSet::new();
        let mut batch: Vec<(CreateStudent, String)> = Vec::new();
        let mut invalid = Vec::new();

        for row in rows {
            let student = match Self::row_to_student(&row) {
                Ok(student) => student,
                Err(reason) => {
                    invalid.push(InvalidRow::new(row, reason));
                    continue;
                }
            };
            if seen_file_nos.contains(&student.file_no)
                || self.repository.borrowers.file_no_exists(&student.file_no).await?
            {
                invalid.push(InvalidRow::new(
                    row,
                    "Student with this File No already exists".to_string(),
                ));
                continue;
            }
            seen_file_nos.insert(student.file_no.clone());
            let hashed = hash_password(&student.password)?;
            batch.push((student, hashed));
        }

        let inserted = if batch.is_empty() {
            0
        } else {
            self.repository.borrowers.insert_students(&batch).await?
        };

        tracing::info!(inserted, rejected = invalid.len(), "student upload processed");
        Ok(ImportReport { inserted, invalid })
    }

    pub async fn register_faculty(&self, faculty: CreateFaculty) -> AppResult<Faculty> {
        faculty.validate().map_err(validation_message)?;
        check_strong_password(&faculty.password).map_err(AppError::Validation)?;
        if !MOBILE.is_match(&faculty.mobile) {
            return Err(AppError::Validation(
                "Mobile number must be exactly 10 digits".to_string(),
            ));
        }

        if self
            .repository
            .borrowers
            .employee_id_exists(&faculty.employee_id)
            .await?
        {
            return Err(AppError::Conflict(
                "Faculty with this Employee ID already exists".to_string(),
            ));
        }
        if self.repository.borrowers.faculty_email_exists(&faculty.email).await? {
            return Err(AppError::Conflict(
                "Faculty with this email already exists".to_string(),
            ));
        }

        let hashed = hash_password(&faculty.password)?;
        let created = self.repository.borrowers.create_faculty(&faculty, &hashed).await?;
        tracing::info!(employee_id = %created.employee_id, "faculty registered");
        Ok(created)
    }

    pub async fn register_librarian(&self, librarian: CreateLibrarian) -> AppResult<Staff> {
        librarian.validate().map_err(validation_message)?;
        check_strong_password(&librarian.password).map_err(AppError::Validation)?;
        if !MOBILE.is_match(&librarian.mobile) {
            return Err(AppError::Validation(
                "Mobile number must be exactly 10 digits".to_string(),
            ));
        }

        if self.repository.staff.email_exists(&librarian.email).await? {
            return Err(AppError::Conflict(
                "Staff account with this email already exists".to_string(),
            ));
        }

        let hashed = hash_password(&librarian.password)?;
        let created = self.repository.staff.create_librarian(&librarian, &hashed).await?;
        tracing::info!(email = %created.email, "librarian registered");
        Ok(created)
    }

    pub async fn search_students(&self, query: &StudentQuery) -> AppResult<(Vec<Student>, i64)> {
        self.repository.borrowers.search_students(query).await
    }

    pub async fn list_students(&self, page: i64, per_page: i64) -> AppResult<(Vec<Student>, i64)> {
        self.repository.borrowers.list_students(page, per_page).await
    }

    pub async fn list_faculty(&self, page: i64, per_page: i64) -> AppResult<(Vec<Faculty>, i64)> {
        self.repository.borrowers.list_faculty(page, per_page).await
    }

    pub async fn list_librarians(&self, page: i64, per_page: i64) -> AppResult<(Vec<Staff>, i64)> {
        self.repository
            .staff
            .list_by_role(StaffRole::Librarian, page, per_page)
            .await
    }

    fn row_to_student(row: &StudentImportRow) -> Result<CreateStudent, String> {
        let student = CreateStudent {
            name: row.name.trim().to_string(),
            email: row.email.trim().to_string(),
            password: row.password.clone(),
            file_no: row.file_no.trim().to_string(),
            parent_name: row.parent_name.trim().to_string(),
            mobile: row.mobile.trim().to_string(),
            department: row.department.trim().to_string(),
            branch: row.branch.trim().to_string(),
        };
        if let Err(e) = student.validate() {
            return Err(first_validation_message(&e));
        }
        check_student_fields(&student)?;
        Ok(student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> StudentImportRow {
        StudentImportRow {
            name: "Asha Verma".to_string(),
            email: "asha@example.com".to_string(),
            password: "secret1".to_string(),
            file_no: "10234".to_string(),
            parent_name: "R Verma".to_string(),
            mobile: "9876543210".to_string(),
            department: "Engineering".to_string(),
            branch: "CSE".to_string(),
        }
    }

    #[test]
    fn accepts_a_well_formed_row() {
        assert!(RegistrationService::row_to_student(&sample_row()).is_ok());
    }

    #[test]
    fn rejects_short_file_number() {
        let mut row = sample_row();
        row.file_no = "123".to_string();
        let err = RegistrationService::row_to_student(&row).unwrap_err();
        assert_eq!(err, "File No must be exactly 5 digits");
    }

    #[test]
    fn rejects_non_numeric_mobile() {
        let mut row = sample_row();
        row.mobile = "98765abc10".to_string();
        assert!(RegistrationService::row_to_student(&row).is_err());
    }

    #[test]
    fn rejects_unknown_branch() {
        let mut row = sample_row();
        row.branch = "Aerospace".to_string();
        let err = RegistrationService::row_to_student(&row).unwrap_err();
        assert_eq!(err, "Invalid branch: Aerospace");
    }

    #[test]
    fn strong_password_needs_all_character_classes() {
        assert!(check_strong_password("Pass@1234").is_ok());
        assert!(check_strong_password("short@1").is_err());
        assert!(check_strong_password("password@123").is_err());
        assert!(check_strong_password("Password@abc").is_err());
        assert!(check_strong_password("Password1234").is_err());
    }
}
