//! Authentication service: login, profile, password reset

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        auth::{Claims, ForgotPasswordRequest, LoginRequest, LoginResponse, Profile,
            ResetPasswordRequest, Role},
        borrower::BorrowerKind,
        staff::StaffRole,
    },
    repository::Repository,
    services::{email::EmailService, validation_message},
};

/// Hash a password with argon2id and a fresh salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Six random digits, zero padded. Synchronous so the RNG never crosses
/// an await point.
fn generate_otp() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

/// A login credential row pulled from whichever table the role selects
struct Account {
    id: i32,
    name: String,
    email: String,
    password: String,
    reset_otp: Option<String>,
    otp_expiry: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    email: EmailService,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, email: EmailService, config: AuthConfig) -> Self {
        Self {
            repository,
            email,
            config,
        }
    }

    /// Authenticate and mint a JWT. Wrong role, unknown email and wrong
    /// password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        request.validate().map_err(validation_message)?;

        let invalid = || AppError::Authentication("Invalid email or password".to_string());

        let account = self
            .find_account(request.role, &request.email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&request.password, &account.password)? {
            return Err(invalid());
        }

        let now = Utc::now();
        let claims = Claims {
            sub: account.email.clone(),
            user_id: account.id,
            role: request.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.config.jwt_expiration_hours as i64)).timestamp(),
        };
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!(role = %request.role, user_id = account.id, "login");

        Ok(LoginResponse {
            token,
            role: request.role,
            id: account.id,
            name: account.name,
            email: account.email,
        })
    }

    /// The authenticated account's own record
    pub async fn profile(&self, claims: &Claims) -> AppResult<Profile> {
        let missing = || AppError::NotFound("Account no longer exists".to_string());
        match claims.role {
            Role::Admin | Role::Librarian => {
                let staff = self
                    .repository
                    .staff
                    .get_by_id(claims.user_id)
                    .await?
                    .ok_or_else(missing)?;
                Ok(Profile::Staff(staff))
            }
            Role::Student => {
                let student = self
                    .repository
                    .borrowers
                    .student_by_id(claims.user_id)
                    .await?
                    .ok_or_else(missing)?;
                Ok(Profile::Student(student))
            }
            Role::Faculty => {
                let faculty = self
                    .repository
                    .borrowers
                    .faculty_by_id(claims.user_id)
                    .await?
                    .ok_or_else(missing)?;
                Ok(Profile::Faculty(faculty))
            }
        }
    }

    /// Store a short-lived OTP against the account and mail it out
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> AppResult<()> {
        request.validate().map_err(validation_message)?;

        let account = self
            .find_account(request.role, &request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("No account found with this email".to_string()))?;

        let otp = generate_otp();
        let expiry = Utc::now() + Duration::minutes(self.config.otp_expiry_minutes);

        match request.role {
            Role::Admin | Role::Librarian => {
                self.repository
                    .staff
                    .set_reset_otp(&account.email, &otp, expiry)
                    .await?;
            }
            Role::Student => {
                self.repository
                    .borrowers
                    .set_reset_otp(BorrowerKind::Student, &account.email, &otp, expiry)
                    .await?;
            }
            Role::Faculty => {
                self.repository
                    .borrowers
                    .set_reset_otp(BorrowerKind::Faculty, &account.email, &otp, expiry)
                    .await?;
            }
        }

        self.email
            .send_reset_otp(&account.email, &otp, self.config.otp_expiry_minutes)
            .await?;

        tracing::info!(role = %request.role, user_id = account.id, "password reset OTP sent");
        Ok(())
    }

    /// Check the OTP and set the new password. The OTP is cleared on use.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> AppResult<()> {
        request.validate().map_err(validation_message)?;

        let account = self
            .find_account(request.role, &request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("No account found with this email".to_string()))?;

        let valid = matches!(
            (&account.reset_otp, &account.otp_expiry),
            (Some(otp), Some(expiry)) if *otp == request.otp && *expiry > Utc::now()
        );
        if !valid {
            return Err(AppError::Validation("Invalid or expired OTP".to_string()));
        }

        let hashed = hash_password(&request.new_password)?;
        match request.role {
            Role::Admin | Role::Librarian => {
                self.repository
                    .staff
                    .reset_password(&account.email, &hashed)
                    .await?;
            }
            Role::Student => {
                self.repository
                    .borrowers
                    .reset_password(BorrowerKind::Student, &account.email, &hashed)
                    .await?;
            }
            Role::Faculty => {
                self.repository
                    .borrowers
                    .reset_password(BorrowerKind::Faculty, &account.email, &hashed)
                    .await?;
            }
        }

        tracing::info!(role = %request.role, user_id = account.id, "password reset");
        Ok(())
    }

    async fn find_account(&self, role: Role, email: &str) -> AppResult<Option<Account>> {
        let account = match role {
            Role::Admin | Role::Librarian => {
                let staff_role = match role {
                    Role::Admin => StaffRole::Admin,
                    _ => StaffRole::Librarian,
                };
                self.repository
                    .staff
                    .get_by_email(staff_role, email)
                    .await?
                    .map(|s| Account {
                        id: s.id,
                        name: s.name,
                        email: s.email,
                        password: s.password,
                        reset_otp: s.reset_otp,
                        otp_expiry: s.otp_expiry,
                    })
            }
            Role::Student => {
                self.repository
                    .borrowers
                    .student_by_email(email)
                    .await?
                    .map(|s| Account {
                        id: s.id,
                        name: s.name,
                        email: s.email,
                        password: s.password,
                        reset_otp: s.reset_otp,
                        otp_expiry: s.otp_expiry,
                    })
            }
            Role::Faculty => {
                self.repository
                    .borrowers
                    .faculty_by_email(email)
                    .await?
                    .map(|f| Account {
                        id: f.id,
                        name: f.name,
                        email: f.email,
                        password: f.password,
                        reset_otp: f.reset_otp,
                        otp_expiry: f.otp_expiry,
                    })
            }
        };
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip_verifies() {
        let hash = hash_password("Pass@1234").unwrap();
        assert!(verify_password("Pass@1234", &hash).unwrap());
        assert!(!verify_password("Pass@1235", &hash).unwrap());
    }

    #[test]
    fn otp_is_always_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
