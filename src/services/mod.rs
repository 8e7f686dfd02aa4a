//! Business logic services

pub mod auth;
pub mod borrowers;
pub mod catalog;
pub mod circulation;
pub mod email;
pub mod stats;

use validator::ValidationErrors;

use crate::{config::AppConfig, error::AppError, repository::Repository};

/// The first human-readable message out of a validation failure
pub(crate) fn first_validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field))
            })
        })
        .next()
        .unwrap_or_else(|| "Invalid request".to_string())
}

pub(crate) fn validation_message(errors: ValidationErrors) -> AppError {
    AppError::Validation(first_validation_message(&errors))
}

/// Service container wiring every service to the shared repository
#[derive(Clone)]
pub struct Services {
    /// Shared repository, kept for readiness probes
    pub repository: Repository,
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub registration: borrowers::RegistrationService,
    pub circulation: circulation::CirculationService,
    pub stats: stats::StatsService,
}

impl Services {
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let email = email::EmailService::new(config.email.clone());
        Self {
            auth: auth::AuthService::new(repository.clone(), email, config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            registration: borrowers::RegistrationService::new(repository.clone()),
            circulation: circulation::CirculationService::new(
                repository.clone(),
                config.fines.clone(),
            ),
            stats: stats::StatsService::new(repository.clone()),
            repository,
        }
    }
}
