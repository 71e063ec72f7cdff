use thiserror::Error;

use crate::domain::validation::Violation;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed with {} violation(s)", .violations.len())]
    Validation { violations: Vec<Violation> },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation { violations }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

impl From<Vec<Violation>> for DomainError {
    fn from(violations: Vec<Violation>) -> Self {
        Self::validation(violations)
    }
}
