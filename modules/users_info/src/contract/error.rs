use thiserror::Error;

use crate::domain::validation::Violation;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone)]
pub enum UsersInfoError {
    #[error("Validation error: {}", .violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Validation { violations: Vec<Violation> },

    #[error("Internal error")]
    Internal,
}

impl UsersInfoError {
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation { violations }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for UsersInfoError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            Validation { violations } => Self::validation(violations),
            Database { .. } => Self::internal(),
        }
    }
}
