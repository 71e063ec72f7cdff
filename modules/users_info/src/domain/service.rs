use std::sync::Arc;

use crate::contract::model::{DateRange, NewUser, User, UserPatch};
use crate::domain::error::DomainError;
use crate::domain::patch::apply_patch;
use crate::domain::repo::UsersRepository;
use crate::domain::validation::{Validator, DEFAULT_MIN_AGE_YEARS};
use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument};

/// Domain service with business rules for user management.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    validator: Validator,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub min_age_years: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            min_age_years: DEFAULT_MIN_AGE_YEARS,
        }
    }
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(repo: Arc<dyn UsersRepository>, config: ServiceConfig) -> Self {
        Self {
            repo,
            validator: Validator::new(config.min_age_years),
        }
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    #[instrument(name = "users_info.service.get_user", skip(self), fields(user_id = id))]
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        debug!("Getting user by id");

        let user = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!(found = user.is_some(), "User lookup finished");
        Ok(user)
    }

    #[instrument(name = "users_info.service.list_users", skip(self), fields(from = ?range.from, to = ?range.to))]
    pub async fn list_users(&self, range: DateRange) -> Result<Vec<User>, DomainError> {
        debug!("Listing users");

        self.validator.validate_range(&range)?;

        let users = self
            .repo
            .list(&range)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        debug!("Successfully listed {} users", users.len());
        Ok(users)
    }

    #[instrument(
        name = "users_info.service.create_user",
        skip(self, new_user),
        fields(email = %new_user.email)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        let valid = self.validator.validate_new_user(&new_user, self.today())?;

        let user = self
            .repo
            .insert(valid)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!("Successfully created user with id={}", user.id);
        Ok(user)
    }

    #[instrument(
        name = "users_info.service.replace_user",
        skip(self, user),
        fields(user_id = id)
    )]
    pub async fn replace_user(&self, id: i64, user: NewUser) -> Result<bool, DomainError> {
        info!("Replacing user");

        let valid = self.validator.validate_new_user(&user, self.today())?;

        let replaced = self
            .repo
            .replace(valid.into_user(id))
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        if replaced {
            info!("Successfully replaced user");
        } else {
            debug!("No user to replace");
        }
        Ok(replaced)
    }

    #[instrument(
        name = "users_info.service.patch_user",
        skip(self, patch),
        fields(user_id = id)
    )]
    pub async fn patch_user(&self, id: i64, patch: UserPatch) -> Result<bool, DomainError> {
        info!("Patching user");

        self.validator.validate_patch(&patch, self.today())?;

        let merge = |user: &mut User| {
            let applied = apply_patch(user, &patch);
            debug!(?applied, "Patch merged");
        };
        let patched = self
            .repo
            .update_with(id, &merge)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        if patched {
            info!("Successfully patched user");
        } else {
            debug!("No user to patch");
        }
        Ok(patched)
    }

    #[instrument(
        name = "users_info.service.delete_user",
        skip(self),
        fields(user_id = id)
    )]
    pub async fn delete_user(&self, id: i64) -> Result<bool, DomainError> {
        info!("Deleting user");

        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        if deleted {
            info!("Successfully deleted user");
        }
        Ok(deleted)
    }
}
