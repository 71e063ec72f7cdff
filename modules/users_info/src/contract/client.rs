use async_trait::async_trait;

use crate::contract::{
    error::UsersInfoError,
    model::{DateRange, NewUser, User, UserPatch},
};

/// Public API trait for the users_info module that other modules can use.
///
/// Operations that target an id report "not found" as `false` (or `None`),
/// never as an error.
#[async_trait]
pub trait UsersInfoApi: Send + Sync {
    /// Get a user by ID
    async fn get_user(&self, id: i64) -> Result<Option<User>, UsersInfoError>;

    /// List users, optionally restricted to a birth-date window
    async fn list_users(&self, range: DateRange) -> Result<Vec<User>, UsersInfoError>;

    /// Create a new user; the id is assigned by the store
    async fn create_user(&self, new_user: NewUser) -> Result<User, UsersInfoError>;

    /// Overwrite every field of an existing user
    async fn replace_user(&self, id: i64, user: NewUser) -> Result<bool, UsersInfoError>;

    /// Update a user with partial data
    async fn patch_user(&self, id: i64, patch: UserPatch) -> Result<bool, UsersInfoError>;

    /// Delete a user by ID
    async fn delete_user(&self, id: i64) -> Result<bool, UsersInfoError>;
}
