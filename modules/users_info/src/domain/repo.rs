use crate::contract::model::{DateRange, User};
use crate::domain::validation::ValidUser;
use async_trait::async_trait;

/// In-place mutation run by [`UsersRepository::update_with`].
pub type UserMutation<'a> = &'a (dyn Fn(&mut User) + Send + Sync);

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Load a user by id.
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    /// Users whose birth date lies strictly inside `range`, in ascending id order.
    async fn list(&self, range: &DateRange) -> anyhow::Result<Vec<User>>;
    /// Persist a validated user and return it with the assigned id.
    async fn insert(&self, user: ValidUser) -> anyhow::Result<User>;
    /// Overwrite the user with `user.id`. Returns false if no such user exists.
    async fn replace(&self, user: User) -> anyhow::Result<bool>;
    /// Load, mutate and store one user atomically. Returns false if no such user exists.
    async fn update_with(&self, id: i64, mutate: UserMutation<'_>) -> anyhow::Result<bool>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}
