//! SeaORM-backed repository implementation for the domain port.
//!
//! This struct is generic over `C: ConnectionTrait + TransactionTrait`, so it can
//! be built from a `DatabaseConnection` or from an open transaction.
//!
//! Writes go through `write_lock`. SQLite fails a deferred transaction that reads
//! and then writes with SQLITE_BUSY when another writer got there first (the busy
//! timeout does not cover the read-to-write upgrade), so at most one write runs
//! per repository at a time.

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tokio::sync::Mutex;

use crate::contract::model::{DateRange, User};
use crate::domain::repo::{UserMutation, UsersRepository};
use crate::domain::validation::ValidUser;
use crate::infra::storage::entity::{Column, Entity as UserEntity};
use crate::infra::storage::mapper::{insert_model, update_model};

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
    write_lock: Mutex<()>,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            write_lock: Mutex::new(()),
        }
    }
}

/// Overwrite every non-key column of the row `user.id`.
async fn overwrite<C: ConnectionTrait>(conn: &C, user: User) -> Result<bool, sea_orm::DbErr> {
    let id = user.id;
    let res = UserEntity::update_many()
        .set(update_model(user))
        .filter(Column::Id.eq(id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected > 0)
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn list(&self, range: &DateRange) -> anyhow::Result<Vec<User>> {
        let mut query = UserEntity::find();
        if let Some(from) = range.from {
            query = query.filter(Column::BirthDate.gt(from));
        }
        if let Some(to) = range.to {
            query = query.filter(Column::BirthDate.lt(to));
        }
        let rows = query
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("list failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, user: ValidUser) -> anyhow::Result<User> {
        let _guard = self.write_lock.lock().await;
        let model = insert_model(user)
            .insert(&self.conn)
            .await
            .context("insert failed")?;
        Ok(model.into())
    }

    async fn replace(&self, user: User) -> anyhow::Result<bool> {
        let _guard = self.write_lock.lock().await;
        overwrite(&self.conn, user).await.context("replace failed")
    }

    async fn update_with(&self, id: i64, mutate: UserMutation<'_>) -> anyhow::Result<bool> {
        let _guard = self.write_lock.lock().await;
        let txn = self.conn.begin().await.context("begin failed")?;

        let Some(found) = UserEntity::find_by_id(id)
            .one(&txn)
            .await
            .context("update_with lookup failed")?
        else {
            txn.rollback().await.context("rollback failed")?;
            return Ok(false);
        };

        let mut user: User = found.into();
        mutate(&mut user);
        user.id = id;

        let updated = overwrite(&txn, user)
            .await
            .context("update_with write failed")?;
        txn.commit().await.context("commit failed")?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let _guard = self.write_lock.lock().await;
        let res = UserEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(res.rows_affected > 0)
    }
}
