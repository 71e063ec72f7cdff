//! Process-local store used when no database is configured.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::contract::model::{DateRange, User};
use crate::domain::range::filter_by_birth_date;
use crate::domain::repo::{UserMutation, UsersRepository};
use crate::domain::validation::ValidUser;

/// Users keyed by id; `BTreeMap` keeps iteration in ascending id order.
pub struct InMemoryUsersRepository {
    users: RwLock<BTreeMap<i64, User>>,
    next_id: AtomicI64,
}

impl Default for InMemoryUsersRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUsersRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl UsersRepository for InMemoryUsersRepository {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn list(&self, range: &DateRange) -> anyhow::Result<Vec<User>> {
        let users = self.users.read();
        Ok(filter_by_birth_date(users.values().cloned(), range))
    }

    async fn insert(&self, user: ValidUser) -> anyhow::Result<User> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = user.into_user(id);
        self.users.write().insert(id, user.clone());
        Ok(user)
    }

    async fn replace(&self, user: User) -> anyhow::Result<bool> {
        let mut users = self.users.write();
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_with(&self, id: i64, mutate: UserMutation<'_>) -> anyhow::Result<bool> {
        let mut users = self.users.write();
        match users.get_mut(&id) {
            Some(user) => {
                mutate(user);
                user.id = id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.users.write().remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn valid(email: &str, year: i32) -> ValidUser {
        ValidUser {
            email: email.into(),
            first_name: "First".into(),
            last_name: "Last".into(),
            birth_date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            address: None,
            phone_number: None,
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_and_never_reused() {
        let repo = InMemoryUsersRepository::new();
        let a = repo.insert(valid("a@x.io", 1990)).await.unwrap();
        let b = repo.insert(valid("b@x.io", 1991)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        assert!(repo.delete(b.id).await.unwrap());
        let c = repo.insert(valid("c@x.io", 1992)).await.unwrap();
        assert_eq!(c.id, 3);
        assert_eq!(repo.users.read().len(), 2);
    }

    #[tokio::test]
    async fn replace_unknown_id_leaves_store_unchanged() {
        let repo = InMemoryUsersRepository::new();
        let a = repo.insert(valid("a@x.io", 1990)).await.unwrap();

        let ghost = valid("ghost@x.io", 1980).into_user(42);
        assert!(!repo.replace(ghost).await.unwrap());
        assert_eq!(repo.users.read().len(), 1);
        assert_eq!(repo.find_by_id(a.id).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn update_with_cannot_change_id() {
        let repo = InMemoryUsersRepository::new();
        let a = repo.insert(valid("a@x.io", 1990)).await.unwrap();

        let updated = repo
            .update_with(a.id, &|u: &mut User| {
                u.id = 99;
                u.first_name = "Changed".into();
            })
            .await
            .unwrap();
        assert!(updated);

        let stored = repo.find_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(stored.first_name, "Changed");
        assert!(repo.find_by_id(99).await.unwrap().is_none());
        assert!(!repo.update_with(7, &|_: &mut User| {}).await.unwrap());
    }

    #[tokio::test]
    async fn list_filters_in_id_order() {
        let repo = InMemoryUsersRepository::new();
        for (email, year) in [("a@x.io", 1994), ("b@x.io", 1970), ("c@x.io", 1996)] {
            repo.insert(valid(email, year)).await.unwrap();
        }
        let from = NaiveDate::from_ymd_opt(1992, 1, 1);
        let ids: Vec<_> = repo
            .list(&DateRange::new(from, None))
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
