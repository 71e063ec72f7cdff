use sea_orm::{ActiveValue::NotSet, Set};

use crate::contract::model::User;
use crate::domain::validation::ValidUser;
use crate::infra::storage::entity::{ActiveModel as UserAM, Model as UserEntity};

impl From<UserEntity> for User {
    fn from(e: UserEntity) -> Self {
        Self {
            id: e.id,
            email: e.email,
            first_name: e.first_name,
            last_name: e.last_name,
            birth_date: e.birth_date,
            address: e.address,
            phone_number: e.phone_number,
        }
    }
}

/// Insert model: the id is left to `AUTOINCREMENT`.
pub fn insert_model(u: ValidUser) -> UserAM {
    UserAM {
        id: NotSet,
        email: Set(u.email),
        first_name: Set(u.first_name),
        last_name: Set(u.last_name),
        birth_date: Set(u.birth_date),
        address: Set(u.address),
        phone_number: Set(u.phone_number),
    }
}

/// Full-row update model; every column except the key is overwritten.
pub fn update_model(u: User) -> UserAM {
    UserAM {
        id: NotSet,
        email: Set(u.email),
        first_name: Set(u.first_name),
        last_name: Set(u.last_name),
        birth_date: Set(u.birth_date),
        address: Set(u.address),
        phone_number: Set(u.phone_number),
    }
}
