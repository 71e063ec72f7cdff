use serde::{Deserialize, Serialize};

use crate::contract::model::{DateRange, NewUser, User, UserPatch};
use crate::domain::validation::{
    fields, format_date, parse_optional_date, Violation, MSG_NOT_NULL,
};

/// `{ "data": ... }` wrapper used by every request and response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: Option<T>) -> Self {
        Self { data }
    }

    /// A missing or null `data` member is a violation on `data` itself.
    pub fn require(self) -> Result<T, Vec<Violation>> {
        self.data
            .ok_or_else(|| vec![Violation::field(fields::DATA, MSG_NOT_NULL)])
    }
}

/// REST DTO for user representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// `dd-MM-yyyy`
    pub birth_date: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// REST DTO for create and full replace. Any `id` in the body is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// REST DTO for updating a user (partial)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserPatchReq {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// REST DTO for list query parameters
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

// Conversion implementations between REST DTOs and contract models.
// Dates are parsed here; a malformed date is reported before any other check.

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            birth_date: format_date(user.birth_date),
            address: user.address,
            phone_number: user.phone_number,
        }
    }
}

impl TryFrom<UserReq> for NewUser {
    type Error = Vec<Violation>;

    fn try_from(req: UserReq) -> Result<Self, Self::Error> {
        let birth_date = parse_optional_date(req.birth_date.as_deref()).map_err(|v| vec![v])?;
        Ok(Self {
            email: req.email.unwrap_or_default(),
            first_name: req.first_name.unwrap_or_default(),
            last_name: req.last_name.unwrap_or_default(),
            birth_date,
            address: req.address,
            phone_number: req.phone_number,
        })
    }
}

impl TryFrom<UserPatchReq> for UserPatch {
    type Error = Vec<Violation>;

    fn try_from(req: UserPatchReq) -> Result<Self, Self::Error> {
        let birth_date = parse_optional_date(req.birth_date.as_deref()).map_err(|v| vec![v])?;
        Ok(Self {
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            birth_date,
            address: req.address,
            phone_number: req.phone_number,
        })
    }
}

impl TryFrom<RangeQuery> for DateRange {
    type Error = Vec<Violation>;

    /// Both bounds are parsed so that every malformed one is reported.
    fn try_from(q: RangeQuery) -> Result<Self, Self::Error> {
        let from = parse_optional_date(q.from.as_deref());
        let to = parse_optional_date(q.to.as_deref());
        match (from, to) {
            (Ok(from), Ok(to)) => Ok(DateRange::new(from, to)),
            (from, to) => Err([from.err(), to.err()].into_iter().flatten().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn user_dto_uses_camel_case_and_wire_dates() {
        let dto = UserDto::from(User {
            id: 5,
            email: "a@b.c".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            birth_date: NaiveDate::from_ymd_opt(1994, 1, 1).unwrap(),
            address: None,
            phone_number: Some("123".into()),
        });
        assert_eq!(
            serde_json::to_value(&dto).unwrap(),
            json!({
                "id": 5,
                "email": "a@b.c",
                "firstName": "A",
                "lastName": "B",
                "birthDate": "01-01-1994",
                "address": null,
                "phoneNumber": "123"
            })
        );
    }

    #[test]
    fn missing_data_is_a_violation() {
        let env: DataEnvelope<UserReq> = serde_json::from_value(json!({})).unwrap();
        assert_eq!(
            env.require().unwrap_err(),
            vec![Violation::field("data", "must not be null")]
        );
        let env: DataEnvelope<UserReq> = serde_json::from_value(json!({ "data": null })).unwrap();
        assert!(env.require().is_err());
    }

    #[test]
    fn user_req_converts_and_ignores_id() {
        let env: DataEnvelope<UserReq> = serde_json::from_value(json!({
            "data": { "id": 77, "email": "x@y.z", "firstName": "X", "birthDate": "02-03-1990" }
        }))
        .unwrap();
        let new_user = NewUser::try_from(env.require().unwrap()).unwrap();
        assert_eq!(new_user.email, "x@y.z");
        assert_eq!(new_user.last_name, "");
        assert_eq!(new_user.birth_date, NaiveDate::from_ymd_opt(1990, 3, 2));
    }

    #[test]
    fn malformed_birth_date_is_reported_alone() {
        let req = UserReq {
            birth_date: Some("1990/03/02".into()),
            ..Default::default()
        };
        let errs = NewUser::try_from(req).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(matches!(&errs[0], Violation::DateFormat { input, .. } if input == "1990/03/02"));
    }

    #[test]
    fn patch_keeps_blank_strings_for_the_applier() {
        let req: UserPatchReq = serde_json::from_value(json!({ "firstName": "", "address": "" })).unwrap();
        let patch = UserPatch::try_from(req).unwrap();
        assert_eq!(patch.first_name.as_deref(), Some(""));
        assert_eq!(patch.address.as_deref(), Some(""));
        assert_eq!(patch.birth_date, None);
    }

    #[test]
    fn range_query_reports_every_bad_bound() {
        let errs = DateRange::try_from(RangeQuery {
            from: Some("bad".into()),
            to: Some("also-bad".into()),
        })
        .unwrap_err();
        assert_eq!(errs.len(), 2);

        let range = DateRange::try_from(RangeQuery {
            from: Some("01-01-1992".into()),
            to: None,
        })
        .unwrap();
        assert_eq!(range.from, NaiveDate::from_ymd_opt(1992, 1, 1));
        assert!(range.to.is_none());
    }
}
