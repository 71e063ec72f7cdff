//! Sparse merge of a [`UserPatch`] onto a stored [`User`].
//!
//! Each patchable field has one rule in [`FIELD_RULES`]: the rule checks the
//! patch value and, when it qualifies, assigns it. `id` has no rule.

use crate::contract::model::{User, UserPatch};
use crate::domain::validation::is_blank;

/// One patchable field: returns `true` when the patch value was applied.
pub struct FieldRule {
    pub name: &'static str,
    pub apply: fn(&mut User, &UserPatch) -> bool,
}

/// Required strings: present and non-blank.
fn set_required(target: &mut String, value: Option<&String>) -> bool {
    match value {
        Some(v) if !is_blank(v) => {
            target.clone_from(v);
            true
        }
        _ => false,
    }
}

/// Optional strings: any present value, the empty string included.
fn set_optional(target: &mut Option<String>, value: Option<&String>) -> bool {
    match value {
        Some(v) => {
            *target = Some(v.clone());
            true
        }
        None => false,
    }
}

pub const FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        name: "email",
        apply: |u, p| set_required(&mut u.email, p.email.as_ref()),
    },
    FieldRule {
        name: "firstName",
        apply: |u, p| set_required(&mut u.first_name, p.first_name.as_ref()),
    },
    FieldRule {
        name: "lastName",
        apply: |u, p| set_required(&mut u.last_name, p.last_name.as_ref()),
    },
    FieldRule {
        name: "birthDate",
        apply: |u, p| match p.birth_date {
            Some(date) => {
                u.birth_date = date;
                true
            }
            None => false,
        },
    },
    FieldRule {
        name: "address",
        apply: |u, p| set_optional(&mut u.address, p.address.as_ref()),
    },
    FieldRule {
        name: "phoneNumber",
        apply: |u, p| set_optional(&mut u.phone_number, p.phone_number.as_ref()),
    },
];

/// Merge `patch` into `user` in place and return the names of the applied fields.
pub fn apply_patch(user: &mut User, patch: &UserPatch) -> Vec<&'static str> {
    FIELD_RULES
        .iter()
        .filter_map(|rule| (rule.apply)(user, patch).then_some(rule.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stored() -> User {
        User {
            id: 3,
            email: "old@example.com".into(),
            first_name: "Old".into(),
            last_name: "Name".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 5).unwrap(),
            address: Some("Kyiv".into()),
            phone_number: None,
        }
    }

    #[test]
    fn empty_patch_is_noop() {
        let mut user = stored();
        let applied = apply_patch(&mut user, &UserPatch::default());
        assert!(applied.is_empty());
        assert_eq!(user, stored());
    }

    #[test]
    fn blank_required_strings_are_ignored() {
        let mut user = stored();
        let patch = UserPatch {
            email: Some("".into()),
            first_name: Some("   ".into()),
            last_name: Some("\t".into()),
            ..Default::default()
        };
        assert!(apply_patch(&mut user, &patch).is_empty());
        assert_eq!(user, stored());
    }

    #[test]
    fn non_blank_field_changes_only_itself() {
        let mut user = stored();
        let patch = UserPatch {
            first_name: Some("New".into()),
            ..Default::default()
        };
        assert_eq!(apply_patch(&mut user, &patch), vec!["firstName"]);
        assert_eq!(
            user,
            User {
                first_name: "New".into(),
                ..stored()
            }
        );
    }

    #[test]
    fn empty_address_overwrites() {
        let mut user = stored();
        let patch = UserPatch {
            address: Some(String::new()),
            phone_number: Some("+100".into()),
            ..Default::default()
        };
        assert_eq!(apply_patch(&mut user, &patch), vec!["address", "phoneNumber"]);
        assert_eq!(user.address.as_deref(), Some(""));
        assert_eq!(user.phone_number.as_deref(), Some("+100"));
    }

    #[test]
    fn birth_date_applies_when_present() {
        let mut user = stored();
        let date = NaiveDate::from_ymd_opt(1980, 1, 2).unwrap();
        let patch = UserPatch {
            birth_date: Some(date),
            ..Default::default()
        };
        assert_eq!(apply_patch(&mut user, &patch), vec!["birthDate"]);
        assert_eq!(user.birth_date, date);
        assert_eq!(user.id, 3);
    }

    #[test]
    fn every_field_except_id_has_a_rule() {
        let names: Vec<_> = FIELD_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            ["email", "firstName", "lastName", "birthDate", "address", "phoneNumber"]
        );
    }
}
