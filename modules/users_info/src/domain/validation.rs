//! Input validation for users and date ranges.
//!
//! Validators are pure: they never mutate their input and either return the
//! validated value or every violation found, in field order.

use chrono::{Months, NaiveDate};
use thiserror::Error;

use crate::contract::model::{DateRange, NewUser, User, UserPatch};

/// Wire pattern for every date the service reads or writes (`dd-MM-yyyy`).
pub const DATE_FORMAT: &str = "%d-%m-%Y";

pub const DEFAULT_MIN_AGE_YEARS: u32 = 18;

/// Field paths as reported to clients.
pub mod fields {
    pub const DATA: &str = "data";
    pub const EMAIL: &str = "data.email";
    pub const FIRST_NAME: &str = "data.firstName";
    pub const LAST_NAME: &str = "data.lastName";
    pub const BIRTH_DATE: &str = "data.birthDate";
}

pub const MSG_NOT_BLANK: &str = "must not be blank";
pub const MSG_NOT_NULL: &str = "must not be null";
pub const MSG_PAST: &str = "must be a date in the past";
pub const MSG_RANGE: &str = "Invalid date range: 'from' must be before 'to'";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Per-field constraint violation; several may be reported at once.
    #[error("Field [{field}] is not valid: {message}")]
    FieldInvalid { field: String, message: String },

    /// The raw value does not match [`DATE_FORMAT`].
    #[error("Input date [{input}] is not valid or has a wrong format: {reason}")]
    DateFormat { input: String, reason: String },

    /// Both range bounds present and `from` is not before `to`.
    #[error("Invalid date range: 'from' must be before 'to'")]
    RangeInvalid,

    /// A path or query parameter of the wrong type.
    #[error("Param [{name}] is not valid: expected {expected}")]
    ParamTypeMismatch { name: String, expected: String },
}

impl Violation {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FieldInvalid {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn date_format(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DateFormat {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn param_type(name: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::ParamTypeMismatch {
            name: name.into(),
            expected: expected.into(),
        }
    }
}

/// Parse a wire date. Failure carries the raw input so it can be echoed back.
pub fn parse_date(raw: &str) -> Result<NaiveDate, Violation> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| Violation::date_format(raw, format!("Text '{raw}' could not be parsed: {e}")))
}

pub fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, Violation> {
    raw.map(parse_date).transpose()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Null, empty or all-whitespace.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// A user payload that passed every create/replace rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl ValidUser {
    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            birth_date: self.birth_date,
            address: self.address,
            phone_number: self.phone_number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    min_age_years: u32,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_AGE_YEARS)
    }
}

impl Validator {
    pub fn new(min_age_years: u32) -> Self {
        Self { min_age_years }
    }

    pub fn min_age_years(&self) -> u32 {
        self.min_age_years
    }

    /// Rules for create and full replace: required fields plus birth-date checks.
    pub fn validate_new_user(
        &self,
        user: &NewUser,
        today: NaiveDate,
    ) -> Result<ValidUser, Vec<Violation>> {
        let mut violations = Vec::new();

        for (field, value) in [
            (fields::EMAIL, &user.email),
            (fields::FIRST_NAME, &user.first_name),
            (fields::LAST_NAME, &user.last_name),
        ] {
            if is_blank(value) {
                violations.push(Violation::field(field, MSG_NOT_BLANK));
            }
        }

        match user.birth_date {
            Some(date) => self.check_birth_date(date, today, &mut violations),
            None => violations.push(Violation::field(fields::BIRTH_DATE, MSG_NOT_NULL)),
        }

        match (violations.is_empty(), user.birth_date) {
            (true, Some(birth_date)) => Ok(ValidUser {
                email: user.email.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                birth_date,
                address: user.address.clone(),
                phone_number: user.phone_number.clone(),
            }),
            _ => Err(violations),
        }
    }

    /// Patches only constrain the birth date; blank strings are left to the patch rules.
    pub fn validate_patch(&self, patch: &UserPatch, today: NaiveDate) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        if let Some(date) = patch.birth_date {
            self.check_birth_date(date, today, &mut violations);
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    pub fn validate_range(&self, range: &DateRange) -> Result<(), Vec<Violation>> {
        match (range.from, range.to) {
            (Some(from), Some(to)) if from >= to => Err(vec![Violation::RangeInvalid]),
            _ => Ok(()),
        }
    }

    pub fn age_message(&self) -> String {
        format!("User age must be over {} y. o.", self.min_age_years)
    }

    fn check_birth_date(&self, date: NaiveDate, today: NaiveDate, out: &mut Vec<Violation>) {
        if date >= today {
            out.push(Violation::field(fields::BIRTH_DATE, MSG_PAST));
        }
        let old_enough = today
            .checked_sub_months(Months::new(self.min_age_years.saturating_mul(12)))
            .is_some_and(|limit| date < limit);
        if !old_enough {
            out.push(Violation::field(fields::BIRTH_DATE, self.age_message()));
        }
    }
}
