use chrono::NaiveDate;

use crate::contract::model::{DateRange, User};

impl DateRange {
    /// Strictly after `from` and strictly before `to`; a missing bound does not restrict.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date > from) && self.to.map_or(true, |to| date < to)
    }
}

/// Keep users whose birth date falls inside `range`, preserving input order.
pub fn filter_by_birth_date<I>(users: I, range: &DateRange) -> Vec<User>
where
    I: IntoIterator<Item = User>,
{
    users
        .into_iter()
        .filter(|u| range.contains(u.birth_date))
        .collect()
}
