use serde::{Deserialize, Serialize};

use crate::domain::validation::DEFAULT_MIN_AGE_YEARS;

/// Configuration for the users_info module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersInfoConfig {
    #[serde(default = "default_min_age_years")]
    pub min_age_years: u32,
}

impl Default for UsersInfoConfig {
    fn default() -> Self {
        Self {
            min_age_years: default_min_age_years(),
        }
    }
}

fn default_min_age_years() -> u32 {
    DEFAULT_MIN_AGE_YEARS
}
