use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scoring::{DepartmentRating, ScoringConfig};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Rating used when `--rating` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_rating: Option<DepartmentRating>,
    /// Dataset used when `--data` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringConfig>,
}

impl Config {
    /// Effective scoring parameters (defaults when the section is absent)
    pub fn scoring(&self) -> ScoringConfig {
        self.scoring.clone().unwrap_or_default()
    }

    pub fn department_rating(&self) -> DepartmentRating {
        self.department_rating.unwrap_or_default()
    }
}
