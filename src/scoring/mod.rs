pub mod config;
pub mod engine;
pub mod tiers;
pub mod types;
pub mod validation;

pub use config::*;
pub use engine::{aggregate, EvaluateeResult, Evaluatee, ScoreSample};
pub use tiers::{quota_counts, TierCounts};
pub use types::{DepartmentRating, ParseEnumError, Role, RoleBuckets, Tier};
pub use validation::validate_scoring;
