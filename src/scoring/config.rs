use serde::{Deserialize, Serialize};

use super::types::{DepartmentRating, Role};

/// Main scoring configuration.
///
/// Every field is optional in YAML; omitted fields keep the defaults below.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   role_weights:
///     department_head: 0.4
///     department_manager: 0.15
///     peer: 0.15
///     leader: 0.3
///   score_cap: 99
///   thresholds: { a: 90, b: 80, c: 70 }
///   quotas:
///     a: { a: 0.4, b: 0.3 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Weight of each evaluator role's bucket in the final score
    pub role_weights: RoleWeights,

    /// Multiplier converting the 5-point scale to the 100-point scale
    pub scale_factor: f64,

    /// Upper bound applied after the position coefficient
    pub score_cap: f64,

    /// Minimum final score per tier
    pub thresholds: TierThresholds,

    /// Tier A/B ratios per department rating
    pub quotas: RatingQuotas,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            role_weights: RoleWeights::default(),
            scale_factor: 20.0,
            score_cap: 99.0,
            thresholds: TierThresholds::default(),
            quotas: RatingQuotas::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RoleWeights {
    pub department_head: f64,
    pub department_manager: f64,
    pub peer: f64,
    pub leader: f64,
}

impl Default for RoleWeights {
    fn default() -> Self {
        Self {
            department_head: 0.4,
            department_manager: 0.15,
            peer: 0.15,
            leader: 0.3,
        }
    }
}

impl RoleWeights {
    pub fn weight(&self, role: Role) -> f64 {
        match role {
            Role::DepartmentHead => self.department_head,
            Role::DepartmentManager => self.department_manager,
            Role::Peer => self.peer,
            Role::Leader => self.leader,
        }
    }

    pub fn total(&self) -> f64 {
        Role::ALL.iter().map(|role| self.weight(*role)).sum()
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TierThresholds {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            a: 90.0,
            b: 80.0,
            c: 70.0,
        }
    }
}

/// Share of evaluatees eligible for tier A and tier B.
/// Whatever is left falls through to C/D.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QuotaRatios {
    pub a: f64,
    pub b: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RatingQuotas {
    pub a: QuotaRatios,
    pub b: QuotaRatios,
    pub c: QuotaRatios,
    pub d: QuotaRatios,
}

impl Default for RatingQuotas {
    fn default() -> Self {
        Self {
            a: QuotaRatios { a: 0.4, b: 0.3 },
            b: QuotaRatios { a: 0.2, b: 0.2 },
            c: QuotaRatios { a: 0.15, b: 0.2 },
            d: QuotaRatios { a: 0.1, b: 0.2 },
        }
    }
}

impl RatingQuotas {
    pub fn for_rating(&self, rating: DepartmentRating) -> QuotaRatios {
        match rating {
            DepartmentRating::A => self.a,
            DepartmentRating::B => self.b,
            DepartmentRating::C => self.c,
            DepartmentRating::D => self.d,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (DepartmentRating, QuotaRatios)> + '_ {
        [
            DepartmentRating::A,
            DepartmentRating::B,
            DepartmentRating::C,
            DepartmentRating::D,
        ]
        .into_iter()
        .map(move |rating| (rating, self.for_rating(rating)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_config() {
        let config = ScoringConfig::default();

        assert_eq!(config.role_weights.department_head, 0.4);
        assert_eq!(config.role_weights.leader, 0.3);
        assert_eq!(config.scale_factor, 20.0);
        assert_eq!(config.score_cap, 99.0);
        assert_eq!(config.thresholds.a, 90.0);
        assert!((config.role_weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_quotas_per_rating() {
        let quotas = RatingQuotas::default();
        assert_eq!(quotas.for_rating(DepartmentRating::A), QuotaRatios { a: 0.4, b: 0.3 });
        assert_eq!(quotas.for_rating(DepartmentRating::B), QuotaRatios { a: 0.2, b: 0.2 });
        assert_eq!(quotas.for_rating(DepartmentRating::C), QuotaRatios { a: 0.15, b: 0.2 });
        assert_eq!(quotas.for_rating(DepartmentRating::D), QuotaRatios { a: 0.1, b: 0.2 });
    }

    #[test]
    fn test_scoring_config_serde_roundtrip() {
        let config = ScoringConfig::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_scoring_config_parse() {
        let yaml = r#"
score_cap: 100
role_weights:
  peer: 0.25
  department_manager: 0.05
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.score_cap, 100.0);
        assert_eq!(config.role_weights.peer, 0.25);
        assert_eq!(config.role_weights.department_manager, 0.05);
        // untouched fields keep defaults
        assert_eq!(config.role_weights.department_head, 0.4);
        assert_eq!(config.thresholds, TierThresholds::default());
    }

    #[test]
    fn test_quota_override_parse() {
        let yaml = r#"
quotas:
  c: { a: 0.2, b: 0.3 }
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.quotas.c, QuotaRatios { a: 0.2, b: 0.3 });
        assert_eq!(config.quotas.a, QuotaRatios { a: 0.4, b: 0.3 });
    }

    #[test]
    fn test_empty_scoring_config_parse() {
        let config: ScoringConfig = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, ScoringConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "base_score: 100\n";
        assert!(serde_saphyr::from_str::<ScoringConfig>(yaml).is_err());
    }
}
