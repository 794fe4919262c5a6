use super::config::ScoringConfig;
use super::types::Role;

const WEIGHT_TOLERANCE: f64 = 0.001;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    // Role weights
    let weights = &config.role_weights;
    for role in Role::ALL {
        let weight = weights.weight(role);
        if !weight.is_finite() || weight < 0.0 {
            errors.push(format!(
                "scoring.role_weights.{}: must be a non-negative number, got {}",
                role.as_str().replace('-', "_"),
                weight
            ));
        }
    }
    let total = weights.total();
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        errors.push(format!(
            "scoring.role_weights: must sum to 1.0, got {:.4}",
            total
        ));
    }

    if !config.scale_factor.is_finite() || config.scale_factor <= 0.0 {
        errors.push(format!(
            "scoring.scale_factor: must be positive, got {}",
            config.scale_factor
        ));
    }

    let cap = config.score_cap;
    if !cap.is_finite() || cap <= 0.0 || cap > 100.0 {
        errors.push(format!("scoring.score_cap: must be in (0, 100], got {}", cap));
    }

    // Thresholds
    let t = &config.thresholds;
    for (name, value) in [("a", t.a), ("b", t.b), ("c", t.c)] {
        if !value.is_finite() || value < 0.0 || value > cap {
            errors.push(format!(
                "scoring.thresholds.{}: must be between 0 and the score cap ({}), got {}",
                name, cap, value
            ));
        }
    }
    if !(t.a > t.b && t.b > t.c) {
        errors.push(format!(
            "scoring.thresholds: must be strictly descending (a > b > c), got a={} b={} c={}",
            t.a, t.b, t.c
        ));
    }

    // Quotas
    for (rating, ratios) in config.quotas.iter() {
        let key = rating.to_string().to_lowercase();
        for (name, value) in [("a", ratios.a), ("b", ratios.b)] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!(
                    "scoring.quotas.{}.{}: must be between 0 and 1, got {}",
                    key, name, value
                ));
            }
        }
        if ratios.a + ratios.b > 1.0 + WEIGHT_TOLERANCE {
            errors.push(format!(
                "scoring.quotas.{}: a + b must not exceed 1, got {:.4}",
                key,
                ratios.a + ratios.b
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
