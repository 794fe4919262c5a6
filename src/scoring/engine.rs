use serde::Serialize;
use std::collections::HashMap;

use super::config::ScoringConfig;
use super::tiers::{assign_tier, quota_counts};
use super::types::{DepartmentRating, Role, RoleBuckets, Tier};

/// Someone being ranked in a task.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluatee {
    pub employee_id: String,
    pub name: String,
    pub position: String,
    pub position_coefficient: f64,
}

/// One submitted evaluation: the 5-point dimension-weighted score a single
/// evaluator of `role` gave to `evaluatee`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSample {
    pub evaluatee: String,
    pub role: Role,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluateeResult {
    pub rank: usize,
    pub employee_id: String,
    pub name: String,
    pub position: String,
    pub position_coefficient: f64,
    #[serde(flatten)]
    pub buckets: RoleBuckets,
    /// Role-weighted score before the position coefficient
    pub weighted_score: f64,
    pub final_score: f64,
    pub tier: Tier,
}

/// Two decimals, ties to even (42.125 -> 42.12)
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn average(&self, scale: f64) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            round2(self.sum / self.count as f64 * scale)
        }
    }
}

/// Average every role's samples for each evaluatee on the 100-point scale.
/// Roles with no samples stay at 0.
fn bucket_averages(
    evaluatees: &[Evaluatee],
    samples: &[ScoreSample],
    scale: f64,
) -> Vec<RoleBuckets> {
    let positions: HashMap<&str, usize> = evaluatees
        .iter()
        .enumerate()
        .map(|(i, e)| (e.employee_id.as_str(), i))
        .collect();

    let mut accumulators = vec![[Accumulator::default(); 4]; evaluatees.len()];
    for sample in samples {
        let Some(&idx) = positions.get(sample.evaluatee.as_str()) else {
            tracing::debug!(evaluatee = %sample.evaluatee, "ignoring sample for evaluatee outside roster");
            continue;
        };
        let acc = &mut accumulators[idx][sample.role.index()];
        acc.sum += sample.score;
        acc.count += 1;
    }

    accumulators
        .iter()
        .map(|per_role| {
            let mut buckets = RoleBuckets::new();
            for role in Role::ALL {
                buckets[role] = per_role[role.index()].average(scale);
            }
            buckets
        })
        .collect()
}

/// Combine role buckets with the configured weights.
pub fn weighted_score(buckets: &RoleBuckets, config: &ScoringConfig) -> f64 {
    round2(
        buckets
            .iter()
            .map(|(role, score)| score * config.role_weights.weight(role))
            .sum(),
    )
}

/// Apply the position coefficient and clamp into `[0, score_cap]`.
pub fn final_score(weighted: f64, position_coefficient: f64, config: &ScoringConfig) -> f64 {
    let scaled = round2(weighted * position_coefficient);
    if !scaled.is_finite() {
        return 0.0;
    }
    scaled.min(config.score_cap).max(0.0)
}

/// Rank and tier every evaluatee in a task.
///
/// Evaluatees without any samples still appear, with all buckets at 0.
/// Ties on final score keep roster order.
pub fn aggregate(
    evaluatees: &[Evaluatee],
    samples: &[ScoreSample],
    rating: DepartmentRating,
    config: &ScoringConfig,
) -> Vec<EvaluateeResult> {
    if evaluatees.is_empty() {
        return Vec::new();
    }

    let buckets = bucket_averages(evaluatees, samples, config.scale_factor);

    let mut results: Vec<EvaluateeResult> = evaluatees
        .iter()
        .zip(buckets)
        .map(|(evaluatee, buckets)| {
            let weighted = weighted_score(&buckets, config);
            EvaluateeResult {
                rank: 0,
                employee_id: evaluatee.employee_id.clone(),
                name: evaluatee.name.clone(),
                position: evaluatee.position.clone(),
                position_coefficient: evaluatee.position_coefficient,
                buckets,
                weighted_score: weighted,
                final_score: final_score(weighted, evaluatee.position_coefficient, config),
                tier: Tier::D,
            }
        })
        .collect();

    // Stable sort: equal scores keep roster order
    results.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));

    let counts = quota_counts(results.len(), config.quotas.for_rating(rating));
    tracing::debug!(
        total = results.len(),
        a = counts.a,
        b = counts.b,
        rest = counts.rest,
        rating = %rating,
        "tier quotas"
    );

    for (position, result) in results.iter_mut().enumerate() {
        result.rank = position + 1;
        result.tier = assign_tier(position, result.final_score, counts, &config.thresholds);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluatee(id: &str, coefficient: f64) -> Evaluatee {
        Evaluatee {
            employee_id: id.to_string(),
            name: format!("Employee {}", id),
            position: "Engineer".to_string(),
            position_coefficient: coefficient,
        }
    }

    fn sample(evaluatee: &str, role: Role, score: f64) -> ScoreSample {
        ScoreSample {
            evaluatee: evaluatee.to_string(),
            role,
            score,
        }
    }

    /// Samples that produce exactly the given 100-point bucket averages.
    fn samples_for(id: &str, head: f64, manager: f64, peer: f64, leader: f64) -> Vec<ScoreSample> {
        vec![
            sample(id, Role::DepartmentHead, head / 20.0),
            sample(id, Role::DepartmentManager, manager / 20.0),
            sample(id, Role::Peer, peer / 20.0),
            sample(id, Role::Leader, leader / 20.0),
        ]
    }

    #[test]
    fn test_weighted_example() {
        let roster = vec![evaluatee("1", 1.0)];
        let samples = samples_for("1", 90.0, 80.0, 70.0, 85.0);
        let results = aggregate(&roster, &samples, DepartmentRating::C, &ScoringConfig::default());

        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.buckets[Role::DepartmentHead], 90.0);
        assert_eq!(r.buckets[Role::DepartmentManager], 80.0);
        assert_eq!(r.buckets[Role::Peer], 70.0);
        assert_eq!(r.buckets[Role::Leader], 85.0);
        assert_eq!(r.weighted_score, 84.0);
        assert_eq!(r.final_score, 84.0);
        assert_eq!(r.rank, 1);
    }

    #[test]
    fn test_bucket_average_across_evaluators() {
        let roster = vec![evaluatee("1", 1.0)];
        let samples = vec![
            sample("1", Role::Peer, 4.0),
            sample("1", Role::Peer, 5.0),
            sample("1", Role::Peer, 3.0),
        ];
        let results = aggregate(&roster, &samples, DepartmentRating::C, &ScoringConfig::default());
        assert_eq!(results[0].buckets[Role::Peer], 80.0);
        // head, manager and leader missing -> 0 but still weighted
        assert_eq!(results[0].buckets[Role::Leader], 0.0);
        assert_eq!(results[0].weighted_score, 12.0);
    }

    #[test]
    fn test_bucket_average_rounded_to_two_decimals() {
        let roster = vec![evaluatee("1", 1.0)];
        let samples = vec![
            sample("1", Role::Leader, 4.0),
            sample("1", Role::Leader, 4.0),
            sample("1", Role::Leader, 5.0),
        ];
        let results = aggregate(&roster, &samples, DepartmentRating::C, &ScoringConfig::default());
        // 13/3 * 20 = 86.666..
        assert_eq!(results[0].buckets[Role::Leader], 86.67);
    }

    #[test]
    fn test_no_samples_scores_zero() {
        let roster = vec![evaluatee("1", 1.2)];
        let results = aggregate(&roster, &[], DepartmentRating::A, &ScoringConfig::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].final_score, 0.0);
        assert_eq!(results[0].tier, Tier::D);
    }

    #[test]
    fn test_empty_roster_returns_empty() {
        let samples = vec![sample("1", Role::Peer, 5.0)];
        let results = aggregate(&[], &samples, DepartmentRating::A, &ScoringConfig::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_samples_outside_roster_ignored() {
        let roster = vec![evaluatee("1", 1.0)];
        let samples = vec![sample("1", Role::Peer, 4.0), sample("ghost", Role::Peer, 1.0)];
        let results = aggregate(&roster, &samples, DepartmentRating::C, &ScoringConfig::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].buckets[Role::Peer], 80.0);
    }

    #[test]
    fn test_position_coefficient_and_cap() {
        let roster = vec![evaluatee("1", 1.2), evaluatee("2", 0.9)];
        let mut samples = samples_for("1", 100.0, 100.0, 100.0, 100.0);
        samples.extend(samples_for("2", 90.0, 80.0, 70.0, 85.0));
        let results = aggregate(&roster, &samples, DepartmentRating::C, &ScoringConfig::default());

        assert_eq!(results[0].employee_id, "1");
        assert_eq!(results[0].weighted_score, 100.0);
        assert_eq!(results[0].final_score, 99.0);
        assert_eq!(results[1].final_score, 75.6);
    }

    #[test]
    fn test_final_score_ties_round_to_even() {
        let config = ScoringConfig::default();
        assert_eq!(final_score(84.25, 0.5, &config), 42.12);
        assert_eq!(final_score(84.75, 0.5, &config), 42.38);
    }

    #[test]
    fn test_round2_ties_to_even() {
        assert_eq!(round2(42.125), 42.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(86.666), 86.67);
    }

    #[test]
    fn test_final_score_floor_and_non_finite() {
        let config = ScoringConfig::default();
        assert_eq!(final_score(80.0, -1.0, &config), 0.0);
        assert_eq!(final_score(80.0, f64::NAN, &config), 0.0);
        assert_eq!(final_score(80.0, f64::INFINITY, &config), 0.0);
    }

    #[test]
    fn test_final_scores_always_in_range() {
        let config = ScoringConfig::default();
        let coefficients = [0.0, 0.5, 1.0, 1.1, 1.5, 3.0];
        let roster: Vec<_> = coefficients
            .iter()
            .enumerate()
            .map(|(i, c)| evaluatee(&i.to_string(), *c))
            .collect();
        let samples: Vec<_> = (0..coefficients.len())
            .flat_map(|i| samples_for(&i.to_string(), 100.0, 20.0, 60.0, 100.0))
            .collect();
        for result in aggregate(&roster, &samples, DepartmentRating::A, &config) {
            assert!(result.final_score >= 0.0 && result.final_score <= 99.0);
        }
    }

    #[test]
    fn test_rank_order_descending_and_ties_stable() {
        let roster = vec![
            evaluatee("low", 1.0),
            evaluatee("tie-first", 1.0),
            evaluatee("high", 1.0),
            evaluatee("tie-second", 1.0),
        ];
        let samples = vec![
            sample("low", Role::DepartmentHead, 3.0),
            sample("tie-first", Role::DepartmentHead, 4.0),
            sample("high", Role::DepartmentHead, 5.0),
            sample("tie-second", Role::DepartmentHead, 4.0),
        ];
        let results = aggregate(&roster, &samples, DepartmentRating::C, &ScoringConfig::default());
        let order: Vec<_> = results.iter().map(|r| r.employee_id.as_str()).collect();
        assert_eq!(order, vec!["high", "tie-first", "tie-second", "low"]);
        let ranks: Vec<_> = results.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        for pair in results.windows(2) {
            assert!(pair[0].final_score >= pair[1].final_score);
        }
    }

    #[test]
    fn test_tier_assignment_rating_a() {
        // 10 evaluatees, rating A -> 4 A slots, 3 B slots
        let finals = [98.0, 95.0, 91.0, 88.0, 86.0, 82.0, 79.0, 75.0, 71.0, 60.0];
        let roster: Vec<_> = (0..finals.len())
            .map(|i| evaluatee(&i.to_string(), 1.0))
            .collect();
        let samples: Vec<_> = finals
            .iter()
            .enumerate()
            .flat_map(|(i, f)| samples_for(&i.to_string(), *f, *f, *f, *f))
            .collect();
        let results = aggregate(&roster, &samples, DepartmentRating::A, &ScoringConfig::default());
        let tiers: Vec<_> = results.iter().map(|r| r.tier).collect();
        assert_eq!(
            tiers,
            vec![
                Tier::A,
                Tier::A,
                Tier::A,
                // 4th slot is an A slot but 88 < 90
                Tier::B,
                Tier::B,
                Tier::B,
                // 7th slot is a B slot but 79 < 80
                Tier::C,
                Tier::C,
                Tier::C,
                Tier::D,
            ]
        );
    }

    #[test]
    fn test_tier_assignment_rating_d_limits_a() {
        // rating D with 10 people -> only 1 A slot and 2 B slots
        let roster: Vec<_> = (0..10).map(|i| evaluatee(&i.to_string(), 1.0)).collect();
        let samples: Vec<_> = (0..10)
            .flat_map(|i| samples_for(&i.to_string(), 95.0, 95.0, 95.0, 95.0))
            .collect();
        let results = aggregate(&roster, &samples, DepartmentRating::D, &ScoringConfig::default());
        let a = results.iter().filter(|r| r.tier == Tier::A).count();
        let b = results.iter().filter(|r| r.tier == Tier::B).count();
        let c = results.iter().filter(|r| r.tier == Tier::C).count();
        assert_eq!((a, b, c), (1, 2, 7));
    }

    #[test]
    fn test_custom_weights() {
        let mut config = ScoringConfig::default();
        config.role_weights.department_head = 1.0;
        config.role_weights.department_manager = 0.0;
        config.role_weights.peer = 0.0;
        config.role_weights.leader = 0.0;
        let roster = vec![evaluatee("1", 1.0)];
        let samples = samples_for("1", 60.0, 100.0, 100.0, 100.0);
        let results = aggregate(&roster, &samples, DepartmentRating::C, &config);
        assert_eq!(results[0].final_score, 60.0);
    }
}
