use super::config::{QuotaRatios, TierThresholds};
use super::types::Tier;

/// Number of ranked positions eligible for tier A and tier B.
/// `rest` absorbs the remainder so the three always sum to the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierCounts {
    pub a: usize,
    pub b: usize,
    pub rest: usize,
}

impl TierCounts {
    pub fn total(&self) -> usize {
        self.a + self.b + self.rest
    }
}

/// Round `total * ratio` half-to-even, so 2.5 -> 2 and 1.5 -> 2.
fn ratio_count(total: usize, ratio: f64) -> usize {
    let raw = (total as f64 * ratio).round_ties_even();
    if raw.is_finite() && raw > 0.0 {
        raw as usize
    } else {
        0
    }
}

pub fn quota_counts(total: usize, ratios: QuotaRatios) -> TierCounts {
    let a = ratio_count(total, ratios.a).min(total);
    let b = ratio_count(total, ratios.b).min(total - a);
    TierCounts {
        a,
        b,
        rest: total - a - b,
    }
}

/// Tier for the evaluatee at 0-based `position` in the ranking.
///
/// A and B need both a quota slot and the score threshold; C only needs the
/// threshold. Everyone else is D.
pub fn assign_tier(
    position: usize,
    score: f64,
    counts: TierCounts,
    thresholds: &TierThresholds,
) -> Tier {
    if position < counts.a && score >= thresholds.a {
        Tier::A
    } else if position < counts.a + counts.b && score >= thresholds.b {
        Tier::B
    } else if score >= thresholds.c {
        Tier::C
    } else {
        Tier::D
    }
}
