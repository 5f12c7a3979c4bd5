// Tier mapping
// Maps a raw suspicion score to a severity tier under a threshold set.
// Thresholds are always caller-supplied so a stored raw score can be
// re-tiered after a settings change without re-scoring.

use crate::models::{ScorerThresholds, SuspicionScore, SuspicionTier};

/// Map a score to a tier using inclusive lower bounds, checked in
/// descending order. Total over all float inputs: out-of-range scores
/// degrade to the nearest tier rather than panicking.
pub fn score_to_tier(score: f64, thresholds: &ScorerThresholds) -> SuspicionTier {
    if score >= thresholds.high {
        SuspicionTier::High
    } else if score >= thresholds.medium {
        SuspicionTier::Medium
    } else if score >= thresholds.low {
        SuspicionTier::Low
    } else {
        SuspicionTier::Clean
    }
}

pub fn to_suspicion_score(raw_score: f64, thresholds: &ScorerThresholds) -> SuspicionScore {
    SuspicionScore {
        raw_score,
        tier: score_to_tier(raw_score, thresholds),
    }
}
