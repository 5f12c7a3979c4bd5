// Shared data model
// Value types exchanged between the scorer, the classification cache and
// the settings store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============ Suspicion Tiers ============

/// Severity tier derived from a raw suspicion score.
/// Ordered by severity; `Clean` is the default no-action tier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspicionTier {
    Clean,
    Low,
    Medium,
    High,
}

impl SuspicionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for SuspicionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw suspicion score in [0,1] paired with the tier it maps to under
/// some threshold set. Immutable once produced.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspicionScore {
    pub raw_score: f64,
    pub tier: SuspicionTier,
}

// ============ Thresholds ============

/// Tier boundaries (inclusive lower bound per tier).
/// Invariant: `0 < low < medium < high < 1`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorerThresholds {
    #[serde(default = "default_low")]
    pub low: f64,
    #[serde(default = "default_medium")]
    pub medium: f64,
    #[serde(default = "default_high")]
    pub high: f64,
}

impl Default for ScorerThresholds {
    fn default() -> Self {
        Self {
            low: 0.25,
            medium: 0.6,
            high: 0.85,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("threshold {name} = {value} is outside (0, 1)")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("thresholds must satisfy low < medium < high (got {low}, {medium}, {high})")]
    Unordered { low: f64, medium: f64, high: f64 },
}

impl ScorerThresholds {
    /// Reject malformed bounds at the boundary where thresholds are
    /// accepted. The tier mapper itself never reorders or repairs them.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (name, value) in [("low", self.low), ("medium", self.medium), ("high", self.high)] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(ThresholdError::OutOfRange { name, value });
            }
        }
        if !(self.low < self.medium && self.medium < self.high) {
            return Err(ThresholdError::Unordered {
                low: self.low,
                medium: self.medium,
                high: self.high,
            });
        }
        Ok(())
    }
}

// ============ Settings ============

/// Settings snapshot supplied by the settings store. Treated as an
/// immutable value and swapped wholesale on change notifications.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub thresholds: ScorerThresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            thresholds: ScorerThresholds::default(),
        }
    }
}

// ============ Stats ============

/// Counters of first-time classifications per non-clean tier.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub low: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub high: u64,
}

impl Stats {
    /// Bump the counter for a tier. `Clean` is not counted.
    pub fn increment(&mut self, tier: SuspicionTier) {
        match tier {
            SuspicionTier::Clean => {}
            SuspicionTier::Low => self.low += 1,
            SuspicionTier::Medium => self.medium += 1,
            SuspicionTier::High => self.high += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high
    }
}

// ============ Classifier I/O ============

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierLabel {
    /// Accepts "llm" as well; some model endpoints use that label.
    #[serde(alias = "llm")]
    Ai,
    Human,
}

/// Label/score pair returned by the external text classifier.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    pub label: ClassifierLabel,
    pub score: f64,
}

impl ClassifierVerdict {
    /// Collapse the label/score pair into an AI-suspicion scalar: a
    /// "human" score is inverted so higher always means more suspicious.
    pub fn suspicion(&self) -> f64 {
        let s = self.score.clamp(0.0, 1.0);
        match self.label {
            ClassifierLabel::Ai => s,
            ClassifierLabel::Human => 1.0 - s,
        }
    }
}

// ============ Default Value Functions ============

fn default_true() -> bool { true }
fn default_low() -> f64 { 0.25 }
fn default_medium() -> f64 { 0.6 }
fn default_high() -> f64 { 0.85 }
