//! Penalty partitioning into architecture and hygiene buckets

use crate::config::ScoringConfig;
use crate::models::{sanitize_penalty, Violation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Structural and coupling rules
const ARCHITECTURE_RULES: &[&str] = &[
    "circular-dependency",
    "layer-violation",
    "too-many-imports",
    "too-many-dependents",
];

/// Cleanliness rules; unknown names are scored here as well
const HYGIENE_RULES: &[&str] = &[
    "duplicate-code",
    "large-module",
    "magic-numbers",
    "wildcard-imports",
    "todo-markers",
    "missing-types",
    "missing-tests",
];

/// Which sub-score a rule's penalties count against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBucket {
    Architecture,
    Hygiene,
}

impl ScoreBucket {
    /// Built-in classification of a rule name
    pub fn for_rule(rule: &str) -> Self {
        if ARCHITECTURE_RULES.contains(&rule) {
            ScoreBucket::Architecture
        } else {
            if !HYGIENE_RULES.contains(&rule) {
                debug!("Unclassified rule {}, scoring as hygiene", rule);
            }
            ScoreBucket::Hygiene
        }
    }
}

/// Summed penalties per bucket, both finite and >= 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub architecture_penalty: f64,
    pub hygiene_penalty: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.architecture_penalty + self.hygiene_penalty
    }
}

/// Partitions violation penalties by bucket.
///
/// `scoring.rule_buckets` entries take precedence over the built-in table.
pub struct PenaltyCalculator<'a> {
    overrides: &'a HashMap<String, ScoreBucket>,
}

impl<'a> PenaltyCalculator<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self {
            overrides: &config.rule_buckets,
        }
    }

    pub fn bucket_of(&self, rule: &str) -> ScoreBucket {
        self.overrides
            .get(rule)
            .copied()
            .unwrap_or_else(|| ScoreBucket::for_rule(rule))
    }

    pub fn breakdown(&self, violations: &[Violation]) -> ScoreBreakdown {
        violations
            .iter()
            .fold(ScoreBreakdown::default(), |mut acc, v| {
                let penalty = sanitize_penalty(v.penalty);
                match self.bucket_of(&v.rule) {
                    ScoreBucket::Architecture => acc.architecture_penalty += penalty,
                    ScoreBucket::Hygiene => acc.hygiene_penalty += penalty,
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn violation(rule: &str, penalty: f64) -> Violation {
        Violation::new(rule, Severity::Warning, "a.ts", "m", penalty)
    }

    #[test]
    fn test_builtin_table() {
        assert_eq!(ScoreBucket::for_rule("circular-dependency"), ScoreBucket::Architecture);
        assert_eq!(ScoreBucket::for_rule("too-many-dependents"), ScoreBucket::Architecture);
        assert_eq!(ScoreBucket::for_rule("duplicate-code"), ScoreBucket::Hygiene);
        assert_eq!(ScoreBucket::for_rule("magic-numbers"), ScoreBucket::Hygiene);
        assert_eq!(ScoreBucket::for_rule("something-new"), ScoreBucket::Hygiene);
    }

    #[test]
    fn test_breakdown_partitions_penalties() {
        let config = ScoringConfig::default();
        let calc = PenaltyCalculator::new(&config);
        let breakdown = calc.breakdown(&[
            violation("circular-dependency", 15.0),
            violation("layer-violation", 10.0),
            violation("duplicate-code", 1.5),
            violation("custom-rule", 0.5),
        ]);

        assert_eq!(breakdown.architecture_penalty, 25.0);
        assert_eq!(breakdown.hygiene_penalty, 2.0);
        assert_eq!(breakdown.total(), 27.0);
    }

    #[test]
    fn test_override_moves_rule() {
        let mut config = ScoringConfig::default();
        config
            .rule_buckets
            .insert("duplicate-code".to_string(), ScoreBucket::Architecture);
        let calc = PenaltyCalculator::new(&config);

        let breakdown = calc.breakdown(&[violation("duplicate-code", 3.0)]);
        assert_eq!(breakdown.architecture_penalty, 3.0);
        assert_eq!(breakdown.hygiene_penalty, 0.0);
    }

    #[test]
    fn test_bad_penalties_count_as_zero() {
        let config = ScoringConfig::default();
        let calc = PenaltyCalculator::new(&config);

        let mut broken = violation("layer-violation", 1.0);
        broken.penalty = f64::INFINITY;
        let breakdown = calc.breakdown(&[broken]);
        assert_eq!(breakdown.total(), 0.0);
    }
}
