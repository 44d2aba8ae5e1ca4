//! Health score calculation
//!
//! Two modes, chosen by whether lines of code are known:
//!
//! ```text
//! Weighted (total_loc > 0):
//!   kloc         = max(total_loc / loc_unit, min_kloc)
//!   architecture = clamp(100 - arch_penalty / kloc, 0, 100)
//!   hygiene      = clamp(100 - hyg_penalty / kloc, 0, 100)
//!   score        = round(architecture * w + hygiene * (1 - w))     w = 0.9
//!
//! Legacy (no LOC):
//!   factor = 1 + min(n / max(1, m) * 2, 8)      m <= 100
//!          = m / 50                             100 < m <= 200
//!          = 4 + (m - 200) / 100                m > 200
//!   score  = round(clamp(100 - total_penalty / factor, 0, 100))
//! ```
//!
//! `n` is the violation count and `m` the module count. In legacy mode all
//! three scores are equal. Status always comes from the architecture score.

use crate::config::ScoringConfig;
use crate::models::{HealthStatus, ScoringMode, Violation};
use crate::scoring::penalty::{PenaltyCalculator, ScoreBreakdown};
use serde::Serialize;
use tracing::debug;

/// Outcome of one score calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score: f64,
    pub architecture_score: f64,
    pub hygiene_score: f64,
    pub status: HealthStatus,
    pub mode: ScoringMode,
    pub breakdown: ScoreBreakdown,
}

pub struct ScoreCalculator<'a> {
    config: &'a ScoringConfig,
}

impl<'a> ScoreCalculator<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    pub fn calculate(
        &self,
        violations: &[Violation],
        total_loc: usize,
        total_modules: usize,
    ) -> ScoreResult {
        let breakdown = PenaltyCalculator::new(self.config).breakdown(violations);

        let result = if total_loc > 0 {
            self.weighted(breakdown, total_loc)
        } else {
            Self::legacy(breakdown, violations.len(), total_modules)
        };

        debug!(
            "Score {:.0} ({:?} mode): architecture {:.1}, hygiene {:.1}, penalties {:.2}/{:.2}",
            result.score,
            result.mode,
            result.architecture_score,
            result.hygiene_score,
            breakdown.architecture_penalty,
            breakdown.hygiene_penalty
        );
        result
    }

    fn weighted(&self, breakdown: ScoreBreakdown, total_loc: usize) -> ScoreResult {
        let kloc = (total_loc as f64 / self.config.effective_loc_unit())
            .max(self.config.effective_min_kloc());
        let weight = self.config.effective_architecture_weight();

        let architecture_score = clamp_score(100.0 - breakdown.architecture_penalty / kloc);
        let hygiene_score = clamp_score(100.0 - breakdown.hygiene_penalty / kloc);
        let blended = architecture_score * weight + hygiene_score * (1.0 - weight);
        let score = clamp_score(blended.round());

        ScoreResult {
            score,
            architecture_score,
            hygiene_score,
            status: HealthStatus::from_score(architecture_score),
            mode: ScoringMode::Weighted,
            breakdown,
        }
    }

    fn legacy(
        breakdown: ScoreBreakdown,
        violation_count: usize,
        total_modules: usize,
    ) -> ScoreResult {
        let factor = legacy_scaling_factor(violation_count, total_modules);
        let score = clamp_score(100.0 - breakdown.total() / factor).round();

        ScoreResult {
            score,
            architecture_score: score,
            hygiene_score: score,
            status: HealthStatus::from_score(score),
            mode: ScoringMode::Legacy,
            breakdown,
        }
    }
}

/// Size-aware dampening used when LOC is unknown. Always >= 1.
pub fn legacy_scaling_factor(violation_count: usize, total_modules: usize) -> f64 {
    let modules = total_modules as f64;
    if total_modules <= 100 {
        let density = violation_count as f64 / modules.max(1.0);
        1.0 + (density * 2.0).min(8.0)
    } else if total_modules <= 200 {
        modules / 50.0
    } else {
        4.0 + (modules - 200.0) / 100.0
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}
