//! Large Module Rule
//!
//! Flags modules whose line count exceeds `max_lines` (default 800).
//! Above twice the threshold the violation is critical. The number of
//! dependents is mentioned so the split can be planned around them.

use crate::models::{Severity, Violation};
use crate::rules::base::{Rule, RuleCategory, RuleContext};
use anyhow::Result;
use tracing::debug;

const NAME: &str = "large-module";
const BASE_PENALTY: f64 = 1.0;

pub struct LargeModuleRule {
    threshold: usize,
}

impl LargeModuleRule {
    pub fn new() -> Self {
        Self { threshold: 800 }
    }

    pub fn with_threshold(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl Default for LargeModuleRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for LargeModuleRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Detects modules exceeding the size threshold"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn base_penalty(&self) -> f64 {
        BASE_PENALTY
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Design
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>> {
        let options = ctx.options(NAME);
        let threshold = options.get_or("max_lines", self.threshold).max(1);
        let penalty = options.penalty_or(BASE_PENALTY);

        let mut violations = Vec::new();
        for module in ctx.modules() {
            let lines = module.line_count;
            if lines <= threshold {
                continue;
            }

            let (severity, penalty) = if lines > threshold * 2 {
                (Severity::Critical, penalty * 2.0)
            } else {
                (Severity::Warning, penalty)
            };

            let dependents = ctx.graph.dependents(&module.path).count();
            let mut message = format!(
                "Module has {} lines (threshold: {})",
                lines, threshold
            );
            if dependents > 0 {
                message.push_str(&format!(", {} modules depend on it", dependents));
            }

            violations.push(
                Violation::new(NAME, severity, module.path.as_str(), message, penalty)
                    .with_impact("Large modules are harder to navigate, review and test.")
                    .with_suggested_fix(
                        "Split the module along its responsibilities and keep the public \
                         surface in a small facade module.",
                    ),
            );
        }

        debug!("Found {} large modules (threshold {})", violations.len(), threshold);
        Ok(violations)
    }
}
