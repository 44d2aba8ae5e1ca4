//! Too Many Dependents Rule
//!
//! Flags modules with excessive fan-in: more than `max_dependents` (default
//! 20) modules import them. Such hubs make every change risky. The cited
//! `related_file` is the first dependent in path order.

use crate::models::{Severity, Violation};
use crate::rules::base::{Rule, RuleCategory, RuleContext};
use anyhow::Result;
use tracing::debug;

const NAME: &str = "too-many-dependents";
const BASE_PENALTY: f64 = 2.0;
const DEFAULT_MAX_DEPENDENTS: usize = 20;

#[derive(Debug, Default)]
pub struct TooManyDependentsRule;

impl TooManyDependentsRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for TooManyDependentsRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Detects modules that too many other modules depend on"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn base_penalty(&self) -> f64 {
        BASE_PENALTY
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Coupling
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>> {
        let options = ctx.options(NAME);
        let max_dependents = options.get_or("max_dependents", DEFAULT_MAX_DEPENDENTS);
        let penalty = options.penalty_or(BASE_PENALTY);

        let mut violations = Vec::new();
        for module in ctx.modules() {
            let mut dependents = ctx.graph.dependents(&module.path).peekable();
            let first = dependents.peek().copied();
            let fan_in = dependents.count();
            if fan_in <= max_dependents {
                continue;
            }

            let mut violation = Violation::new(
                NAME,
                Severity::Warning,
                module.path.as_str(),
                format!("Module is imported by {} modules (max: {})", fan_in, max_dependents),
                penalty,
            )
            .with_impact("Changes to a heavily depended-on module ripple through the codebase.")
            .with_suggested_fix(
                "Keep this module's interface small and stable, or split it so dependents \
                 only import the part they use.",
            );
            if let Some(first) = first {
                violation = violation.with_related_file(first);
            }
            violations.push(violation);
        }

        debug!("Found {} modules over the dependents limit", violations.len());
        Ok(violations)
    }
}
