//! Circular dependency rule
//!
//! Reports each cyclic group of the dependency graph. The groups are the
//! strongly connected components (size > 1) computed by Tarjan's algorithm
//! when the graph was built, so this rule is a projection of the graph:
//! one violation per group, never one per edge.

use crate::models::{Severity, Violation};
use crate::rules::base::{Rule, RuleCategory, RuleContext};
use crate::rules::truncated_list;
use anyhow::Result;
use tracing::debug;

const NAME: &str = "circular-dependency";
const BASE_PENALTY: f64 = 15.0;

/// Detects circular dependencies in the import graph
#[derive(Debug, Default)]
pub struct CircularDependencyRule;

impl CircularDependencyRule {
    pub fn new() -> Self {
        Self
    }

    /// Generate fix suggestion based on group size
    fn suggest_fix(group_size: usize) -> &'static str {
        if group_size >= 5 {
            "Large dependency cycle. Extract shared interfaces or types into a \
             separate module, invert the dependency that points back up, and give \
             the modules a clear one-way dependency direction."
        } else {
            "Small dependency cycle. Merge the modules if they are one concept, \
             or move the shared code into a third module both can import."
        }
    }
}

impl Rule for CircularDependencyRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Detects circular dependencies between modules using SCC analysis"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn base_penalty(&self) -> f64 {
        BASE_PENALTY
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::CoreArchitecture
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>> {
        let penalty = ctx.options(NAME).penalty_or(BASE_PENALTY);
        let groups = ctx.graph.cyclic_groups();
        debug!("Checking {} cyclic groups", groups.len());

        let violations = groups
            .iter()
            .filter_map(|group| {
                // Sorted set: the representative is the same every run. Prefer
                // modules the run is scoped to, so test files are only named
                // when the cycle leaves no alternative.
                let members: Vec<&str> = group.iter().map(String::as_str).collect();
                let file = members
                    .iter()
                    .copied()
                    .find(|m| ctx.in_scope(m))
                    .or_else(|| members.first().copied())?;
                let others = || members.iter().copied().filter(move |&m| m != file);
                let related = others()
                    .find(|m| ctx.in_scope(m))
                    .or_else(|| others().next())?;

                let message = format!(
                    "Circular dependency between {} modules: {}",
                    members.len(),
                    truncated_list(&members[..])
                );

                Some(
                    Violation::new(NAME, Severity::Critical, file, message, penalty)
                        .with_related_file(related)
                        .with_impact(
                            "Modules in a cycle cannot be understood, tested or changed in \
                             isolation, and import order becomes fragile.",
                        )
                        .with_suggested_fix(Self::suggest_fix(members.len())),
                )
            })
            .collect();

        Ok(violations)
    }
}
