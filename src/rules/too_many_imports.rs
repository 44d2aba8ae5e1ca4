//! Too Many Imports Rule
//!
//! Flags modules with excessive fan-out: more than `max_imports` (default
//! 15) resolved in-project dependencies. External imports never reach the
//! graph and are not counted.

use crate::models::{Severity, Violation};
use crate::rules::base::{Rule, RuleCategory, RuleContext};
use anyhow::Result;
use tracing::debug;

const NAME: &str = "too-many-imports";
const BASE_PENALTY: f64 = 2.0;
const DEFAULT_MAX_IMPORTS: usize = 15;

#[derive(Debug, Default)]
pub struct TooManyImportsRule;

impl TooManyImportsRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for TooManyImportsRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Detects modules that depend on too many other modules"
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
        let max_imports = options.get_or("max_imports", DEFAULT_MAX_IMPORTS);
        let penalty = options.penalty_or(BASE_PENALTY);

        let mut violations = Vec::new();
        for module in ctx.modules() {
            let fan_out = ctx.graph.dependencies(&module.path).count();
            if fan_out <= max_imports {
                continue;
            }

            violations.push(
                Violation::new(
                    NAME,
                    Severity::Warning,
                    module.path.as_str(),
                    format!("Module imports {} modules (max: {})", fan_out, max_imports),
                    penalty,
                )
                .with_impact(
                    "A module that knows about many others breaks whenever any of them \
                     changes.",
                )
                .with_suggested_fix(
                    "Split the module by responsibility or depend on a narrower facade \
                     instead of many individual modules.",
                ),
            );
        }

        debug!("Found {} modules over the import limit", violations.len());
        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::graph::GraphBuilder;
    use crate::source::SourceModule;
    use serde_json::json;
    use std::path::Path;

    /// `hub.rs` importing `n` leaf modules plus one external package
    fn hub_with(n: usize) -> Vec<SourceModule> {
        let leaves: Vec<String> = (0..n).map(|i| format!("src/leaf{}.rs", i)).collect();
        let mut imports = leaves.clone();
        imports.push("serde".to_string());

        let mut modules = vec![SourceModule::new("src/hub.rs", "").with_imports(imports)];
        modules.extend(leaves.iter().map(|l| SourceModule::new(l.as_str(), "")));
        modules
    }

    fn run(modules: &[SourceModule], config: &AnalysisConfig) -> Vec<Violation> {
        let graph = GraphBuilder::build(modules, Path::new("/repo"));
        let ctx = RuleContext::new(&graph, modules, config, Path::new("/repo"));
        TooManyImportsRule::new().check(&ctx).unwrap()
    }

    #[test]
    fn test_at_limit_is_fine() {
        assert!(run(&hub_with(15), &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn test_over_limit() {
        let violations = run(&hub_with(16), &AnalysisConfig::default());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].file, "src/hub.rs");
        assert!(violations[0].message.contains("16 modules"));
    }

    #[test]
    fn test_configured_limit() {
        let config = AnalysisConfig::default().with_rule_options(NAME, json!({"max_imports": 3}));
        assert_eq!(run(&hub_with(4), &config).len(), 1);
    }
}
