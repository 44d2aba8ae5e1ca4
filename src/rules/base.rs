//! Base rule trait and types
//!
//! This module defines the core abstractions for rule evaluation:
//! - `Rule` trait that every rule implements
//! - `RuleContext`, the read-only bundle shared by all rules in a run
//! - `RuleOptions` for defensive access to per-rule configuration
//! - `RuleOutcome` / `EvaluationSummary` for capturing execution results

use crate::config::AnalysisConfig;
use crate::graph::DependencyGraph;
use crate::models::{RuleError, Severity, Violation};
use crate::source::{is_test_file, SourceModule};
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Conceptual grouping of rules. Registration follows this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleCategory {
    CoreArchitecture,
    Coupling,
    Design,
    CodeHealth,
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleCategory::CoreArchitecture => write!(f, "architecture"),
            RuleCategory::Coupling => write!(f, "coupling"),
            RuleCategory::Design => write!(f, "design"),
            RuleCategory::CodeHealth => write!(f, "code-health"),
        }
    }
}

/// Read-only inputs shared by every rule in one analysis run.
///
/// Built once after the graph is complete; rules borrow it and never
/// mutate anything reachable from it.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub graph: &'a DependencyGraph,
    modules: &'a [SourceModule],
    pub config: &'a AnalysisConfig,
    pub root_path: &'a Path,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        graph: &'a DependencyGraph,
        modules: &'a [SourceModule],
        config: &'a AnalysisConfig,
        root_path: &'a Path,
    ) -> Self {
        Self {
            graph,
            modules,
            config,
            root_path,
        }
    }

    /// Modules in scope for content rules. Test files are hidden unless
    /// `include_tests` is set.
    pub fn modules(&self) -> impl Iterator<Item = &'a SourceModule> + 'a {
        let include_tests = self.config.include_tests;
        self.modules
            .iter()
            .filter(move |m| include_tests || !is_test_file(&m.path))
    }

    /// Every module handed to the run, test files included
    pub fn all_modules(&self) -> &'a [SourceModule] {
        self.modules
    }

    /// Whether violations on `path` should be reported
    pub fn in_scope(&self, path: &str) -> bool {
        self.config.include_tests || !is_test_file(path)
    }

    /// Options block for `rule_name`
    pub fn options(&self, rule_name: &'a str) -> RuleOptions<'a> {
        RuleOptions::new(rule_name, self.config.rule_options(rule_name))
    }
}

/// Defensive view over one rule's configuration.
///
/// Missing blocks, non-object blocks and wrongly typed values all read as
/// "not set", so callers always end up on their defaults.
#[derive(Debug, Clone, Copy)]
pub struct RuleOptions<'a> {
    rule_name: &'a str,
    value: Option<&'a serde_json::Map<String, serde_json::Value>>,
}

impl<'a> RuleOptions<'a> {
    pub fn new(rule_name: &'a str, raw: Option<&'a serde_json::Value>) -> Self {
        let value = match raw {
            Some(serde_json::Value::Object(map)) => Some(map),
            Some(other) => {
                debug!(
                    "Ignoring non-object options for rule {}: {}",
                    rule_name, other
                );
                None
            }
            None => None,
        };
        Self { rule_name, value }
    }

    /// Get a typed option value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.value?.get(key)?;
        match serde_json::from_value(raw.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(
                    "Ignoring malformed option {}.{} ({}), using default",
                    self.rule_name, key, e
                );
                None
            }
        }
    }

    /// Get an option with a default value
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// `enabled` flag (default: true)
    pub fn enabled(&self) -> bool {
        self.get_or("enabled", true)
    }

    /// `penalty` override, ignored unless finite and non-negative
    pub fn penalty_or(&self, base: f64) -> f64 {
        match self.get::<f64>("penalty") {
            Some(p) if p.is_finite() && p >= 0.0 => p,
            _ => base,
        }
    }
}

/// Trait for all architecture and hygiene rules
///
/// # Example Implementation
///
/// ```ignore
/// pub struct MyRule;
///
/// impl Rule for MyRule {
///     fn name(&self) -> &'static str { "my-rule" }
///     fn description(&self) -> &'static str { "Flags my specific smell" }
///     fn severity(&self) -> Severity { Severity::Warning }
///     fn base_penalty(&self) -> f64 { 2.0 }
///
///     fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Unique kebab-case identifier, also the key under `rules` in config
    fn name(&self) -> &'static str;

    /// Human-readable description of what this rule finds
    fn description(&self) -> &'static str;

    /// Default severity of this rule's violations
    fn severity(&self) -> Severity;

    /// Penalty of one violation before any per-rule override
    fn base_penalty(&self) -> f64;

    fn category(&self) -> RuleCategory {
        RuleCategory::CodeHealth
    }

    /// Evaluate the rule against the shared context.
    ///
    /// Errors (and panics) are isolated by the engine: they are recorded as
    /// a [`RuleError`] and never stop other rules.
    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>>;
}

/// Result from running a single rule
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub rule_name: String,
    pub result: std::result::Result<Vec<Violation>, RuleError>,
    pub duration_ms: u64,
}

impl RuleOutcome {
    pub fn success(rule_name: String, violations: Vec<Violation>, duration_ms: u64) -> Self {
        Self {
            rule_name,
            result: Ok(violations),
            duration_ms,
        }
    }

    pub fn failure(error: RuleError, duration_ms: u64) -> Self {
        Self {
            rule_name: error.rule_name.clone(),
            result: Err(error),
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary statistics from running all rules
#[derive(Debug, Clone, Default)]
pub struct EvaluationSummary {
    pub rules_run: usize,
    pub rules_succeeded: usize,
    pub rules_failed: usize,
    pub total_violations: usize,
    pub by_severity: HashMap<Severity, usize>,
    pub total_duration_ms: u64,
}

impl EvaluationSummary {
    /// Update summary with a rule outcome
    pub fn add_outcome(&mut self, outcome: &RuleOutcome) {
        self.rules_run += 1;
        self.total_duration_ms += outcome.duration_ms;

        match &outcome.result {
            Ok(violations) => {
                self.rules_succeeded += 1;
                self.total_violations += violations.len();
                for v in violations {
                    *self.by_severity.entry(v.severity).or_insert(0) += 1;
                }
            }
            Err(_) => self.rules_failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_options_typed_access() {
        let raw = json!({"min_lines": 7, "enabled": false, "penalty": 2.5});
        let opts = RuleOptions::new("duplicate-code", Some(&raw));

        assert_eq!(opts.get::<usize>("min_lines"), Some(7));
        assert_eq!(opts.get_or("missing", 5usize), 5);
        assert!(!opts.enabled());
        assert_eq!(opts.penalty_or(1.0), 2.5);
    }

    #[test]
    fn test_rule_options_malformed_values_fall_back() {
        let raw = json!({"min_lines": "lots", "enabled": "yes", "penalty": -4});
        let opts = RuleOptions::new("duplicate-code", Some(&raw));

        assert_eq!(opts.get_or("min_lines", 5usize), 5);
        assert!(opts.enabled());
        assert_eq!(opts.penalty_or(3.0), 3.0);
    }

    #[test]
    fn test_rule_options_non_object_block() {
        let raw = json!([1, 2, 3]);
        let opts = RuleOptions::new("layer-violation", Some(&raw));
        assert!(opts.enabled());
        assert_eq!(opts.get::<bool>("allow_same_layer"), None);

        let missing = RuleOptions::new("layer-violation", None);
        assert_eq!(missing.get_or("allow_same_layer", true), true);
    }

    #[test]
    fn test_context_hides_test_modules() {
        let graph = DependencyGraph::default();
        let modules = vec![
            SourceModule::new("src/a.ts", ""),
            SourceModule::new("src/__tests__/a.ts", ""),
        ];
        let config = AnalysisConfig::default();
        let ctx = RuleContext::new(&graph, &modules, &config, Path::new("/repo"));

        assert_eq!(ctx.modules().count(), 1);
        assert_eq!(ctx.all_modules().len(), 2);
        assert!(!ctx.in_scope("src/__tests__/a.ts"));

        let with_tests = AnalysisConfig::default().with_include_tests(true);
        let ctx = RuleContext::new(&graph, &modules, &with_tests, Path::new("/repo"));
        assert_eq!(ctx.modules().count(), 2);
    }

    #[test]
    fn test_evaluation_summary() {
        let mut summary = EvaluationSummary::default();
        let ok = RuleOutcome::success(
            "r1".to_string(),
            vec![Violation::new("r1", Severity::Warning, "a", "m", 1.0)],
            10,
        );
        let failed = RuleOutcome::failure(
            RuleError {
                rule_name: "r2".to_string(),
                error: "boom".to_string(),
                stack: "boom".to_string(),
            },
            5,
        );
        summary.add_outcome(&ok);
        summary.add_outcome(&failed);

        assert_eq!(summary.rules_run, 2);
        assert_eq!(summary.rules_succeeded, 1);
        assert_eq!(summary.rules_failed, 1);
        assert_eq!(summary.total_violations, 1);
        assert_eq!(summary.by_severity.get(&Severity::Warning), Some(&1));
        assert_eq!(summary.total_duration_ms, 15);
    }
}
