//! Rule execution engine
//!
//! The RuleEngine runs every registered rule against one `RuleContext`:
//! - Skips rules disabled through `rules.<name>.enabled = false`
//! - Runs rules on a rayon pool (or sequentially when configured)
//! - Isolates failures: errors and panics become `RuleError`s
//! - Drops violations that only cite test files, unless tests are included
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      RuleEngine                         │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Register rules (fixed catalog order)                │
//! │  2. Filter disabled rules                               │
//! │  3. Evaluate (rayon, order-preserving collect)          │
//! │  4. Fold Ok → violations, Err/panic → rule errors       │
//! └─────────────────────────────────────────────────────────┘
//! ```

use crate::models::{RuleError, Violation};
use crate::rules::base::{EvaluationSummary, Rule, RuleContext, RuleOutcome};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Folded output of one evaluation pass
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluation {
    /// In rule registration order, each rule's violations in its own order
    pub violations: Vec<Violation>,
    pub errors: Vec<RuleError>,
    pub summary: EvaluationSummary,
}

/// Orchestrates rule evaluation across all registered rules
pub struct RuleEngine {
    rules: Vec<Arc<dyn Rule>>,
    /// Number of worker threads for parallel execution
    workers: usize,
    parallel: bool,
}

impl RuleEngine {
    /// Create an empty engine
    ///
    /// # Arguments
    /// * `workers` - Number of worker threads (0 = auto-detect)
    pub fn new(workers: usize) -> Self {
        let actual_workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
                .min(16)
        } else {
            workers
        };

        Self {
            rules: Vec::new(),
            workers: actual_workers,
            parallel: true,
        }
    }

    /// Engine preloaded with the default rule catalog
    pub fn with_default_rules(workers: usize) -> Self {
        let mut engine = Self::new(workers);
        engine.register_all(crate::rules::default_rules());
        engine
    }

    /// Evaluate rules one after another on the calling thread
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        debug!("Registering rule: {}", rule.name());
        self.rules.push(rule);
    }

    pub fn register_all(&mut self, rules: impl IntoIterator<Item = Arc<dyn Rule>>) {
        for rule in rules {
            self.register(rule);
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every enabled rule and fold the outcomes.
    ///
    /// Never fails: a rule that errors or panics is recorded in
    /// `RuleEvaluation::errors` and contributes no violations.
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleEvaluation {
        let start = Instant::now();

        let active: Vec<&Arc<dyn Rule>> = self
            .rules
            .iter()
            .filter(|rule| {
                let enabled = ctx.options(rule.name()).enabled();
                if !enabled {
                    debug!("Rule {} disabled by configuration", rule.name());
                }
                enabled
            })
            .collect();

        info!(
            "Evaluating {} rules ({} registered) on {} workers",
            active.len(),
            self.rules.len(),
            if self.parallel { self.workers } else { 1 }
        );

        let outcomes = if self.parallel && active.len() > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
            {
                Ok(pool) => pool.install(|| {
                    active
                        .par_iter()
                        .map(|rule| Self::run_single_rule(rule.as_ref(), ctx))
                        .collect::<Vec<_>>()
                }),
                Err(e) => {
                    warn!("Failed to build rule thread pool ({}), running sequentially", e);
                    Self::run_sequential(&active, ctx)
                }
            }
        } else {
            Self::run_sequential(&active, ctx)
        };

        let mut evaluation = RuleEvaluation::default();
        for outcome in outcomes {
            evaluation.summary.add_outcome(&outcome);
            match outcome.result {
                Ok(violations) => evaluation.violations.extend(violations),
                Err(err) => {
                    warn!("Rule {} failed: {}", err.rule_name, err.error);
                    evaluation.errors.push(err);
                }
            }
        }
        evaluation.summary.total_duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Evaluation complete: {} violations from {}/{} rules in {:?}",
            evaluation.violations.len(),
            evaluation.summary.rules_succeeded,
            evaluation.summary.rules_run,
            start.elapsed()
        );

        evaluation
    }

    fn run_sequential(rules: &[&Arc<dyn Rule>], ctx: &RuleContext<'_>) -> Vec<RuleOutcome> {
        rules
            .iter()
            .map(|rule| Self::run_single_rule(rule.as_ref(), ctx))
            .collect()
    }

    /// Run a single rule with error handling and timing
    fn run_single_rule(rule: &dyn Rule, ctx: &RuleContext<'_>) -> RuleOutcome {
        let name = rule.name().to_string();
        let start = Instant::now();

        debug!("Running rule: {}", name);

        let check_result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| rule.check(ctx)));
        let duration = start.elapsed().as_millis() as u64;

        match check_result {
            Ok(Ok(mut violations)) => {
                let before = violations.len();
                violations.retain(|v| v.cited_files().any(|f| ctx.in_scope(f)));
                let filtered = before - violations.len();
                if filtered > 0 {
                    debug!("Filtered {} test file violations from {}", filtered, name);
                }

                debug!(
                    "Rule {} found {} violations in {}ms",
                    name,
                    violations.len(),
                    duration
                );
                RuleOutcome::success(name, violations, duration)
            }
            Ok(Err(e)) => RuleOutcome::failure(
                RuleError {
                    rule_name: name,
                    error: e.to_string(),
                    stack: format!("{:?}", e),
                },
                duration,
            ),
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!("Rule {} panicked: {}", name, panic_msg);
                RuleOutcome::failure(
                    RuleError {
                        rule_name: name,
                        error: format!("Panic: {}", panic_msg),
                        stack: panic_msg,
                    },
                    duration,
                )
            }
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::with_default_rules(0)
    }
}
