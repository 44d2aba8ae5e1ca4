//! Architecture and hygiene rules
//!
//! This module provides the rule framework and the built-in rule catalog.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        RuleEngine                           │
//! │  - Registers rules in catalog order                         │
//! │  - Evaluates them against one RuleContext (rayon)           │
//! │  - Turns errors/panics into RuleErrors                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Rule Trait                          │
//! │  - name() / severity() / base_penalty()                     │
//! │  - check(ctx): read graph + modules + config, return        │
//! │    violations                                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Catalog
//!
//! ## Core architecture
//! - `CircularDependencyRule` - cyclic groups in the import graph
//! - `LayerViolationRule` - edges crossing declared layer permissions
//!
//! ## Coupling
//! - `TooManyImportsRule` - excessive fan-out
//! - `TooManyDependentsRule` - excessive fan-in
//!
//! ## Design
//! - `LargeModuleRule` - oversized modules
//!
//! ## Code health
//! - `DuplicateCodeRule` - blocks replicated across files
//!
//! Simple per-file pattern rules live outside this crate; they implement
//! the same `Rule` trait and are registered with `RuleEngine::register`.

mod base;
mod engine;

mod circular_dependency;
mod layer_violation;

mod too_many_dependents;
mod too_many_imports;

mod large_module;

mod duplicate_code;

pub use base::{EvaluationSummary, Rule, RuleCategory, RuleContext, RuleOptions, RuleOutcome};
pub use engine::{RuleEngine, RuleEvaluation};

pub use circular_dependency::CircularDependencyRule;
pub use duplicate_code::DuplicateCodeRule;
pub use large_module::LargeModuleRule;
pub use layer_violation::LayerViolationRule;
pub use too_many_dependents::TooManyDependentsRule;
pub use too_many_imports::TooManyImportsRule;

use std::sync::Arc;

/// The built-in catalog, in evaluation order.
///
/// Order only affects how violations of equal priority are sequenced.
pub fn default_rules() -> Vec<Arc<dyn Rule>> {
    let mut rules: Vec<Arc<dyn Rule>> = vec![
        Arc::new(CircularDependencyRule::new()),
        Arc::new(LayerViolationRule::new()),
        Arc::new(TooManyImportsRule::new()),
        Arc::new(TooManyDependentsRule::new()),
        Arc::new(LargeModuleRule::new()),
        Arc::new(DuplicateCodeRule::new()),
    ];
    // Stable sort keeps the listing order within a category
    rules.sort_by_key(|r| r.category());
    rules
}

/// Format up to three names and a `+N more` suffix
pub(crate) fn truncated_list<S: AsRef<str>>(items: &[S]) -> String {
    const SHOWN: usize = 3;
    let mut out = items
        .iter()
        .take(SHOWN)
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > SHOWN {
        out.push_str(&format!(" +{} more", items.len() - SHOWN));
    }
    out
}
