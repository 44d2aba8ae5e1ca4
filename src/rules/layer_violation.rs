//! Layer violation rule
//!
//! Enforces a declared layered architecture. Configuration maps each layer
//! to the layers it may import directly:
//!
//! ```toml
//! [layer_rules]
//! ui = ["domain", "infrastructure"]
//! infrastructure = ["domain"]
//! domain = []
//! ```
//!
//! Permissions are not transitive: the graph holds direct imports, so a
//! layer must list every layer it actually reaches, itself included when
//! its modules import each other (`allow_same_layer = true` lifts that).
//!
//! A module in a configured layer may only import modules of its allowed
//! layers. Importing a module that belongs to no layer is a violation too,
//! unless `allow_unlayered_targets = true`. Modules outside every layer are
//! never reported as the importing side.
//!
//! A module's layer is inferred from its path. A layer name equal to a path
//! segment wins; otherwise the first layer name found as a substring of the
//! path is used. Substring inference can misclassify a path (e.g. `ui`
//! inside `build/`). That imprecision is accepted; use distinct layer
//! directory names to avoid it.

use crate::models::{Severity, Violation};
use crate::rules::base::{Rule, RuleCategory, RuleContext};
use anyhow::Result;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::debug;

const NAME: &str = "layer-violation";
const BASE_PENALTY: f64 = 10.0;

/// Layer name reported for import targets outside every configured layer
const UNLAYERED: &str = "(unlayered)";

/// Detects imports that cross declared layer permissions
#[derive(Debug, Default)]
pub struct LayerViolationRule;

impl LayerViolationRule {
    pub fn new() -> Self {
        Self
    }
}

/// Path -> layer lookup, scoped to a single `check` call
struct LayerResolver<'a> {
    layers: &'a IndexMap<String, Vec<String>>,
    cache: FxHashMap<&'a str, Option<&'a str>>,
}

impl<'a> LayerResolver<'a> {
    fn new(layers: &'a IndexMap<String, Vec<String>>) -> Self {
        Self {
            layers,
            cache: FxHashMap::default(),
        }
    }

    fn layer_of(&mut self, path: &'a str) -> Option<&'a str> {
        let layers = self.layers;
        *self
            .cache
            .entry(path)
            .or_insert_with(|| infer_layer(layers, path))
    }
}

/// Infer the layer of `path`: exact segment match first, then substring,
/// configuration order breaking ties in both passes
fn infer_layer<'a>(layers: &'a IndexMap<String, Vec<String>>, path: &str) -> Option<&'a str> {
    let segment_match = layers.keys().find(|layer| {
        path.split('/').any(|segment| {
            segment == layer.as_str()
                || segment
                    .split_once('.')
                    .is_some_and(|(stem, _)| stem == layer.as_str())
        })
    });

    segment_match
        .or_else(|| {
            layers
                .keys()
                .find(|layer| !layer.is_empty() && path.contains(layer.as_str()))
        })
        .map(String::as_str)
}

impl Rule for LayerViolationRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Detects imports that violate declared layer dependencies"
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
        let layer_rules = &ctx.config.layer_rules;
        if layer_rules.is_empty() {
            debug!("No layer rules configured, skipping");
            return Ok(vec![]);
        }

        let options = ctx.options(NAME);
        let penalty = options.penalty_or(BASE_PENALTY);
        let allow_same_layer = options.get_or("allow_same_layer", false);
        let allow_unlayered_targets = options.get_or("allow_unlayered_targets", false);

        let mut resolver = LayerResolver::new(layer_rules);
        let mut violations = Vec::new();

        for (from, to) in ctx.graph.edges() {
            let Some(from_layer) = resolver.layer_of(from) else {
                continue;
            };
            let to_layer = match resolver.layer_of(to) {
                Some(layer) => layer,
                None if allow_unlayered_targets => continue,
                None => UNLAYERED,
            };

            if allow_same_layer && from_layer == to_layer {
                continue;
            }

            let allowed = layer_rules
                .get(from_layer)
                .is_some_and(|allowed| allowed.iter().any(|l| l == to_layer));
            if allowed {
                continue;
            }

            let message = format!(
                "Layer '{}' must not depend on layer '{}' ({} imports {})",
                from_layer, to_layer, from, to
            );
            violations.push(
                Violation::new(NAME, Severity::Critical, from, message, penalty)
                    .with_related_file(to)
                    .with_impact(
                        "Imports that bypass the declared layering couple high-level \
                         policy to details and erode the architecture over time.",
                    )
                    .with_suggested_fix(format!(
                        "Route the dependency through a layer '{}' may use, introduce an \
                         interface owned by '{}', or add '{}' to its allowed layers if the \
                         dependency is intended.",
                        from_layer, from_layer, to_layer
                    )),
            );
        }

        debug!("Found {} layer violations", violations.len());
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

    fn module(path: &str, imports: &[&str]) -> SourceModule {
        SourceModule::new(path, "").with_imports(imports.iter().copied())
    }

    fn run(modules: &[SourceModule], config: &AnalysisConfig) -> Vec<Violation> {
        let graph = GraphBuilder::build(modules, Path::new("/repo"));
        let ctx = RuleContext::new(&graph, modules, config, Path::new("/repo"));
        LayerViolationRule::new().check(&ctx).unwrap()
    }

    fn ui_domain_config() -> AnalysisConfig {
        AnalysisConfig::default()
            .with_layer("ui", ["domain"])
            .with_layer("domain", Vec::<String>::new())
            .with_layer("infrastructure", Vec::<String>::new())
    }

    #[test]
    fn test_allowed_edge_has_no_violation() {
        let modules = vec![
            module("src/ui/view.ts", &["src/domain/order.ts"]),
            module("src/domain/order.ts", &[]),
        ];
        assert!(run(&modules, &ui_domain_config()).is_empty());
    }

    #[test]
    fn test_forbidden_edge_is_critical() {
        let modules = vec![
            module(
                "src/ui/view.ts",
                &["src/infrastructure/db.ts", "src/infrastructure/http.ts"],
            ),
            module("src/infrastructure/db.ts", &[]),
            module("src/infrastructure/http.ts", &[]),
        ];
        let violations = run(&modules, &ui_domain_config());

        assert_eq!(violations.len(), 2);
        for v in &violations {
            assert_eq!(v.severity, Severity::Critical);
            assert_eq!(v.file, "src/ui/view.ts");
            assert!(v.message.contains("'ui'"));
            assert!(v.message.contains("'infrastructure'"));
        }
        assert_eq!(
            violations[0].related_file.as_deref(),
            Some("src/infrastructure/db.ts")
        );
    }

    #[test]
    fn test_empty_allowed_set_forbids_outgoing() {
        let modules = vec![
            module("src/domain/order.ts", &["src/ui/view.ts"]),
            module("src/ui/view.ts", &["src/domain/order.ts"]),
        ];
        let violations = run(&modules, &ui_domain_config());

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].file, "src/domain/order.ts");
    }

    #[test]
    fn test_no_config_is_noop() {
        let modules = vec![
            module("src/ui/view.ts", &["src/infrastructure/db.ts"]),
            module("src/infrastructure/db.ts", &[]),
        ];
        assert!(run(&modules, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn test_unlayered_importer_is_exempt() {
        let modules = vec![
            module("lib/helpers.ts", &["src/ui/view.ts", "src/domain/order.ts"]),
            module("src/ui/view.ts", &[]),
            module("src/domain/order.ts", &[]),
        ];
        assert!(run(&modules, &ui_domain_config()).is_empty());
    }

    #[test]
    fn test_unlayered_target_is_forbidden() {
        let modules = vec![
            module("src/ui/view.ts", &["lib/helpers.ts"]),
            module("lib/helpers.ts", &[]),
        ];
        let violations = run(&modules, &ui_domain_config());
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("'(unlayered)'"));

        let lenient = ui_domain_config()
            .with_rule_options(NAME, json!({"allow_unlayered_targets": true}));
        assert!(run(&modules, &lenient).is_empty());
    }

    #[test]
    fn test_two_layer_config_flags_ui_to_infrastructure() {
        let config = AnalysisConfig::default()
            .with_layer("ui", ["domain"])
            .with_layer("domain", Vec::<String>::new());
        let modules = vec![
            module("ui/page.ts", &["domain/user.ts", "infrastructure/db.ts"]),
            module("domain/user.ts", &[]),
            module("infrastructure/db.ts", &[]),
        ];
        let violations = run(&modules, &config);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Critical);
        assert_eq!(violations[0].file, "ui/page.ts");
        assert_eq!(
            violations[0].related_file.as_deref(),
            Some("infrastructure/db.ts")
        );
    }

    #[test]
    fn test_same_layer_edges() {
        let modules = vec![
            module("src/domain/a.ts", &["src/domain/b.ts"]),
            module("src/domain/b.ts", &[]),
        ];
        assert_eq!(run(&modules, &ui_domain_config()).len(), 1);

        let self_listed = ui_domain_config().with_layer("domain", ["domain"]);
        assert!(run(&modules, &self_listed).is_empty());

        let lenient =
            ui_domain_config().with_rule_options(NAME, json!({"allow_same_layer": true}));
        assert!(run(&modules, &lenient).is_empty());
    }

    #[test]
    fn test_segment_match_beats_substring() {
        let layers = ui_domain_config().layer_rules;
        // "build" contains "ui" but the "domain" segment is the real layer
        assert_eq!(infer_layer(&layers, "build/domain/x.ts"), Some("domain"));
        assert_eq!(infer_layer(&layers, "src/ui.ts"), Some("ui"));
        assert_eq!(infer_layer(&layers, "src/guide/x.ts"), Some("ui"));
        assert_eq!(infer_layer(&layers, "lib/x.ts"), None);
    }
}
