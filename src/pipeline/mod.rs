//! Analysis pipeline
//!
//! Orchestrates one full analysis run:
//! 1. Build the dependency graph from the source model
//! 2. Build the shared `RuleContext`
//! 3. Evaluate every rule (failures isolated)
//! 4. Score the violation set
//! 5. Rank the top risks and assemble the `AnalysisResult`
//!
//! A run never fails. Rule failures end up in `AnalysisResult::rule_errors`.

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::graph::GraphBuilder;
use crate::models::AnalysisResult;
use crate::ranking;
use crate::rules::{Rule, RuleContext, RuleEngine};
use crate::scoring::ScoreCalculator;
use crate::source::{normalize_path, SourceModel, SourceModule};

/// Full analysis pipeline.
pub struct Analyzer {
    config: AnalysisConfig,
    engine: RuleEngine,
}

impl Analyzer {
    /// Analyzer with the default rule catalog, parallelism taken from config
    pub fn new(config: AnalysisConfig) -> Self {
        let engine = RuleEngine::with_default_rules(config.workers).with_parallel(config.parallel);
        Self { config, engine }
    }

    /// Analyzer with a caller-assembled engine
    pub fn with_engine(config: AnalysisConfig, engine: RuleEngine) -> Self {
        Self { config, engine }
    }

    /// Add a rule after the built-in catalog
    pub fn register_rule(&mut self, rule: Arc<dyn Rule>) {
        self.engine.register(rule);
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Run the pipeline over a source model.
    pub fn analyze(&self, source: &dyn SourceModel) -> AnalysisResult {
        self.analyze_modules(source.modules(), source.root_path())
    }

    /// Run the pipeline over an explicit module list.
    ///
    /// # Arguments
    /// * `modules` - Modules of the project, in a stable order
    /// * `root` - Project root the module paths are relative to
    pub fn analyze_modules(&self, modules: &[SourceModule], root: &Path) -> AnalysisResult {
        let start = Instant::now();
        info!("Analyzing {} modules under {}", modules.len(), root.display());

        let modules = normalized_modules(modules);
        let modules: &[SourceModule] = &modules;

        let graph = GraphBuilder::build(modules, root);
        debug!(
            "Graph: {} nodes, {} edges, {} cyclic groups",
            graph.node_count(),
            graph.edge_count(),
            graph.cyclic_groups().len()
        );

        let ctx = RuleContext::new(&graph, modules, &self.config, root);
        let evaluation = self.engine.evaluate(&ctx);

        // Only modules the rules looked at count towards size and health
        let total_loc: usize = ctx.modules().map(|m| m.line_count).sum();
        let total_modules = graph.paths().filter(|p| ctx.in_scope(p)).count();

        let score = ScoreCalculator::new(&self.config.scoring).calculate(
            &evaluation.violations,
            total_loc,
            total_modules,
        );

        let cited: HashSet<&str> = evaluation
            .violations
            .iter()
            .flat_map(|v| v.cited_files())
            .collect();
        let healthy_modules = graph
            .paths()
            .filter(|p| ctx.in_scope(p) && !cited.contains(p))
            .count();

        let counts = ranking::count_by_severity(&evaluation.violations);
        let top_risks = ranking::rank(&evaluation.violations, self.config.top_n);

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Analysis complete: score {:.0} ({}), {} violations, {} rule errors in {}ms",
            score.score,
            score.status,
            evaluation.violations.len(),
            evaluation.errors.len(),
            duration_ms
        );

        AnalysisResult {
            violations: evaluation.violations,
            score: score.score,
            architecture_score: score.architecture_score,
            hygiene_score: score.hygiene_score,
            status: score.status,
            scoring_mode: score.mode,
            counts,
            healthy_modules,
            total_modules,
            top_risks,
            total_loc,
            rule_errors: evaluation.errors,
            duration_ms,
        }
    }
}

/// Modules with normalized paths. Borrows when nothing needs rewriting.
fn normalized_modules(modules: &[SourceModule]) -> Cow<'_, [SourceModule]> {
    if modules.iter().all(|m| normalize_path(&m.path) == m.path) {
        return Cow::Borrowed(modules);
    }
    Cow::Owned(
        modules
            .iter()
            .map(|m| SourceModule {
                path: normalize_path(&m.path),
                ..m.clone()
            })
            .collect(),
    )
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HealthStatus, ScoringMode, Severity};
    use crate::source::InMemorySource;

    fn module(path: &str, imports: &[&str], lines: usize) -> SourceModule {
        SourceModule::new(path, "")
            .with_imports(imports.iter().copied())
            .with_line_count(lines)
    }

    #[test]
    fn test_empty_project() {
        let result = Analyzer::default().analyze_modules(&[], Path::new("/repo"));
        assert!(result.violations.is_empty());
        assert_eq!(result.score, 100.0);
        assert_eq!(result.status, HealthStatus::Excellent);
        assert_eq!(result.total_modules, 0);
        assert_eq!(result.scoring_mode, ScoringMode::Legacy);
    }

    #[test]
    fn test_healthy_modules_exclude_cited_files() {
        let source = InMemorySource::new(
            vec![
                module("src/a.ts", &["src/b.ts"], 100),
                module("src/b.ts", &["src/a.ts"], 100),
                module("src/c.ts", &["src/a.ts"], 100),
            ],
            "/repo",
        );
        let result = Analyzer::default().analyze(&source);

        assert_eq!(result.total_modules, 3);
        assert_eq!(result.total_loc, 300);
        assert_eq!(result.healthy_modules, 1);
        assert_eq!(result.counts.critical, 1);
        assert_eq!(result.top_risks[0].severity, Severity::Critical);
    }

    #[test]
    fn test_unnormalized_paths_are_normalized() {
        let modules = vec![
            SourceModule {
                path: "./src\\hub.ts".to_string(),
                imports: vec!["src/a.ts".to_string(), "src/b.ts".to_string()],
                ..SourceModule::default()
            },
            module("src/a.ts", &[], 10),
            module("src/b.ts", &[], 10),
        ];
        let config = AnalysisConfig::default()
            .with_rule_options("too-many-imports", serde_json::json!({"max_imports": 1}));
        let result = Analyzer::new(config).analyze_modules(&modules, Path::new("/repo"));

        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].rule, "too-many-imports");
        assert_eq!(result.violations[0].file, "src/hub.ts");
    }

    #[test]
    fn test_top_n_limits_ranking_not_counts() {
        let modules: Vec<SourceModule> = (0..6)
            .map(|i| module(&format!("src/m{}.ts", i), &[], 900))
            .collect();
        let config = AnalysisConfig {
            top_n: 2,
            ..AnalysisConfig::default()
        };
        let result = Analyzer::new(config).analyze_modules(&modules, Path::new("/repo"));

        assert_eq!(result.counts.warning, 6);
        assert_eq!(result.top_risks.len(), 2);
        assert_eq!(result.violations.len(), 6);
    }
}
