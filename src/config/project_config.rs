//! Project-level configuration support
//!
//! Loads configuration from `archscore.toml` or `.archscorerc.json` in the
//! project root. Validation of the file's shape happens here; individual
//! rules still treat their own option blocks defensively.
//!
//! # Configuration Format
//!
//! ```toml
//! # archscore.toml
//! include_tests = false
//! top_n = 10
//!
//! [rules.duplicate-code]
//! min_lines = 6
//!
//! [rules.too-many-imports]
//! enabled = false
//!
//! [layer_rules]
//! ui = ["domain", "infrastructure"]
//! infrastructure = ["domain"]
//! domain = []
//!
//! [scoring]
//! architecture_weight = 0.9
//! rule_buckets = { large-module = "architecture" }
//! ```

use crate::scoring::ScoreBucket;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported config format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),
}

/// Configuration shared by every rule and the scoring engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rule name -> free-form option object. Each rule reads its own entry
    /// and falls back to defaults when it is missing or malformed.
    pub rules: HashMap<String, serde_json::Value>,

    /// Layer name -> layers it may depend on directly. Order matters for
    /// layer inference ties.
    #[serde(alias = "layerRules")]
    pub layer_rules: IndexMap<String, Vec<String>>,

    /// Report violations in test files (default: false)
    pub include_tests: bool,

    /// Number of violations kept in `top_risks`
    pub top_n: usize,

    /// Rule worker threads (0 = auto-detect)
    pub workers: usize,

    /// Evaluate rules on a thread pool (default: true)
    pub parallel: bool,

    pub scoring: ScoringConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
            layer_rules: IndexMap::new(),
            include_tests: false,
            top_n: 10,
            workers: 0,
            parallel: true,
            scoring: ScoringConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Raw option block for a rule
    pub fn rule_options(&self, rule_name: &str) -> Option<&serde_json::Value> {
        self.rules.get(rule_name)
    }

    /// Set a rule's option block
    pub fn with_rule_options(
        mut self,
        rule_name: impl Into<String>,
        options: serde_json::Value,
    ) -> Self {
        self.rules.insert(rule_name.into(), options);
        self
    }

    /// Declare a layer and the layers it may depend on
    pub fn with_layer<I, S>(mut self, layer: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layer_rules
            .insert(layer.into(), allowed.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_include_tests(mut self, include: bool) -> Self {
        self.include_tests = include;
        self
    }
}

/// Scoring configuration for the weighted mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of the architecture score in the overall score (default: 0.9)
    pub architecture_weight: f64,

    /// Lines per normalization unit (default: 1000, i.e. penalty per kLOC)
    pub loc_unit: f64,

    /// Smallest divisor applied to penalties, so tiny projects are not
    /// amplified (default: 1.0)
    pub min_kloc: f64,

    /// Per-rule overrides of the architecture/hygiene classification
    pub rule_buckets: HashMap<String, ScoreBucket>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            architecture_weight: default_architecture_weight(),
            loc_unit: default_loc_unit(),
            min_kloc: default_min_kloc(),
            rule_buckets: HashMap::new(),
        }
    }
}

fn default_architecture_weight() -> f64 {
    0.9
}
fn default_loc_unit() -> f64 {
    1000.0
}
fn default_min_kloc() -> f64 {
    1.0
}

impl ScoringConfig {
    /// Architecture weight, or the default when outside [0, 1]
    pub fn effective_architecture_weight(&self) -> f64 {
        let w = self.architecture_weight;
        if w.is_finite() && (0.0..=1.0).contains(&w) {
            w
        } else {
            warn!("Invalid scoring.architecture_weight {}, using default", w);
            default_architecture_weight()
        }
    }

    /// LOC unit, or the default when not positive
    pub fn effective_loc_unit(&self) -> f64 {
        if self.loc_unit.is_finite() && self.loc_unit > 0.0 {
            self.loc_unit
        } else {
            warn!("Invalid scoring.loc_unit {}, using default", self.loc_unit);
            default_loc_unit()
        }
    }

    /// Minimum divisor, or the default when not positive
    pub fn effective_min_kloc(&self) -> f64 {
        if self.min_kloc.is_finite() && self.min_kloc > 0.0 {
            self.min_kloc
        } else {
            warn!("Invalid scoring.min_kloc {}, using default", self.min_kloc);
            default_min_kloc()
        }
    }
}

/// Load project configuration from the project root.
///
/// Searches for configuration files in this order:
/// 1. `archscore.toml`
/// 2. `.archscorerc.json`
///
/// Returns default configuration if no file is found or a file fails to
/// load.
pub fn load_project_config(root: &Path) -> AnalysisConfig {
    for name in ["archscore.toml", ".archscorerc.json"] {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        match load_config(&path) {
            Ok(config) => {
                debug!("Loaded project config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    AnalysisConfig::default()
}

/// Load configuration from an explicit TOML or JSON file
pub fn load_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        }),
        Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}
