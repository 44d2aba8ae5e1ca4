//! Configuration module for archscore
//!
//! This module handles:
//! - Per-rule options (`[rules.<name>]`)
//! - Declared layer permissions (`[layer_rules]`)
//! - Scoring customization
//! - Run settings (test inclusion, workers, top-N)

mod project_config;

pub use project_config::{
    load_config,
    load_project_config,
    AnalysisConfig,
    ConfigError,
    ScoringConfig,
};
