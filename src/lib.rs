//! archscore - structural health analysis
//!
//! Builds a module dependency graph, evaluates architecture and hygiene
//! rules against it and condenses the result into a weighted health score
//! and a ranked list of risks.
//!
//! ```no_run
//! use archscore::config::AnalysisConfig;
//! use archscore::pipeline::Analyzer;
//! use archscore::source::{InMemorySource, SourceModule};
//!
//! let source = InMemorySource::new(
//!     vec![
//!         SourceModule::new("src/a.ts", "").with_imports(["src/b.ts"]),
//!         SourceModule::new("src/b.ts", "").with_imports(["src/a.ts"]),
//!     ],
//!     "/repo",
//! );
//! let result = Analyzer::new(AnalysisConfig::default()).analyze(&source);
//! println!("{} ({})", result.score, result.status);
//! ```

pub mod config;
pub mod graph;
pub mod models;
pub mod pipeline;
pub mod ranking;
pub mod rules;
pub mod scoring;
pub mod source;

pub use config::AnalysisConfig;
pub use models::{AnalysisResult, HealthStatus, RuleError, Severity, Violation};
pub use pipeline::Analyzer;
pub use source::{SourceModel, SourceModule};
