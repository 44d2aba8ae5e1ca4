//! Source model abstraction consumed by the analysis core.
//!
//! Parsing and import resolution happen upstream. The core only needs, per
//! module, its normalized path, the import targets that were resolved, the
//! raw text and the line count. A `SourceModel` hands those over; the graph
//! builder and rules never touch the filesystem themselves.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a serialized source model
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read module manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid module manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One analyzed source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceModule {
    /// Project-relative path, `/`-separated
    pub path: String,
    #[serde(default)]
    pub absolute_path: PathBuf,
    /// Resolved import targets. Targets outside the project are allowed and
    /// ignored by the graph builder.
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub text: String,
    /// End line number of the file
    #[serde(default)]
    pub line_count: usize,
}

impl SourceModule {
    /// Build a module from its text; line count is taken from the text
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        let path = normalize_path(&path.into());
        let text = text.into();
        Self {
            absolute_path: PathBuf::from(&path),
            line_count: text.lines().count(),
            path,
            imports: Vec::new(),
            text,
        }
    }

    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports = imports.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_line_count(mut self, line_count: usize) -> Self {
        self.line_count = line_count;
        self
    }

    pub fn with_absolute_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.absolute_path = path.into();
        self
    }

    pub fn is_test(&self) -> bool {
        is_test_file(&self.path)
    }
}

/// Supplier of the module list for one analysis run.
///
/// Implementations must be `Send + Sync` so the module slice can be shared
/// across rayon's parallel rule execution.
pub trait SourceModel: Send + Sync {
    /// Modules in a stable order, vendor/build output already excluded
    fn modules(&self) -> &[SourceModule];

    /// The project root the module paths are relative to
    fn root_path(&self) -> &Path;
}

/// Source model over an already-collected module list
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    modules: Vec<SourceModule>,
    root_path: PathBuf,
}

impl InMemorySource {
    pub fn new(modules: Vec<SourceModule>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            modules,
            root_path: root_path.into(),
        }
    }
}

impl SourceModel for InMemorySource {
    fn modules(&self) -> &[SourceModule] {
        &self.modules
    }

    fn root_path(&self) -> &Path {
        &self.root_path
    }
}

/// Serialized form written by an upstream parser
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub root: PathBuf,
    #[serde(default)]
    pub modules: Vec<SourceModule>,
}

/// Source model loaded from a JSON manifest on disk
#[derive(Debug, Clone)]
pub struct ManifestSource {
    inner: InMemorySource,
}

impl ManifestSource {
    /// Load a manifest. A manifest without `root` uses its own directory.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|source| SourceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let root = if manifest.root.as_os_str().is_empty() {
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        } else {
            manifest.root
        };

        let modules: Vec<SourceModule> = manifest
            .modules
            .into_iter()
            .map(|mut m| {
                m.path = normalize_path(&m.path);
                if m.line_count == 0 {
                    m.line_count = m.text.lines().count();
                }
                m
            })
            .collect();

        debug!(
            "Loaded {} modules from manifest {}",
            modules.len(),
            path.display()
        );

        Ok(Self {
            inner: InMemorySource::new(modules, root),
        })
    }
}

impl SourceModel for ManifestSource {
    fn modules(&self) -> &[SourceModule] {
        self.inner.modules()
    }

    fn root_path(&self) -> &Path {
        self.inner.root_path()
    }
}

/// Normalize a project-relative path: `/` separators, no leading `./`
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut trimmed = unified.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.to_string()
}

/// Check if a path looks like a test file
pub fn is_test_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.contains("/test/")
        || lower.contains("/tests/")
        || lower.contains("/__tests__/")
        || lower.contains("/spec/")
        || lower.starts_with("test/")
        || lower.starts_with("tests/")
        || lower.starts_with("__tests__/")
        || lower.ends_with("_test.go")
        || lower.ends_with("_test.py")
        || lower.ends_with("_test.rs")
        || lower.ends_with(".test.ts")
        || lower.ends_with(".test.tsx")
        || lower.ends_with(".test.js")
        || lower.ends_with(".spec.ts")
        || lower.ends_with(".spec.js")
        || lower.rsplit('/').next().is_some_and(|name| name.starts_with("test_"))
}
