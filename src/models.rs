//! Core data models for archscore
//!
//! These models are shared by the rules, the scoring engine and the
//! result assembly: violations, severities, rule errors and the final
//! analysis result handed to the reporting layer.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Generate a deterministic violation ID based on content hash.
///
/// The same rule reporting the same message at the same location gets the
/// same ID on every run, so reports can be diffed and violations suppressed
/// by ID.
pub fn deterministic_violation_id(rule: &str, file: &str, line: u32, message: &str) -> String {
    let input = format!("{rule}\n{file}\n{line}\n{message}");
    let digest = Sha256::digest(input.as_bytes());
    digest
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Severity levels for violations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// One reported defect instance.
///
/// Violations are immutable values: a rule builds them with
/// [`Violation::new`] and the builder-style setters, then hands them to the
/// engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_file: Option<String>,
    /// 1 when the violation is not tied to specific file content
    pub line: u32,
    pub impact: String,
    pub suggested_fix: String,
    /// Score deduction, finite and non-negative
    pub penalty: f64,
}

impl Violation {
    pub fn new(
        rule: &str,
        severity: Severity,
        file: impl Into<String>,
        message: impl Into<String>,
        penalty: f64,
    ) -> Self {
        let file = file.into();
        let message = message.into();
        Self {
            id: deterministic_violation_id(rule, &file, 1, &message),
            rule: rule.to_string(),
            severity,
            message,
            file,
            related_file: None,
            line: 1,
            impact: String::new(),
            suggested_fix: String::new(),
            penalty: sanitize_penalty(penalty),
        }
    }

    pub fn with_related_file(mut self, related: impl Into<String>) -> Self {
        self.related_file = Some(related.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = line.max(1);
        self.id = deterministic_violation_id(&self.rule, &self.file, self.line, &self.message);
        self
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = impact.into();
        self
    }

    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = fix.into();
        self
    }

    /// Files this violation points at (`file` plus `related_file`)
    pub fn cited_files(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.file.as_str()).chain(self.related_file.as_deref())
    }
}

/// Clamp NaN, infinities and negatives to zero
pub(crate) fn sanitize_penalty(penalty: f64) -> f64 {
    if penalty.is_finite() && penalty > 0.0 {
        penalty
    } else {
        0.0
    }
}

/// A rule whose `check` failed or panicked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleError {
    pub rule_name: String,
    pub error: String,
    /// Full error chain or panic payload, for diagnostics
    pub stack: String,
}

/// Tally of violations by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.critical + self.warning + self.info
    }
}

/// Qualitative health band derived from the architecture score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Critical,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
    Healthy,
    Excellent,
}

impl HealthStatus {
    /// Map a 0-100 score onto its status band
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => HealthStatus::Excellent,
            s if s >= 75.0 => HealthStatus::Healthy,
            s if s >= 60.0 => HealthStatus::NeedsAttention,
            _ => HealthStatus::Critical,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Excellent => write!(f, "Excellent"),
            HealthStatus::Healthy => write!(f, "Healthy"),
            HealthStatus::NeedsAttention => write!(f, "Needs Attention"),
            HealthStatus::Critical => write!(f, "Critical"),
        }
    }
}

/// How the score was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Penalty density per kLOC, split into architecture and hygiene
    Weighted,
    /// No LOC available; raw penalty over a module-count scaling factor
    Legacy,
}

/// Everything one analysis run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// In production order (registration order of the rules)
    pub violations: Vec<Violation>,
    pub score: f64,
    pub architecture_score: f64,
    pub hygiene_score: f64,
    pub status: HealthStatus,
    pub scoring_mode: ScoringMode,
    pub counts: SeverityCounts,
    pub healthy_modules: usize,
    pub total_modules: usize,
    pub top_risks: Vec<Violation>,
    pub total_loc: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_errors: Vec<RuleError>,
    pub duration_ms: u64,
}

impl AnalysisResult {
    pub fn has_rule_errors(&self) -> bool {
        !self.rule_errors.is_empty()
    }
}
