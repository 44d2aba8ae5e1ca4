//! Duplicate Code Rule
//!
//! Sliding-window detection of code blocks replicated across files.
//!
//! # Algorithm
//!
//! 1. Slide a window of `min_lines` lines over every in-scope module
//! 2. Normalize the window: trim each line, drop blank lines, join
//! 3. Skip insignificant windows (short, import/export headers, comments,
//!    closing punctuation)
//! 4. Hash with DJB2 and group occurrences by hash, in first-seen order
//! 5. Report groups spanning two or more distinct files
//!
//! Consecutive windows repeated at the same places (every line shifted by
//! one) belong to one longer block and are reported once, at the block's
//! first window.
//!
//! DJB2 is 32 bits and collisions are possible. A collision can only
//! produce an extra violation for a human to review, never a rewrite, so
//! it is not guarded against.

use crate::models::{Severity, Violation};
use crate::rules::base::{Rule, RuleCategory, RuleContext};
use crate::rules::truncated_list;
use crate::source::SourceModule;
use anyhow::Result;
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use tracing::debug;

const NAME: &str = "duplicate-code";
const BASE_PENALTY: f64 = 3.0;
const DEFAULT_MIN_LINES: usize = 5;
const MIN_SIGNIFICANT_CHARS: usize = 10;

/// Keywords that open import/export headers in common languages
const HEADER_KEYWORDS: &[&str] = &[
    "import", "export", "from", "use", "require", "package", "#include",
];

/// Header forms written as a call, e.g. `require("x")`
const CALL_HEADERS: &[&str] = &["require("];

const COMMENT_MARKERS: &[&str] = &["//", "/*", "#", "--", "<!--", "\"\"\""];

/// (module index, 1-based start line)
type Occurrence = (usize, usize);

pub struct DuplicateCodeRule {
    min_lines: usize,
}

impl DuplicateCodeRule {
    pub fn new() -> Self {
        Self {
            min_lines: DEFAULT_MIN_LINES,
        }
    }

    pub fn with_min_lines(min_lines: usize) -> Self {
        Self { min_lines }
    }

    /// Effective window size: config, then constructor value, never < 2
    fn window_size(&self, ctx: &RuleContext<'_>) -> usize {
        let configured = ctx.options(NAME).get_or("min_lines", self.min_lines);
        if configured < 2 {
            debug!(
                "duplicate-code: min_lines {} too small, using {}",
                configured, DEFAULT_MIN_LINES
            );
            DEFAULT_MIN_LINES
        } else {
            configured
        }
    }

    /// Severity and penalty multiplier by number of distinct files
    fn band(file_count: usize) -> (Severity, f64) {
        match file_count {
            n if n >= 5 => (Severity::Critical, 2.0),
            n if n >= 3 => (Severity::Warning, 1.0),
            _ => (Severity::Info, 0.5),
        }
    }

    /// Hash every significant window of every module
    fn collect_windows(
        modules: &[&SourceModule],
        window: usize,
    ) -> IndexMap<u32, Vec<Occurrence>, FxBuildHasher> {
        let mut groups: IndexMap<u32, Vec<Occurrence>, FxBuildHasher> = IndexMap::default();

        for (file_idx, module) in modules.iter().enumerate() {
            let lines: Vec<&str> = module.text.lines().collect();
            if lines.len() < window {
                continue;
            }

            for start in 0..=lines.len() - window {
                let normalized = normalize_window(&lines[start..start + window]);
                if is_insignificant(&normalized) {
                    continue;
                }
                groups
                    .entry(djb2(&normalized))
                    .or_default()
                    .push((file_idx, start + 1));
            }
        }

        groups
    }
}

impl Default for DuplicateCodeRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim lines, drop blanks, join with newlines
pub(crate) fn normalize_window(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Windows that duplicate by nature and carry no refactoring signal
pub(crate) fn is_insignificant(normalized: &str) -> bool {
    if normalized.chars().count() < MIN_SIGNIFICANT_CHARS {
        return true;
    }
    if HEADER_KEYWORDS.iter().any(|kw| starts_with_header(normalized, kw))
        || CALL_HEADERS.iter().any(|h| normalized.starts_with(h))
    {
        return true;
    }
    if COMMENT_MARKERS.iter().any(|m| normalized.starts_with(m))
        || is_comment_continuation(normalized)
    {
        return true;
    }
    normalized
        .chars()
        .all(|c| c.is_whitespace() || matches!(c, '}' | ')' | ']' | ';' | ',' | '>'))
}

/// `text` opens with the header keyword `word`. The keyword must be followed
/// by whitespace, the end of the text or a character that starts an import
/// clause, so `use(x)` or `exports.a = 1` stay significant.
fn starts_with_header(text: &str, word: &str) -> bool {
    text.strip_prefix(word).is_some_and(|rest| {
        rest.chars()
            .next()
            .map_or(true, |c| c.is_whitespace() || matches!(c, '{' | '*' | '"' | '\'' | '<'))
    })
}

/// Block comment body line: a lone `*`, `* text` or the closing `*/`.
/// Dereferences such as `*ptr = v;` are code.
fn is_comment_continuation(text: &str) -> bool {
    let first = text.lines().next().unwrap_or_default();
    first == "*" || first.starts_with("* ") || first.starts_with("*/")
}

/// DJB2: seed 5381, `hash * 33 + code unit`, wrapping at 32 bits
pub(crate) fn djb2(text: &str) -> u32 {
    text.encode_utf16().fold(5381u32, |hash, unit| {
        hash.wrapping_mul(33).wrapping_add(u32::from(unit))
    })
}

fn distinct_files(occurrences: &[Occurrence]) -> Vec<usize> {
    let mut files: Vec<usize> = Vec::new();
    for &(file_idx, _) in occurrences {
        if !files.contains(&file_idx) {
            files.push(file_idx);
        }
    }
    files
}

fn shifted(occurrences: &[Occurrence], up: bool) -> Option<Vec<Occurrence>> {
    occurrences
        .iter()
        .map(|&(file_idx, line)| {
            let line = if up { line.checked_sub(1)? } else { line + 1 };
            Some((file_idx, line))
        })
        .collect()
}

impl Rule for DuplicateCodeRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Detects code blocks duplicated across files"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn base_penalty(&self) -> f64 {
        BASE_PENALTY
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::CodeHealth
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>> {
        let window = self.window_size(ctx);
        let base = ctx.options(NAME).penalty_or(BASE_PENALTY);
        let modules: Vec<&SourceModule> = ctx.modules().collect();

        let groups = Self::collect_windows(&modules, window);

        let duplicated: Vec<&Vec<Occurrence>> = groups
            .values()
            .filter(|occ| distinct_files(occ).len() >= 2)
            .collect();
        let signatures: FxHashSet<&[Occurrence]> =
            duplicated.iter().map(|occ| occ.as_slice()).collect();

        debug!(
            "duplicate-code: {} window hashes, {} shared across files",
            groups.len(),
            duplicated.len()
        );

        let mut violations = Vec::new();
        for occurrences in duplicated {
            // Continuation of a block already reported at its first window
            if shifted(occurrences, true).is_some_and(|prev| signatures.contains(prev.as_slice())) {
                continue;
            }

            let mut extra_lines = 0;
            let mut next = shifted(occurrences, false);
            while let Some(candidate) = next.filter(|n| signatures.contains(n.as_slice())) {
                extra_lines += 1;
                next = shifted(&candidate, false);
            }
            let block_lines = window + extra_lines;

            let files = distinct_files(occurrences);
            let names: Vec<&str> = files.iter().map(|&i| modules[i].path.as_str()).collect();
            let (file_idx, line) = occurrences[0];
            let (severity, multiplier) = Self::band(files.len());

            let message = format!(
                "Duplicate block of {} lines found in {} files: {}",
                block_lines,
                files.len(),
                truncated_list(&names[..])
            );

            let file = modules[file_idx].path.as_str();
            violations.push(
                Violation::new(NAME, severity, file, message, base * multiplier)
                    .with_line(u32::try_from(line).unwrap_or(u32::MAX))
                    .with_related_file(names[1])
                    .with_impact(
                        "Every copy has to be found and changed together; fixes applied \
                         to one copy silently miss the others.",
                    )
                    .with_suggested_fix(
                        "Extract the shared block into a function or module and call it \
                         from each site.",
                    ),
            );
        }

        Ok(violations)
    }
}
