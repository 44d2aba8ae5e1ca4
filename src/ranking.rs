//! Risk ranking of violations

use crate::models::{Severity, SeverityCounts, Violation};
use std::cmp::Ordering;

/// The `top_n` most severe violations.
///
/// Stable: severity descending, then penalty descending, ties keep their
/// production order.
pub fn rank(violations: &[Violation], top_n: usize) -> Vec<Violation> {
    let mut ranked: Vec<&Violation> = violations.iter().collect();
    ranked.sort_by(|a, b| compare_risk(a, b));
    ranked.into_iter().take(top_n).cloned().collect()
}

fn compare_risk(a: &Violation, b: &Violation) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.penalty.total_cmp(&a.penalty))
}

/// Tally every violation by severity
pub fn count_by_severity(violations: &[Violation]) -> SeverityCounts {
    violations
        .iter()
        .fold(SeverityCounts::default(), |mut counts, v| {
            match v.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
            counts
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(message: &str, severity: Severity, penalty: f64) -> Violation {
        Violation::new("r", severity, "a.ts", message, penalty)
    }

    #[test]
    fn test_rank_orders_by_severity_then_penalty() {
        let violations = vec![
            v("info", Severity::Info, 50.0),
            v("warn-low", Severity::Warning, 1.0),
            v("crit", Severity::Critical, 2.0),
            v("warn-high", Severity::Warning, 5.0),
        ];
        let ranked: Vec<String> = rank(&violations, 10).into_iter().map(|v| v.message).collect();
        assert_eq!(ranked, vec!["crit", "warn-high", "warn-low", "info"]);
    }

    #[test]
    fn test_rank_is_stable_and_truncates() {
        let violations = vec![
            v("first", Severity::Warning, 3.0),
            v("second", Severity::Warning, 3.0),
            v("third", Severity::Warning, 3.0),
        ];
        let ranked = rank(&violations, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].message, "first");
        assert_eq!(ranked[1].message, "second");

        assert!(rank(&violations, 0).is_empty());
    }

    #[test]
    fn test_count_by_severity() {
        let violations = vec![
            v("a", Severity::Critical, 1.0),
            v("b", Severity::Warning, 1.0),
            v("c", Severity::Warning, 1.0),
            v("d", Severity::Info, 1.0),
        ];
        let counts = count_by_severity(&violations);
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.warning, 2);
        assert_eq!(counts.info, 1);
        assert_eq!(counts.total(), 4);
    }
}
