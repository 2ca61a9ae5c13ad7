// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report aggregation.
//!
//! Findings from the three checkers are merged in a fixed order
//! (accessibility, asset integrity, locale parity), deduplicated, and sorted
//! within each checker by severity and then document order. The same inputs
//! always produce the same finding sequence.

pub mod format;

pub use format::{generate_report, OutputFormat};

use crate::finding::{Category, Finding, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// No errors (warnings allowed)
    Pass,
    /// At least one error
    Fail,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pass => write!(f, "pass"),
            RunStatus::Fail => write!(f, "fail"),
        }
    }
}

/// Result of one checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Category,
    pub errors: usize,
    pub warnings: usize,
    pub passed: bool,
}

/// Pages validated, and how many of them carry an error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl PageSummary {
    /// A page fails when an error finding is located on it
    pub fn count<'a>(pages: impl IntoIterator<Item = &'a str>, findings: &[Finding]) -> Self {
        let failing: HashSet<&str> = findings
            .iter()
            .filter(|f| f.severity.blocks_release())
            .map(|f| f.location.page.as_str())
            .collect();
        let pages: BTreeSet<&str> = pages.into_iter().collect();
        let failed = pages.iter().filter(|p| failing.contains(*p)).count();
        Self {
            total: pages.len(),
            passed: pages.len() - failed,
            failed,
        }
    }
}

/// Counts over all findings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    /// Per-page outcome, filled in by [`ComplianceReport::with_pages`]
    #[serde(default)]
    pub pages: PageSummary,
    /// Findings per rule id
    pub by_rule: BTreeMap<String, usize>,
    /// One entry per category, in report order
    pub categories: Vec<CategorySummary>,
}

/// The outcome of a validation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub findings: Vec<Finding>,
    pub summary: Summary,
    pub status: RunStatus,
    pub generated_at: DateTime<Utc>,
}

impl ComplianceReport {
    /// Findings of one category, in report order
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.category == category)
    }

    /// Whether any error was found
    pub fn blocks_release(&self) -> bool {
        self.status == RunStatus::Fail
    }

    /// Count pass/fail over the validated pages
    pub fn with_pages<'a>(mut self, pages: impl IntoIterator<Item = &'a str>) -> Self {
        self.summary.pages = PageSummary::count(pages, &self.findings);
        self
    }
}

/// Merge checker outputs into a report
pub fn aggregate(
    accessibility: Vec<Finding>,
    integrity: Vec<Finding>,
    locale: Vec<Finding>,
) -> ComplianceReport {
    let mut findings = Vec::new();
    let mut seen: HashSet<(String, String, String)> = HashSet::new();

    for mut group in [accessibility, integrity, locale] {
        group.retain(|f| {
            let (rule, target, message) = f.dedup_key();
            seen.insert((rule.to_string(), target.to_string(), message.to_string()))
        });
        group.sort_by(|a, b| {
            a.severity
                .cmp(&b.severity)
                .then_with(|| a.location.document_order(&b.location))
        });
        findings.extend(group);
    }

    let summary = summarize(&findings);
    let status = if summary.errors > 0 {
        RunStatus::Fail
    } else {
        RunStatus::Pass
    };

    ComplianceReport {
        findings,
        summary,
        status,
        generated_at: Utc::now(),
    }
}

fn summarize(findings: &[Finding]) -> Summary {
    let count = |category: Option<Category>, severity: Severity| {
        findings
            .iter()
            .filter(|f| category.map_or(true, |c| f.category == c) && f.severity == severity)
            .count()
    };

    let mut by_rule = BTreeMap::new();
    for finding in findings {
        *by_rule.entry(finding.rule_id.clone()).or_insert(0) += 1;
    }

    let categories = Category::ALL
        .iter()
        .map(|&category| {
            let errors = count(Some(category), Severity::Error);
            CategorySummary {
                category,
                errors,
                warnings: count(Some(category), Severity::Warning),
                passed: errors == 0,
            }
        })
        .collect();

    Summary {
        errors: count(None, Severity::Error),
        warnings: count(None, Severity::Warning),
        pages: PageSummary::default(),
        by_rule,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Location;

    fn at(rule: &str, category: Category, severity: Severity, page: &str, index: Option<usize>) -> Finding {
        let location = Location {
            page: page.to_string(),
            path: index.map(|i| format!("html/body/p[{}]", i)),
            node_index: index,
            byte_offset: None,
        };
        Finding::new(rule, category, severity, location, &format!("{} on {}", rule, page))
    }

    #[test]
    fn test_empty_report_passes() {
        let report = aggregate(Vec::new(), Vec::new(), Vec::new());
        assert_eq!(report.status, RunStatus::Pass);
        assert_eq!(report.summary.categories.len(), 3);
        assert!(report.summary.categories.iter().all(|c| c.passed));
    }

    #[test]
    fn test_warnings_never_fail() {
        let report = aggregate(
            vec![at("heading-order", Category::Accessibility, Severity::Warning, "a.html", Some(3))],
            vec![at("asset-unbaselined", Category::AssetIntegrity, Severity::Warning, "common/a.js", None)],
            Vec::new(),
        );
        assert_eq!(report.status, RunStatus::Pass);
        assert_eq!(report.summary.warnings, 2);
    }

    #[test]
    fn test_merge_order_and_sorting() {
        let report = aggregate(
            vec![
                at("heading-order", Category::Accessibility, Severity::Warning, "a.html", Some(2)),
                at("alt-text", Category::Accessibility, Severity::Error, "b.html", Some(9)),
                at("alt-text", Category::Accessibility, Severity::Error, "a.html", Some(5)),
                at("document-structure", Category::Accessibility, Severity::Error, "a.html", None),
            ],
            vec![at("asset-modified", Category::AssetIntegrity, Severity::Error, "common/a.js", None)],
            vec![at("locale-missing", Category::LocaleParity, Severity::Error, "home", None)],
        );

        let order: Vec<(&str, &str)> = report
            .findings
            .iter()
            .map(|f| (f.rule_id.as_str(), f.location.page.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("document-structure", "a.html"),
                ("alt-text", "a.html"),
                ("alt-text", "b.html"),
                ("heading-order", "a.html"),
                ("asset-modified", "common/a.js"),
                ("locale-missing", "home"),
            ]
        );
        assert_eq!(report.status, RunStatus::Fail);
        assert_eq!(report.summary.by_rule["alt-text"], 2);
        assert!(!report.summary.categories[1].passed);
    }

    #[test]
    fn test_duplicates_are_removed() {
        let finding = at("alt-text", Category::Accessibility, Severity::Error, "a.html", Some(4));
        let report = aggregate(vec![finding.clone(), finding], Vec::new(), Vec::new());
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.summary.errors, 1);
    }

    #[test]
    fn test_same_finding_on_different_pages_is_kept() {
        let report = aggregate(
            vec![
                at("alt-text", Category::Accessibility, Severity::Error, "a.html", Some(4)),
                Finding {
                    message: "alt-text on a.html".to_string(),
                    ..at("alt-text", Category::Accessibility, Severity::Error, "b.html", Some(4))
                },
            ],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(report.findings.len(), 2);
    }

    #[test]
    fn test_page_counts() {
        let report = aggregate(
            vec![
                at("alt-text", Category::Accessibility, Severity::Error, "eng/a.html", Some(4)),
                at("alt-text", Category::Accessibility, Severity::Error, "eng/a.html", Some(6)),
                at("heading-order", Category::Accessibility, Severity::Warning, "eng/b.html", Some(2)),
            ],
            vec![at("asset-modified", Category::AssetIntegrity, Severity::Error, "common/a.js", None)],
            Vec::new(),
        )
        .with_pages(["eng/a.html", "eng/b.html", "chi/a.html"]);
        assert_eq!(report.summary.pages, PageSummary { total: 3, passed: 2, failed: 1 });
    }

    #[test]
    fn test_ordering_is_stable_across_runs() {
        let input = || {
            vec![
                at("contrast", Category::Accessibility, Severity::Error, "a.html", Some(7)),
                at("alt-text", Category::Accessibility, Severity::Error, "a.html", Some(7)),
            ]
        };
        let first = aggregate(input(), Vec::new(), Vec::new());
        let second = aggregate(input(), Vec::new(), Vec::new());
        assert_eq!(first.findings, second.findings);
        assert_eq!(first.findings[0].rule_id, "contrast");
    }
}
