// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessibility auditor implementing the WCAG 2.1 AA page checks.
//!
//! Each rule module focuses on one check and is registered into an
//! [`Auditor`]. Rules walk the page tree in document order (depth-first,
//! pre-order), so the findings of a rule come out in reading order.

pub mod alt_text;
pub mod contrast;
pub mod document;
pub mod headings;
pub mod landmarks;
pub mod meta_tags;

use crate::config::AuditConfig;
use crate::engine::CancelToken;
use crate::error::{ComplianceError, Result};
use crate::finding::{Category, Finding, Location, Severity};
use crate::locale::LocaleConfig;
use crate::page::PageArtifact;
use rayon::prelude::*;
use tracing::debug;

/// Trait implemented by all audit rules
pub trait Rule: Send + Sync {
    /// Rule identifier used in findings and configuration
    fn id(&self) -> &'static str;

    /// Short description of what this rule checks
    fn description(&self) -> &'static str;

    /// Check one page and return its findings in document order
    fn check(&self, page: &PageArtifact) -> Vec<Finding>;
}

/// Runs a set of registered rules over pages
#[derive(Default)]
pub struct Auditor {
    rules: Vec<Box<dyn Rule>>,
}

impl Auditor {
    /// An auditor with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rule set with default settings
    pub fn with_default_rules() -> Self {
        let mut auditor = Self::new();
        auditor.register(alt_text::AltTextRule);
        auditor.register(headings::HeadingOrderRule);
        auditor.register(landmarks::LandmarkRule);
        auditor.register(contrast::ContrastRule::default());
        auditor.register(document::DocumentStructureRule::new(LocaleConfig::default().profiles));
        auditor.register(meta_tags::MetaTagsRule);
        auditor
    }

    /// The built-in rule set configured from `audit`, minus disabled rules
    pub fn from_config(audit: &AuditConfig, locale: &LocaleConfig) -> Result<Self> {
        let contrast = contrast::ContrastRule::from_config(audit)?;
        let candidates: Vec<Box<dyn Rule>> = vec![
            Box::new(alt_text::AltTextRule),
            Box::new(headings::HeadingOrderRule),
            Box::new(landmarks::LandmarkRule),
            Box::new(contrast),
            Box::new(document::DocumentStructureRule::new(locale.profiles.clone())),
            Box::new(meta_tags::MetaTagsRule),
        ];

        for disabled in &audit.disabled_rules {
            if !candidates.iter().any(|r| r.id() == disabled) {
                return Err(ComplianceError::Config(format!(
                    "unknown rule '{}' in audit.disabled_rules",
                    disabled
                )));
            }
        }

        let rules = candidates
            .into_iter()
            .filter(|r| !audit.disabled_rules.iter().any(|d| d == r.id()))
            .collect();
        Ok(Self { rules })
    }

    /// Add a rule; it runs after the ones already registered
    pub fn register(&mut self, rule: impl Rule + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Registered rules in execution order
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Lazily audit one page.
    ///
    /// Each rule runs only when the iterator reaches it. Calling this again on
    /// the same page yields the same sequence.
    pub fn audit<'a>(&'a self, page: &'a PageArtifact) -> impl Iterator<Item = Finding> + 'a {
        self.rules.iter().flat_map(move |rule| rule.check(page))
    }

    /// Audit every page, in parallel, keeping input order.
    pub fn audit_all(&self, pages: &[PageArtifact], cancel: &CancelToken) -> Result<Vec<Finding>> {
        let per_page: Option<Vec<Vec<Finding>>> = pages
            .par_iter()
            .map(|page| {
                if cancel.is_cancelled() {
                    return None;
                }
                let findings: Vec<Finding> = self.audit(page).collect();
                debug!(page = %page.id, findings = findings.len(), "Audited page");
                Some(findings)
            })
            .collect();

        match per_page {
            Some(findings) if !cancel.is_cancelled() => Ok(findings.into_iter().flatten().collect()),
            _ => Err(ComplianceError::Cancelled),
        }
    }
}

/// Finding helper for accessibility rules
pub(crate) fn finding(
    rule_id: &str,
    severity: Severity,
    location: Location,
    message: &str,
) -> Finding {
    Finding::new(rule_id, Category::Accessibility, severity, location, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ElementNode;

    struct NoTitleRule;

    impl Rule for NoTitleRule {
        fn id(&self) -> &'static str {
            "no-title"
        }

        fn description(&self) -> &'static str {
            "Flags pages without a <title>"
        }

        fn check(&self, page: &PageArtifact) -> Vec<Finding> {
            if page.walk().any(|v| v.node.tag == "title") {
                Vec::new()
            } else {
                vec![finding(self.id(), Severity::Warning, page.location(), "No title")]
            }
        }
    }

    fn bare_page() -> PageArtifact {
        let root = ElementNode::new("html").with_child(
            ElementNode::new("body").with_child(ElementNode::new("img").with_attr("src", "a.png")),
        );
        PageArtifact::new("eng/a.html", "en", root)
    }

    #[test]
    fn test_custom_rule_registration() {
        let mut auditor = Auditor::new();
        auditor.register(NoTitleRule);
        let findings: Vec<_> = auditor.audit(&bare_page()).collect();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "no-title");
        assert_eq!(findings[0].category, Category::Accessibility);
    }

    #[test]
    fn test_audit_is_idempotent() {
        let auditor = Auditor::with_default_rules();
        let page = bare_page();
        let first: Vec<_> = auditor.audit(&page).collect();
        let second: Vec<_> = auditor.audit(&page).collect();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let audit = AuditConfig {
            disabled_rules: vec!["required-meta-tags".to_string(), "document-structure".to_string()],
            ..AuditConfig::default()
        };
        let auditor = Auditor::from_config(&audit, &LocaleConfig::default()).unwrap();
        let ids: Vec<_> = auditor.rules().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["alt-text", "heading-order", "landmark-structure", "contrast"]);
    }

    #[test]
    fn test_unknown_disabled_rule_is_rejected() {
        let audit = AuditConfig {
            disabled_rules: vec!["colour".to_string()],
            ..AuditConfig::default()
        };
        assert!(matches!(
            Auditor::from_config(&audit, &LocaleConfig::default()),
            Err(ComplianceError::Config(_))
        ));
    }

    #[test]
    fn test_audit_all_respects_cancellation() {
        let auditor = Auditor::with_default_rules();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = auditor.audit_all(&[bare_page()], &cancel);
        assert!(matches!(result, Err(ComplianceError::Cancelled)));
    }
}
