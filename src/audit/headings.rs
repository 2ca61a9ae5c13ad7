// SPDX-License-Identifier: PMPL-1.0-or-later
//! Heading order rule - WCAG 1.3.1 Info and Relationships (Level A)
//!
//! Going down, a heading may only be one level deeper than the heading
//! before it (h2 -> h3 is fine, h2 -> h4 is not). Going back up any number
//! of levels is allowed.

use super::{finding, Rule};
use crate::finding::{Finding, Severity};
use crate::page::{ElementNode, PageArtifact};

pub const RULE_ID: &str = "heading-order";

/// Rule for heading hierarchy
pub struct HeadingOrderRule;

impl Rule for HeadingOrderRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn description(&self) -> &'static str {
        "Heading levels must not skip downward by more than one level (WCAG 1.3.1)"
    }

    fn check(&self, page: &PageArtifact) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut previous: Option<u8> = None;

        for visit in page.walk() {
            let Some(level) = heading_level(visit.node) else {
                continue;
            };

            if let Some(prev) = previous {
                if level > prev + 1 {
                    findings.push(
                        finding(
                            RULE_ID,
                            Severity::Warning,
                            visit.location(&page.id),
                            &format!(
                                "Heading level skipped from h{} to h{}",
                                prev, level
                            ),
                        )
                        .with_wcag("1.3.1")
                        .with_suggestion(&format!(
                            "Use h{} here, or add the missing intermediate heading",
                            prev + 1
                        )),
                    );
                }
            }
            previous = Some(level);
        }

        findings
    }
}

/// Heading level of an element: `h1`-`h6`, or `role="heading"` with `aria-level` (default 2)
pub fn heading_level(node: &ElementNode) -> Option<u8> {
    if node.role().as_deref() == Some("heading") {
        return Some(
            node.attr("aria-level")
                .and_then(|l| l.trim().parse::<u8>().ok())
                .filter(|l| (1..=6).contains(l))
                .unwrap_or(2),
        );
    }
    let digits = node.tag.strip_prefix('h')?;
    match digits.parse::<u8>() {
        Ok(level) if (1..=6).contains(&level) => Some(level),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(body: &str) -> PageArtifact {
        let html = format!("<html><body>{}</body></html>", body);
        PageArtifact::parse("chi/rates.html", "zh-Hant", html.into_bytes())
    }

    #[test]
    fn test_proper_hierarchy() {
        let page = page_with("<h1>A</h1><h2>B</h2><h3>C</h3><h2>D</h2><h3>E</h3><h1>F</h1>");
        assert!(HeadingOrderRule.check(&page).is_empty());
    }

    #[test]
    fn test_heading_skip() {
        let page = page_with("<h1>Title</h1><h3>Skipped h2</h3>");
        let findings = HeadingOrderRule.check(&page);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].message, "Heading level skipped from h1 to h3");
    }

    #[test]
    fn test_skip_measured_from_previous_heading() {
        // h4 after h3 is fine even though h1 -> h3 was already a skip
        let page = page_with("<h1>A</h1><h3>B</h3><h4>C</h4><h6>D</h6>");
        let findings = HeadingOrderRule.check(&page);
        assert_eq!(findings.len(), 2);
        assert!(findings[1].message.ends_with("h4 to h6"));
    }

    #[test]
    fn test_aria_headings() {
        let page = page_with(r#"<h1>A</h1><div role="heading" aria-level="4">B</div>"#);
        assert_eq!(HeadingOrderRule.check(&page).len(), 1);
    }

    #[test]
    fn test_non_heading_tags() {
        assert_eq!(heading_level(&ElementNode::new("header")), None);
        assert_eq!(heading_level(&ElementNode::new("hr")), None);
        assert_eq!(heading_level(&ElementNode::new("h7")), None);
        assert_eq!(heading_level(&ElementNode::new("h2")), Some(2));
    }
}
