// SPDX-License-Identifier: PMPL-1.0-or-later
//! Landmark structure rule - WCAG 1.3.1 Info and Relationships (Level A)
//!
//! A page must have exactly one main content region and at most one
//! navigation, banner (page header) and content-info (page footer)
//! landmark. `<header>`/`<footer>` elements scoped inside sectioning content
//! are not page landmarks and are not counted.

use super::{finding, Rule};
use crate::finding::{Finding, Severity};
use crate::page::{ElementNode, PageArtifact, Visit};
use std::fmt;

pub const RULE_ID: &str = "landmark-structure";

/// Elements that scope a nested header/footer away from the page
const SECTIONING_SCOPES: &[&str] = &["article", "aside", "main", "nav", "section"];

/// Elements and roles that make up the section outline of a page
pub const OUTLINE_TAGS: &[&str] = &["header", "nav", "main", "aside", "section", "article", "footer"];

/// ARIA landmarks this rule tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    Main,
    Navigation,
    Banner,
    ContentInfo,
}

impl Landmark {
    /// The landmark an element represents, taking ARIA roles and scoping into account
    pub fn of(visit: &Visit<'_>) -> Option<Landmark> {
        let node = visit.node;
        if let Some(role) = node.role() {
            match role.as_str() {
                "main" => return Some(Landmark::Main),
                "navigation" => return Some(Landmark::Navigation),
                "banner" => return Some(Landmark::Banner),
                "contentinfo" => return Some(Landmark::ContentInfo),
                _ => {}
            }
        }
        let scoped = || {
            visit
                .nearest_ancestor(|a| SECTIONING_SCOPES.contains(&a.tag.as_str()))
                .is_some()
        };
        match node.tag.as_str() {
            "main" => Some(Landmark::Main),
            "nav" => Some(Landmark::Navigation),
            "header" if !scoped() => Some(Landmark::Banner),
            "footer" if !scoped() => Some(Landmark::ContentInfo),
            _ => None,
        }
    }

    fn element(&self) -> &'static str {
        match self {
            Landmark::Main => "main",
            Landmark::Navigation => "nav",
            Landmark::Banner => "header",
            Landmark::ContentInfo => "footer",
        }
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Landmark::Main => write!(f, "main"),
            Landmark::Navigation => write!(f, "navigation"),
            Landmark::Banner => write!(f, "banner"),
            Landmark::ContentInfo => write!(f, "contentinfo"),
        }
    }
}

/// Rule for page landmark structure
pub struct LandmarkRule;

impl Rule for LandmarkRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn description(&self) -> &'static str {
        "Exactly one main region and at most one navigation, header and footer landmark (WCAG 1.3.1)"
    }

    fn check(&self, page: &PageArtifact) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut seen: Vec<(Landmark, Visit<'_>)> = Vec::new();

        for visit in page.walk() {
            if let Some(landmark) = Landmark::of(&visit) {
                seen.push((landmark, visit));
            }
        }

        let mains = seen.iter().filter(|(l, _)| *l == Landmark::Main).count();
        if mains == 0 {
            findings.push(
                finding(
                    RULE_ID,
                    Severity::Warning,
                    page.location(),
                    "Page has no main content region",
                )
                .with_wcag("1.3.1")
                .with_suggestion("Wrap the primary content in a single <main> element"),
            );
        }

        for kind in [Landmark::Main, Landmark::Navigation, Landmark::Banner, Landmark::ContentInfo] {
            let occurrences: Vec<&Visit<'_>> = seen
                .iter()
                .filter(|(l, _)| *l == kind)
                .map(|(_, v)| v)
                .collect();
            if occurrences.len() > 1 {
                findings.push(
                    finding(
                        RULE_ID,
                        Severity::Warning,
                        occurrences[1].location(&page.id),
                        &format!(
                            "Page has {} {} landmarks; at most one is allowed",
                            occurrences.len(),
                            kind
                        ),
                    )
                    .with_wcag("1.3.1")
                    .with_suggestion(&format!(
                        "Keep a single page-level <{}> and demote the others",
                        kind.element()
                    )),
                );
            }
        }

        findings
    }
}

/// Whether an element belongs to the section outline
pub fn is_outline_element(node: &ElementNode) -> Option<&'static str> {
    if let Some(role) = node.role() {
        let mapped = match role.as_str() {
            "banner" => Some("header"),
            "navigation" => Some("nav"),
            "main" => Some("main"),
            "complementary" => Some("aside"),
            "region" => Some("section"),
            "contentinfo" => Some("footer"),
            _ => None,
        };
        if mapped.is_some() {
            return mapped;
        }
    }
    OUTLINE_TAGS.iter().copied().find(|t| *t == node.tag)
}

/// Ordered top-level outline elements of a page (nested outline elements are skipped)
pub fn section_outline(page: &PageArtifact) -> Vec<&'static str> {
    page.walk()
        .filter_map(|visit| {
            let kind = is_outline_element(visit.node)?;
            let nested = visit
                .nearest_ancestor(|a| is_outline_element(a).is_some())
                .is_some();
            (!nested).then_some(kind)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(body: &str) -> PageArtifact {
        let html = format!("<html><body>{}</body></html>", body);
        PageArtifact::parse("eng/home.html", "en", html.into_bytes())
    }

    #[test]
    fn test_well_structured_page() {
        let page = page_with(
            "<header><h1>Bank</h1></header><nav>Menu</nav>\
             <main><article><header>Story</header><footer>By</footer></article></main>\
             <footer>Legal</footer>",
        );
        let findings = LandmarkRule.check(&page);
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_missing_main() {
        let findings = LandmarkRule.check(&page_with("<header>H</header><div>Content</div>"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Page has no main content region");
        assert_eq!(findings[0].location.node_index, None);
    }

    #[test]
    fn test_duplicate_landmarks() {
        let page = page_with(
            r#"<nav>A</nav><nav>B</nav><main>1</main><div role="main">2</div><footer>F</footer>"#,
        );
        let findings = LandmarkRule.check(&page);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.starts_with("Page has 2 main landmarks"));
        assert!(findings[1].message.starts_with("Page has 2 navigation landmarks"));
    }

    #[test]
    fn test_section_outline() {
        let page = page_with(
            r#"<header>H</header><div><nav>N</nav></div>
               <main><section>S</section></main><div role="contentinfo">F</div>"#,
        );
        assert_eq!(section_outline(&page), vec!["header", "nav", "main", "footer"]);
    }
}
