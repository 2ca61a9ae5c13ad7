// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image alt text rule - WCAG 1.1.1 Non-text Content (Level A)
//!
//! Every image-like element needs a non-empty text alternative unless it is
//! explicitly marked decorative. An empty `alt=""` alone does not count as a
//! decorative marker on these pages: the guideline asks authors to say so
//! with `decorative="true"` (or an ARIA presentation role).

use super::{finding, Rule};
use crate::finding::{Finding, Severity};
use crate::page::{ElementNode, PageArtifact, Visit};

pub const RULE_ID: &str = "alt-text";

/// Image file extensions that should never appear as alt text
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp"];

/// Rule for image alt text
pub struct AltTextRule;

impl Rule for AltTextRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn description(&self) -> &'static str {
        "Image-like elements must have alternative text unless marked decorative (WCAG 1.1.1)"
    }

    fn check(&self, page: &PageArtifact) -> Vec<Finding> {
        let mut findings = Vec::new();

        for visit in page.walk() {
            if !is_image_like(visit.node) || is_decorative(&visit) {
                continue;
            }

            let element = describe(visit.node);
            match alternative_text(visit.node) {
                None => findings.push(
                    finding(
                        RULE_ID,
                        Severity::Error,
                        visit.location(&page.id),
                        &format!("{} has no alternative text", element),
                    )
                    .with_wcag("1.1.1")
                    .with_suggestion(
                        "Add alt=\"description\", or mark purely decorative images with decorative=\"true\"",
                    ),
                ),
                Some(text) if text.trim().is_empty() => findings.push(
                    finding(
                        RULE_ID,
                        Severity::Error,
                        visit.location(&page.id),
                        &format!("{} has empty alternative text but is not marked decorative", element),
                    )
                    .with_wcag("1.1.1")
                    .with_suggestion(
                        "Describe the image, or add decorative=\"true\" if it carries no information",
                    ),
                ),
                Some(text) => {
                    let lower = text.trim().to_lowercase();
                    if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
                        findings.push(
                            finding(
                                RULE_ID,
                                Severity::Warning,
                                visit.location(&page.id),
                                &format!(
                                    "{} alt text appears to be a filename: \"{}\"",
                                    element,
                                    text.trim()
                                ),
                            )
                            .with_wcag("1.1.1")
                            .with_suggestion("Replace the filename with a description of what the image shows"),
                        );
                    }
                }
            }
        }

        findings
    }
}

/// Whether the element conveys an image
pub fn is_image_like(node: &ElementNode) -> bool {
    match node.tag.as_str() {
        "img" | "area" | "svg" => true,
        "input" => node.attr_is("type", "image"),
        _ => node.role().as_deref() == Some("img"),
    }
}

fn marks_decorative(node: &ElementNode) -> bool {
    node.attr_is("decorative", "true")
        || node.attr_is("data-decorative", "true")
        || node.attr_is("aria-hidden", "true")
        || matches!(node.role().as_deref(), Some("presentation") | Some("none"))
}

/// Whether the element, or a hidden ancestor, takes it out of the accessibility tree
fn is_decorative(visit: &Visit<'_>) -> bool {
    marks_decorative(visit.node)
        || visit
            .nearest_ancestor(|a| a.attr_is("aria-hidden", "true"))
            .is_some()
}

/// The text alternative, if any attribute supplies one
fn alternative_text(node: &ElementNode) -> Option<String> {
    if let Some(label) = node.attr("aria-label").filter(|l| !l.trim().is_empty()) {
        return Some(label.to_string());
    }
    if let Some(ids) = node.attr("aria-labelledby").filter(|l| !l.trim().is_empty()) {
        return Some(ids.to_string());
    }
    match node.tag.as_str() {
        "img" | "area" | "input" => node.attr("alt").map(str::to_string),
        _ => node
            .children
            .iter()
            .find(|c| c.tag == "title")
            .map(|t| t.text.clone())
            .or_else(|| node.attr("title").map(str::to_string)),
    }
}

fn describe(node: &ElementNode) -> String {
    match node.attr("src") {
        Some(src) => format!("<{} src=\"{}\">", node.tag, src),
        None => format!("<{}>", node.tag),
    }
}
