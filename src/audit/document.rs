// SPDX-License-Identifier: PMPL-1.0-or-later
//! Document structure rule - WCAG 3.1.1 Language of Page (Level A)
//!
//! Checks the page skeleton every template is expected to carry:
//! - `<!DOCTYPE html>` declaration
//! - `<html lang="...">` using one of the configured languages
//! - `<html class="no-js ...">` including the language class code (tc/en/sc)

use super::{finding, Rule};
use crate::finding::{Finding, Severity};
use crate::locale::LanguageProfile;
use crate::page::PageArtifact;

pub const RULE_ID: &str = "document-structure";

/// Rule for the document skeleton
pub struct DocumentStructureRule {
    profiles: Vec<LanguageProfile>,
}

impl DocumentStructureRule {
    pub fn new(profiles: Vec<LanguageProfile>) -> Self {
        Self { profiles }
    }

    fn error(&self, page: &PageArtifact, message: &str, suggestion: &str) -> Finding {
        let mut location = page.location();
        if page.html_element().is_some() {
            location.path = Some("html".to_string());
            location.node_index = Some(0);
        }
        finding(RULE_ID, Severity::Error, location, message)
            .with_wcag("3.1.1")
            .with_suggestion(suggestion)
    }
}

impl Rule for DocumentStructureRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn description(&self) -> &'static str {
        "DOCTYPE, <html lang> and <html class=\"no-js <code>\"> must be present (WCAG 3.1.1)"
    }

    fn check(&self, page: &PageArtifact) -> Vec<Finding> {
        let mut findings = Vec::new();

        if !page.has_doctype {
            findings.push(
                finding(RULE_ID, Severity::Error, page.location(), "Missing DOCTYPE html declaration")
                    .with_suggestion("Start the page with <!DOCTYPE html>"),
            );
        }

        let Some(html) = page.html_element() else {
            findings.push(
                finding(RULE_ID, Severity::Error, page.location(), "Missing <html> element")
                    .with_suggestion("Wrap the page in an <html> element"),
            );
            return findings;
        };

        match html.attr("lang").map(str::trim) {
            None | Some("") => findings.push(self.error(
                page,
                "<html> element is missing the lang attribute",
                "Add lang=\"zh-hant\", lang=\"en\" or lang=\"zh-hans\"",
            )),
            Some(lang) if !self.profiles.iter().any(|p| p.tag.eq_ignore_ascii_case(lang)) => {
                let expected: Vec<&str> = self.profiles.iter().map(|p| p.tag.as_str()).collect();
                findings.push(self.error(
                    page,
                    &format!(
                        "Invalid lang attribute '{}'. Expected one of: {}",
                        lang,
                        expected.join(", ")
                    ),
                    "Use one of the configured language tags",
                ));
            }
            Some(_) => {}
        }

        let classes: Vec<&str> = html
            .attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        if classes.is_empty() {
            findings.push(self.error(
                page,
                "<html> element is missing the class attribute",
                "Add class=\"no-js <language code>\"",
            ));
        } else {
            if !classes.contains(&"no-js") {
                findings.push(self.error(
                    page,
                    "<html> class should contain 'no-js'",
                    "Add the no-js class; scripts replace it at runtime",
                ));
            }
            if !self.profiles.iter().any(|p| classes.contains(&p.class_code.as_str())) {
                let codes: Vec<&str> = self.profiles.iter().map(|p| p.class_code.as_str()).collect();
                findings.push(self.error(
                    page,
                    &format!("<html> class should contain a language code ({})", codes.join("/")),
                    "Add the class code matching the page language",
                ));
            }
        }

        findings
    }
}
