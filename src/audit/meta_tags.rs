// SPDX-License-Identifier: PMPL-1.0-or-later
//! Required meta tags rule.
//!
//! Every published page must be valid UTF-8 and declare:
//! - `charset="utf-8"`
//! - `http-equiv="x-ua-compatible"` with `ie=edge`
//! - `name="viewport"` with `width=device-width` (needed for reflow, WCAG 1.4.10)
//! - the cache-control trio: `Cache-Control`, `Pragma`, `Expires`
//! - a non-empty `<title>` (WCAG 2.4.2) and `keywords`, `description`, `summary` metas

use super::{finding, Rule};
use crate::finding::{Finding, Location, Severity};
use crate::page::{ElementNode, PageArtifact, Visit};

pub const RULE_ID: &str = "required-meta-tags";

const CACHE_HEADERS: &[&str] = &["Cache-Control", "Pragma", "Expires"];
const CONTENT_METAS: &[&str] = &["keywords", "description", "summary"];

/// Rule for required `<head>` metadata
pub struct MetaTagsRule;

impl Rule for MetaTagsRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn description(&self) -> &'static str {
        "Charset, compatibility, viewport, cache-control, title and content meta tags are required"
    }

    fn check(&self, page: &PageArtifact) -> Vec<Finding> {
        let mut findings = Vec::new();
        if let Some(offset) = page.invalid_utf8_at {
            let location = Location {
                byte_offset: Some(offset as u64),
                ..page.location()
            };
            findings.push(
                finding(
                    RULE_ID,
                    Severity::Error,
                    location,
                    &format!("Encoding error: content is not valid UTF-8 at byte {}", offset),
                )
                .with_suggestion("Re-save the file as UTF-8 (it may have been saved as Big5 or GB2312)"),
            );
        }

        let visits: Vec<Visit<'_>> = page.walk().collect();
        let Some(head) = visits.iter().find(|v| v.node.tag == "head") else {
            findings.push(finding(RULE_ID, Severity::Error, page.location(), "Missing <head> element"));
            return findings;
        };
        let head_location = head.location(&page.id);
        let metas: Vec<&Visit<'_>> = visits.iter().filter(|v| v.node.tag == "meta").collect();

        let mut report = |severity: Severity, location: Location, message: String| {
            findings.push(finding(RULE_ID, severity, location, &message));
        };

        match metas.iter().find(|v| v.node.attr("charset").is_some()) {
            None => report(Severity::Error, head_location.clone(), "Missing required meta tag: charset".into()),
            Some(meta) => {
                let charset = meta.node.attr("charset").unwrap_or_default();
                if !charset.trim().eq_ignore_ascii_case("utf-8") {
                    report(
                        Severity::Error,
                        meta.location(&page.id),
                        format!("Charset should be 'utf-8', found '{}'", charset),
                    );
                }
            }
        }

        check_content(
            &metas,
            |n| n.attr_is("http-equiv", "x-ua-compatible"),
            "ie=edge",
            "http-equiv='x-ua-compatible'",
            &head_location,
            page,
            &mut report,
        );
        check_content(
            &metas,
            |n| n.attr_is("name", "viewport"),
            "width=device-width",
            "viewport",
            &head_location,
            page,
            &mut report,
        );

        for header in CACHE_HEADERS {
            if !metas.iter().any(|v| v.node.attr_is("http-equiv", header)) {
                report(
                    Severity::Error,
                    head_location.clone(),
                    format!("Missing cache control meta tag: {}", header),
                );
            }
        }

        let has_title = visits
            .iter()
            .any(|v| v.node.tag == "title" && v.node.has_text());
        if !has_title {
            report(Severity::Error, head_location.clone(), "Missing or empty <title> element".into());
        }

        for name in CONTENT_METAS {
            if !metas.iter().any(|v| v.node.attr_is("name", name)) {
                report(
                    Severity::Error,
                    head_location.clone(),
                    format!("Missing required meta tag: {}", name),
                );
            }
        }

        findings
    }
}

/// Presence is an error; wrong content is a warning.
fn check_content(
    metas: &[&Visit<'_>],
    select: impl Fn(&ElementNode) -> bool,
    required: &str,
    label: &str,
    head_location: &Location,
    page: &PageArtifact,
    report: &mut impl FnMut(Severity, Location, String),
) {
    match metas.iter().find(|v| select(v.node)) {
        None => report(
            Severity::Error,
            head_location.clone(),
            format!("Missing required meta tag: {}", label),
        ),
        Some(meta) => {
            let content = meta.node.attr("content").unwrap_or_default().to_lowercase();
            if !content.contains(required) {
                report(
                    Severity::Warning,
                    meta.location(&page.id),
                    format!("{} content should contain '{}'", label, required),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE_HEAD: &str = r#"<head>
        <meta charset="utf-8">
        <meta http-equiv="x-ua-compatible" content="ie=edge">
        <meta name="viewport" content="width=device-width, initial-scale=1">
        <meta http-equiv="Cache-Control" content="no-cache, no-store, must-revalidate">
        <meta http-equiv="Pragma" content="no-cache">
        <meta http-equiv="Expires" content="0">
        <title>Time deposits</title>
        <meta name="keywords" content="deposit">
        <meta name="description" content="Time deposit rates">
        <meta name="summary" content="Rates">
    </head>"#;

    fn check(head: &str) -> Vec<Finding> {
        let html = format!("<!DOCTYPE html><html>{}<body></body></html>", head);
        MetaTagsRule.check(&PageArtifact::parse("eng/deposit.html", "en", html.into_bytes()))
    }

    #[test]
    fn test_complete_head() {
        let findings = check(COMPLETE_HEAD);
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_empty_head() {
        let findings = check("<head></head>");
        // charset, x-ua, viewport, 3 cache headers, title, 3 content metas
        assert_eq!(findings.len(), 10);
        assert!(findings.iter().all(|f| f.severity == Severity::Error));
    }

    #[test]
    fn test_wrong_content_is_warning() {
        let head = COMPLETE_HEAD
            .replace("ie=edge", "ie=11")
            .replace(r#"charset="utf-8""#, r#"charset="big5""#);
        let findings = check(&head);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("big5"));
        assert_eq!(findings[1].severity, Severity::Warning);
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let html = format!("<!DOCTYPE html><html>{}<body></body></html>", COMPLETE_HEAD);
        let (before, after) = html.split_at(html.find("Time deposits").unwrap());
        let mut content = before.as_bytes().to_vec();
        content.extend_from_slice(&[0xA9, 0x77, 0xB4, 0xC1]);
        content.extend_from_slice(after.as_bytes());

        let findings = MetaTagsRule.check(&PageArtifact::parse("chi/deposit.html", "zh-Hant", content));
        assert_eq!(findings.len(), 1, "{:?}", findings);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.starts_with("Encoding error"));
        assert_eq!(findings[0].location.byte_offset, Some(before.len() as u64));
        assert_eq!(findings[0].location.path, None);
    }

    #[test]
    fn test_missing_head() {
        let page = PageArtifact::new("eng/x.html", "en", ElementNode::new("html"));
        let findings = MetaTagsRule.check(&page);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Missing <head> element");
    }
}
