// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast rule - WCAG 1.4.3 Contrast (Minimum), Level AA
//!
//! Every element with its own text is checked when it, or one of its
//! ancestors, declares a color or background. Foreground and background are
//! resolved independently to the nearest declaration up the tree.

use super::{finding, Rule};
use crate::config::AuditConfig;
use crate::contrast::{self, InvalidColorError, Rgb, TextSize};
use crate::error::Result;
use crate::finding::{Finding, Severity};
use crate::page::{ElementNode, PageArtifact, StylePair, Visit};

pub const RULE_ID: &str = "contrast";

/// Reported when a color pair cannot be evaluated
pub const UNRESOLVED_RULE_ID: &str = "unresolved-style";

/// User agent default sizes for headings that render as large text
const HEADING_SIZES_PX: &[(&str, f64)] = &[("h1", 32.0), ("h2", 24.0), ("h3", 18.72)];

const BOLD_TAGS: &[&str] = &["b", "strong", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Rule for text contrast
#[derive(Debug, Clone)]
pub struct ContrastRule {
    default_foreground: Option<Rgb>,
    default_background: Option<Rgb>,
    exempt_disabled_controls: bool,
}

impl Default for ContrastRule {
    fn default() -> Self {
        Self {
            default_foreground: None,
            default_background: None,
            exempt_disabled_controls: true,
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Foreground,
    Background,
}

impl Side {
    fn declared<'a>(&self, style: &'a StylePair) -> Option<&'a str> {
        match self {
            Side::Foreground => style.foreground.as_deref(),
            Side::Background => style.background.as_deref(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Side::Foreground => "foreground",
            Side::Background => "background",
        }
    }
}

enum Resolution {
    Color(Rgb),
    Invalid(InvalidColorError),
    Unknown,
}

impl ContrastRule {
    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        let parse = |value: &Option<String>| -> Result<Option<Rgb>> {
            Ok(value.as_deref().map(contrast::parse_color).transpose()?)
        };
        Ok(Self {
            default_foreground: parse(&config.default_foreground)?,
            default_background: parse(&config.default_background)?,
            exempt_disabled_controls: config.exempt_disabled_controls,
        })
    }

    fn resolve(&self, chain: &[&ElementNode], side: Side) -> Resolution {
        let declared = chain
            .iter()
            .rev()
            .filter_map(|n| n.style.as_ref())
            .filter_map(|s| side.declared(s))
            .find(|v| !contrast::is_indeterminate(v));

        match declared {
            Some(value) => match contrast::parse_color(value) {
                Ok(color) => Resolution::Color(color),
                Err(e) => Resolution::Invalid(e),
            },
            None => {
                let fallback = match side {
                    Side::Foreground => self.default_foreground,
                    Side::Background => self.default_background,
                };
                fallback.map_or(Resolution::Unknown, Resolution::Color)
            }
        }
    }

    fn unresolved(&self, page: &PageArtifact, visit: &Visit<'_>, side: Side, resolution: Resolution) -> Finding {
        let message = match resolution {
            Resolution::Invalid(e) => format!("Cannot evaluate contrast: invalid {} color ({})", side.name(), e),
            _ if page.external_stylesheets > 0 => format!(
                "Cannot evaluate contrast: no {} color declared in the page (it may come from {} external stylesheet(s))",
                side.name(),
                page.external_stylesheets
            ),
            _ => format!("Cannot evaluate contrast: no {} color declared", side.name()),
        };
        finding(UNRESOLVED_RULE_ID, Severity::Warning, visit.location(&page.id), &message)
            .with_wcag("1.4.3")
            .with_suggestion("Declare both color and background-color, or set audit defaults in the config")
    }
}

impl Rule for ContrastRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn description(&self) -> &'static str {
        "Text must meet 4.5:1 contrast (3:1 for large text) against its background (WCAG 1.4.3)"
    }

    fn check(&self, page: &PageArtifact) -> Vec<Finding> {
        let mut findings = Vec::new();

        for visit in page.walk() {
            if !visit.node.has_text() {
                continue;
            }
            let mut chain = visit.ancestors.clone();
            chain.push(visit.node);
            if !is_rendered(&chain) {
                continue;
            }

            let styled = chain
                .iter()
                .filter_map(|n| n.style.as_ref())
                .any(StylePair::declares_color);
            if !styled {
                continue;
            }
            if self.exempt_disabled_controls && is_exempt(&chain) {
                continue;
            }

            let foreground = match self.resolve(&chain, Side::Foreground) {
                Resolution::Color(c) => c,
                other => {
                    findings.push(self.unresolved(page, &visit, Side::Foreground, other));
                    continue;
                }
            };
            let background = match self.resolve(&chain, Side::Background) {
                Resolution::Color(c) => c,
                other => {
                    findings.push(self.unresolved(page, &visit, Side::Background, other));
                    continue;
                }
            };

            let size = text_size(&chain);
            let result = contrast::evaluate(foreground, background, size);
            if !result.passes {
                findings.push(
                    finding(
                        RULE_ID,
                        Severity::Error,
                        visit.location(&page.id),
                        &format!(
                            "Contrast ratio {:.2}:1 is below the AA minimum {:.1}:1 for {} text ({} on {})",
                            result.ratio, result.threshold, size, foreground, background
                        ),
                    )
                    .with_wcag("1.4.3")
                    .with_suggestion("Darken the text or lighten the background until the ratio meets the minimum"),
                );
            }
        }

        findings
    }
}

/// `<head>` content such as `<title>` is never painted on the page
fn is_rendered(chain: &[&ElementNode]) -> bool {
    !chain.iter().any(|n| n.tag == "head")
}

/// Disabled controls and hidden content have no contrast requirement
fn is_exempt(chain: &[&ElementNode]) -> bool {
    chain.iter().any(|n| {
        n.attributes.contains_key("disabled")
            || n.attributes.contains_key("hidden")
            || n.attr_is("aria-disabled", "true")
            || n.attr_is("aria-hidden", "true")
    })
}

fn text_size(chain: &[&ElementNode]) -> TextSize {
    let declared_size = chain
        .iter()
        .rev()
        .filter_map(|n| n.style.as_ref()?.font_size.as_deref())
        .find_map(contrast::parse_font_size_px);
    let heading_size = || {
        chain.iter().rev().find_map(|n| {
            HEADING_SIZES_PX
                .iter()
                .find(|(tag, _)| *tag == n.tag)
                .map(|(_, px)| *px)
        })
    };
    let size = declared_size.or_else(heading_size);

    let bold = match chain
        .iter()
        .rev()
        .find_map(|n| n.style.as_ref()?.font_weight.as_deref())
    {
        Some(weight) => contrast::is_bold_weight(weight),
        None => chain.iter().any(|n| BOLD_TAGS.contains(&n.tag.as_str())),
    };

    TextSize::classify(size, bold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_with(rule: &ContrastRule, body: &str) -> Vec<Finding> {
        let html = format!("<!DOCTYPE html><html><body>{}</body></html>", body);
        rule.check(&PageArtifact::parse("eng/rates.html", "en", html.into_bytes()))
    }

    fn check(body: &str) -> Vec<Finding> {
        check_with(&ContrastRule::default(), body)
    }

    #[test]
    fn test_sufficient_contrast() {
        let findings = check(r#"<p style="color: #000; background-color: #fff">Rates</p>"#);
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_insufficient_contrast() {
        let findings = check(r#"<p style="color: #777777; background-color: #ffffff">Rates</p>"#);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, RULE_ID);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("below the AA minimum 4.5:1 for normal text"));
        assert!(findings[0].message.ends_with("(#777777 on #ffffff)"));
    }

    #[test]
    fn test_large_text_threshold() {
        let body = r#"<p style="color: #949494; background: #fff; font-size: 24px">Big</p>
                      <p style="color: #949494; background: #fff">Small</p>"#;
        let findings = check(body);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.path.as_deref(), Some("html/body/p[2]"));
    }

    #[test]
    fn test_colors_resolve_through_ancestors() {
        let body = r#"<div style="background-color: #000000"><p style="color: #111111">Dark on dark</p></div>"#;
        let findings = check(body);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("#111111 on #000000"));
    }

    #[test]
    fn test_disabled_controls_are_exempt() {
        let body = r#"<button disabled style="color: #aaaaaa; background-color: #ffffff">Submit</button>
                      <span aria-disabled="true" style="color: #aaaaaa; background-color: #ffffff">Off</span>"#;
        assert!(check(body).is_empty());

        let strict = ContrastRule {
            exempt_disabled_controls: false,
            ..ContrastRule::default()
        };
        assert_eq!(check_with(&strict, body).len(), 2);
    }

    #[test]
    fn test_missing_background_is_unresolved() {
        let findings = check(r#"<p style="color: #777777">Text</p>"#);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, UNRESOLVED_RULE_ID);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(findings[0].message.contains("background"));
    }

    #[test]
    fn test_configured_default_background() {
        let config = AuditConfig {
            default_background: Some("#ffffff".to_string()),
            ..AuditConfig::default()
        };
        let rule = ContrastRule::from_config(&config).unwrap();
        let findings = check_with(&rule, r#"<p style="color: #777777">Text</p>"#);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, RULE_ID);
    }

    #[test]
    fn test_invalid_color_is_unresolved() {
        let findings = check(r#"<p style="color: blurple; background-color: #fff">Text</p>"#);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, UNRESOLVED_RULE_ID);
        assert!(findings[0].message.contains("blurple"));
    }

    #[test]
    fn test_invalid_default_in_config() {
        let config = AuditConfig {
            default_foreground: Some("rgb(0, 0, 999)".to_string()),
            ..AuditConfig::default()
        };
        assert!(ContrastRule::from_config(&config).is_err());
    }

    #[test]
    fn test_background_reset_resolves_to_ancestor() {
        let body = r#"<div style="background-color:#ffffff"><a style="color:#cccccc; background: none">Apply now</a></div>"#;
        let findings = check(body);
        assert_eq!(findings.len(), 1, "{:?}", findings);
        assert_eq!(findings[0].rule_id, RULE_ID);
        assert!(findings[0].message.ends_with("(#cccccc on #ffffff)"));

        let body = r#"<div style="background:#ffffff"><a style="color:#cccccc; background-color: none !important">Apply</a></div>"#;
        let findings = check(body);
        assert_eq!(findings.len(), 1, "{:?}", findings);
        assert_eq!(findings[0].rule_id, RULE_ID);
    }

    #[test]
    fn test_background_image_falls_through() {
        let body = r#"<section style="background-color: #000000">
                        <p style="color: #222222; background: url(hero.png) no-repeat">Dark</p>
                      </section>"#;
        let findings = check(body);
        assert_eq!(findings.len(), 1, "{:?}", findings);
        assert!(findings[0].message.contains("#222222 on #000000"));
    }

    #[test]
    fn test_head_content_is_not_checked() {
        let html = r#"<!DOCTYPE html><html><head><title>Rates</title>
            <style>html { color: #333333 } body { background: #ffffff }</style></head>
            <body><p>Readable</p></body></html>"#;
        let page = PageArtifact::parse("eng/rates.html", "en", html.as_bytes().to_vec());
        let findings = ContrastRule::default().check(&page);
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_unstyled_text_is_skipped() {
        assert!(check("<p>No declared colors</p>").is_empty());
    }
}
