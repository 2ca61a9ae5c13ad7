// SPDX-License-Identifier: PMPL-1.0-or-later
//! Locale parity checker.
//!
//! Pages are published in every required language. Artifacts are grouped by
//! a page id derived from their path (the language directory is dropped), and
//! each group is checked for missing variants, duplicate variants, a
//! consistent `<html lang>`/class code, and matching section structure.

use crate::audit::landmarks::section_outline;
use crate::engine::CancelToken;
use crate::error::{ComplianceError, Result};
use crate::finding::{Category, Finding, Location, Severity};
use crate::page::PageArtifact;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

pub const MISSING_RULE_ID: &str = "locale-missing";
pub const COLLISION_RULE_ID: &str = "locale-collision";
pub const STRUCTURE_RULE_ID: &str = "landmark-structure";
pub const CONSISTENCY_RULE_ID: &str = "language-consistency";

/// One supported language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageProfile {
    /// BCP 47 tag, e.g. `zh-Hant`
    pub tag: String,
    /// Other names used for the language in paths, e.g. `chi`
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Code used in `<html class>`, e.g. `tc`
    pub class_code: String,
}

impl LanguageProfile {
    pub fn new(tag: &str, aliases: &[&str], class_code: &str) -> Self {
        Self {
            tag: tag.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            class_code: class_code.to_string(),
        }
    }

    /// Whether `name` is this language's tag or one of its aliases, ignoring case
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        self.tag.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// Languages known to the validator and which of them every page needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub profiles: Vec<LanguageProfile>,
    /// Tags of the languages every page must exist in
    pub required: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            profiles: vec![
                LanguageProfile::new("zh-Hant", &["zh-hant", "chi", "tc"], "tc"),
                LanguageProfile::new("en", &["en", "eng"], "en"),
                LanguageProfile::new("zh-Hans", &["zh-hans", "schi", "sc"], "sc"),
            ],
            required: vec!["zh-Hant".to_string(), "en".to_string(), "zh-Hans".to_string()],
        }
    }
}

impl LocaleConfig {
    /// Profile for a tag or alias
    pub fn profile(&self, name: &str) -> Option<&LanguageProfile> {
        self.profiles.iter().find(|p| p.matches(name))
    }

    /// Like [`profile`](Self::profile) but unknown names are an error
    pub fn resolve(&self, name: &str) -> Result<&LanguageProfile> {
        self.profile(name)
            .ok_or_else(|| ComplianceError::UnknownLanguage(name.to_string()))
    }

    /// Every required language must have a profile
    pub fn validate(&self) -> Result<()> {
        for tag in &self.required {
            self.resolve(tag)?;
        }
        Ok(())
    }
}

/// Language-independent identity of a page, e.g. `home` for `/zh-hant/home.html`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageId(String);

impl PageId {
    /// Derive the page id from an artifact path.
    ///
    /// Separators are normalised to `/`, the first segment naming a configured
    /// language is dropped, and a trailing `.html`/`.htm` is removed.
    pub fn derive(path: &str, profiles: &[LanguageProfile]) -> PageId {
        let normalised = path.replace('\\', "/");
        let mut dropped = false;
        let segments: Vec<&str> = normalised
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .filter(|s| {
                if !dropped && profiles.iter().any(|p| p.matches(s)) {
                    dropped = true;
                    return false;
                }
                true
            })
            .collect();

        let mut id = segments.join("/");
        for ext in [".html", ".htm"] {
            if id.len() > ext.len() && id.to_ascii_lowercase().ends_with(ext) {
                id.truncate(id.len() - ext.len());
                break;
            }
        }
        PageId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The language a path belongs to, from its first language directory
pub fn language_from_path<'a>(path: &str, profiles: &'a [LanguageProfile]) -> Option<&'a LanguageProfile> {
    path.replace('\\', "/")
        .split('/')
        .find_map(|segment| profiles.iter().find(|p| p.matches(segment)))
}

/// All language variants of one page
#[derive(Debug, Clone)]
pub struct LocaleSet<'a> {
    pub page_id: PageId,
    /// Artifacts in input order
    pub artifacts: Vec<&'a PageArtifact>,
}

impl<'a> LocaleSet<'a> {
    /// Artifacts whose language is `profile`
    pub fn variants<'s>(&'s self, profile: &'s LanguageProfile) -> impl Iterator<Item = &'a PageArtifact> + 's {
        self.artifacts
            .iter()
            .copied()
            .filter(move |a| profile.matches(&a.language))
    }
}

/// Checks every page exists, once, in every required language
pub struct LocaleParityChecker {
    config: LocaleConfig,
}

impl LocaleParityChecker {
    pub fn new(config: LocaleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocaleConfig {
        &self.config
    }

    /// Group artifacts into locale sets, ordered by page id
    pub fn group<'a>(&self, pages: &'a [PageArtifact]) -> Vec<LocaleSet<'a>> {
        let mut sets: BTreeMap<PageId, Vec<&'a PageArtifact>> = BTreeMap::new();
        for page in pages {
            sets.entry(PageId::derive(&page.id, &self.config.profiles))
                .or_default()
                .push(page);
        }
        sets.into_iter()
            .map(|(page_id, artifacts)| LocaleSet { page_id, artifacts })
            .collect()
    }

    /// Check all pages; cancellation yields an empty result
    pub fn check(&self, pages: &[PageArtifact]) -> Vec<Finding> {
        self.check_cancellable(pages, &CancelToken::new())
            .unwrap_or_default()
    }

    pub fn check_cancellable(&self, pages: &[PageArtifact], cancel: &CancelToken) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for set in self.group(pages) {
            if cancel.is_cancelled() {
                return Err(ComplianceError::Cancelled);
            }
            let before = findings.len();
            self.check_set(&set, &mut findings);
            debug!(
                page_id = %set.page_id,
                variants = set.artifacts.len(),
                findings = findings.len() - before,
                "Checked locale set"
            );
        }
        Ok(findings)
    }

    fn required_profiles(&self) -> impl Iterator<Item = &LanguageProfile> {
        self.config
            .required
            .iter()
            .filter_map(|tag| self.config.profile(tag))
    }

    fn check_set(&self, set: &LocaleSet<'_>, findings: &mut Vec<Finding>) {
        for profile in self.required_profiles() {
            let variants: Vec<&PageArtifact> = set.variants(profile).collect();
            match variants.len() {
                0 => {
                    let error = ComplianceError::MissingArtifact {
                        page_id: set.page_id.to_string(),
                        language: profile.tag.clone(),
                    };
                    findings.push(
                        Finding::new(
                            MISSING_RULE_ID,
                            Category::LocaleParity,
                            Severity::Error,
                            Location::page(set.page_id.as_str()),
                            &error.to_string(),
                        )
                        .with_suggestion(&format!("Publish the {} version of this page", profile.tag)),
                    );
                }
                1 => {}
                n => {
                    let paths: Vec<&str> = variants.iter().map(|a| a.id.as_str()).collect();
                    findings.push(Finding::new(
                        COLLISION_RULE_ID,
                        Category::LocaleParity,
                        Severity::Error,
                        Location::page(variants[1].id.as_str()),
                        &format!(
                            "Page '{}' has {} '{}' variants: {}",
                            set.page_id,
                            n,
                            profile.tag,
                            paths.join(", ")
                        ),
                    ));
                }
            }
        }

        for artifact in &set.artifacts {
            self.check_language(artifact, findings);
        }

        self.check_structure(set, findings);
    }

    /// `<html lang>` and the class code must agree with the artifact's language
    fn check_language(&self, artifact: &PageArtifact, findings: &mut Vec<Finding>) {
        let mut report = |message: String| {
            findings.push(
                Finding::new(
                    CONSISTENCY_RULE_ID,
                    Category::LocaleParity,
                    Severity::Error,
                    Location::page(artifact.id.as_str()),
                    &message,
                )
                .with_wcag("3.1.1"),
            );
        };

        let Some(profile) = self.config.profile(&artifact.language) else {
            report(format!(
                "Page language '{}' is not a configured language",
                artifact.language
            ));
            return;
        };
        let Some(html) = artifact.html_element() else {
            return;
        };

        if let Some(lang) = html.attr("lang").map(str::trim).filter(|l| !l.is_empty()) {
            if !profile.matches(lang) {
                report(format!(
                    "<html lang=\"{}\"> does not match the page language {}",
                    lang, profile.tag
                ));
            }
        }

        if let Some(class) = html.attr("class").filter(|c| !c.trim().is_empty()) {
            if !class.split_whitespace().any(|c| c == profile.class_code) {
                report(format!(
                    "<html class=\"{}\"> is missing the language code '{}' for {}",
                    class.trim(),
                    profile.class_code,
                    profile.tag
                ));
            }
        }
    }

    /// Each variant's top-level section sequence must match the reference language
    fn check_structure(&self, set: &LocaleSet<'_>, findings: &mut Vec<Finding>) {
        let Some(reference) = self
            .config
            .profiles
            .iter()
            .find_map(|p| set.variants(p).next())
        else {
            return;
        };
        let expected = section_outline(reference);

        for artifact in &set.artifacts {
            if std::ptr::eq(*artifact, reference) {
                continue;
            }
            let actual = section_outline(artifact);
            if actual != expected {
                findings.push(
                    Finding::new(
                        STRUCTURE_RULE_ID,
                        Category::LocaleParity,
                        Severity::Warning,
                        Location::page(artifact.id.as_str()),
                        &format!(
                            "Section structure of {} [{}] differs from {} [{}]",
                            artifact.id,
                            actual.join(", "),
                            reference.id,
                            expected.join(", ")
                        ),
                    )
                    .with_suggestion("Keep the same header, nav, main, section and footer layout in every language"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles() -> Vec<LanguageProfile> {
        LocaleConfig::default().profiles
    }

    fn page(path: &str, lang: &str, body: &str) -> PageArtifact {
        let code = LocaleConfig::default()
            .profile(lang)
            .map(|p| p.class_code.clone())
            .unwrap_or_default();
        let html = format!(
            r#"<!DOCTYPE html><html lang="{}" class="no-js {}"><body>{}</body></html>"#,
            lang, code, body
        );
        PageArtifact::parse(path, lang, html.into_bytes())
    }

    const LAYOUT: &str = "<header>H</header><main>M</main><footer>F</footer>";

    #[test]
    fn test_page_id_derivation() {
        let p = profiles();
        assert_eq!(PageId::derive("/zh-hant/home", &p).as_str(), "home");
        assert_eq!(PageId::derive("/en/home", &p).as_str(), "home");
        assert_eq!(PageId::derive("eng/deposit/rates.html", &p).as_str(), "deposit/rates");
        assert_eq!(PageId::derive(r"d25\k01\chi\index.htm", &p).as_str(), "d25/k01/index");
        assert_eq!(PageId::derive("SCHI/Index.HTML", &p).as_str(), "Index");
        // only the first language segment is dropped
        assert_eq!(PageId::derive("en/guides/en/intro.html", &p).as_str(), "guides/en/intro");
    }

    #[test]
    fn test_language_from_path() {
        let p = profiles();
        assert_eq!(language_from_path("promo/schi/index.html", &p).map(|l| l.tag.as_str()), Some("zh-Hans"));
        assert!(language_from_path("promo/index.html", &p).is_none());
    }

    #[test]
    fn test_complete_set_is_clean() {
        let pages = vec![
            page("chi/home.html", "zh-Hant", LAYOUT),
            page("eng/home.html", "en", LAYOUT),
            page("schi/home.html", "zh-Hans", LAYOUT),
        ];
        let findings = LocaleParityChecker::new(LocaleConfig::default()).check(&pages);
        assert!(findings.is_empty(), "{:?}", findings);
    }

    #[test]
    fn test_missing_language() {
        let mut pages = vec![
            page("chi/home.html", "zh-Hant", LAYOUT),
            page("schi/home.html", "zh-Hans", LAYOUT),
        ];
        let checker = LocaleParityChecker::new(LocaleConfig::default());
        let findings = checker.check(&pages);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, MISSING_RULE_ID);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("'en'"));

        pages.push(page("eng/home.html", "en", LAYOUT));
        assert!(checker.check(&pages).is_empty());
    }

    #[test]
    fn test_collision() {
        let pages = vec![
            page("chi/home.html", "zh-Hant", LAYOUT),
            page("eng/home.html", "en", LAYOUT),
            page("en/home.html", "en", LAYOUT),
            page("schi/home.html", "zh-Hans", LAYOUT),
        ];
        let findings = LocaleParityChecker::new(LocaleConfig::default()).check(&pages);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, COLLISION_RULE_ID);
        assert!(findings[0].message.contains("eng/home.html, en/home.html"));
    }

    #[test]
    fn test_structure_mismatch_names_both_paths() {
        let config = LocaleConfig {
            required: vec!["zh-Hant".to_string(), "en".to_string()],
            ..LocaleConfig::default()
        };
        let pages = vec![
            page("/zh-hant/home", "zh-Hant", LAYOUT),
            page("/en/home", "en", "<header>H</header><main>M</main>"),
        ];
        let findings = LocaleParityChecker::new(config).check(&pages);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.rule_id, STRUCTURE_RULE_ID);
        assert_eq!(f.category, Category::LocaleParity);
        assert_eq!(f.severity, Severity::Warning);
        assert!(f.message.contains("/zh-hant/home"));
        assert!(f.message.contains("/en/home"));
    }

    #[test]
    fn test_language_consistency() {
        let wrong_lang = PageArtifact::parse(
            "eng/home.html",
            "en",
            br#"<!DOCTYPE html><html lang="zh-hant" class="no-js tc"><body></body></html>"#.to_vec(),
        );
        let config = LocaleConfig {
            required: vec!["en".to_string()],
            ..LocaleConfig::default()
        };
        let findings = LocaleParityChecker::new(config).check(&[wrong_lang]);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.rule_id == CONSISTENCY_RULE_ID));
    }

    #[test]
    fn test_cancelled_check() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let checker = LocaleParityChecker::new(LocaleConfig::default());
        let result = checker.check_cancellable(&[page("eng/a.html", "en", LAYOUT)], &cancel);
        assert!(matches!(result, Err(ComplianceError::Cancelled)));
    }

    #[test]
    fn test_unknown_required_language() {
        let config = LocaleConfig {
            required: vec!["fr".to_string()],
            ..LocaleConfig::default()
        };
        assert!(matches!(config.validate(), Err(ComplianceError::UnknownLanguage(_))));
    }
}
