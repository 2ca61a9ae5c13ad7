// SPDX-License-Identifier: PMPL-1.0-or-later
//! Validation run orchestration.
//!
//! The accessibility auditor, asset integrity guard and locale parity checker
//! read the same inputs and never see each other's results, so they run in
//! parallel. The report is only built once all three have finished.

use crate::audit::Auditor;
use crate::config::Config;
use crate::error::{ComplianceError, Result};
use crate::integrity::{AssetBaseline, AssetIntegrityGuard, LockedAsset};
use crate::locale::LocaleParityChecker;
use crate::page::PageArtifact;
use crate::report::{self, ComplianceReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, info_span};

/// Run-wide cancellation flag, cheap to clone and share across threads
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one validation run looks at
#[derive(Debug, Clone, Default)]
pub struct ValidationInput {
    pub pages: Vec<PageArtifact>,
    pub locked_assets: Vec<LockedAsset>,
    pub baseline: AssetBaseline,
}

/// Validate a page set and produce a report
pub fn validate(input: &ValidationInput, config: &Config) -> Result<ComplianceReport> {
    validate_with_cancel(input, config, &CancelToken::new())
}

/// Like [`validate`], but stops with [`ComplianceError::Cancelled`] once
/// `cancel` is triggered. A cancelled run never returns a partial report.
pub fn validate_with_cancel(
    input: &ValidationInput,
    config: &Config,
    cancel: &CancelToken,
) -> Result<ComplianceReport> {
    let _span = info_span!("validate", pages = input.pages.len(), assets = input.locked_assets.len()).entered();

    if input.pages.is_empty() {
        return Err(ComplianceError::NoArtifacts);
    }
    config.validate()?;

    let auditor = Auditor::from_config(&config.audit, &config.languages)?;
    let guard = AssetIntegrityGuard::new(&input.baseline);
    let locale = LocaleParityChecker::new(config.languages.clone());

    let (accessibility, (integrity, parity)) = rayon::join(
        || auditor.audit_all(&input.pages, cancel),
        || {
            rayon::join(
                || guard.check_cancellable(&input.locked_assets, cancel),
                || locale.check_cancellable(&input.pages, cancel),
            )
        },
    );
    let (accessibility, integrity, parity) = (accessibility?, integrity?, parity?);
    if cancel.is_cancelled() {
        return Err(ComplianceError::Cancelled);
    }

    info!(
        accessibility = accessibility.len(),
        integrity = integrity.len(),
        locale = parity.len(),
        "Checks complete"
    );

    let report = report::aggregate(accessibility, integrity, parity)
        .with_pages(input.pages.iter().map(|p| p.id.as_str()));
    info!(status = %report.status, findings = report.findings.len(), "Report ready");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Category;
    use crate::report::RunStatus;

    fn page(path: &str, lang: &str, code: &str) -> PageArtifact {
        let html = format!(
            r#"<!DOCTYPE html>
<html lang="{lang}" class="no-js {code}">
<head>
  <meta charset="utf-8">
  <meta http-equiv="x-ua-compatible" content="ie=edge">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <meta http-equiv="Cache-Control" content="no-cache">
  <meta http-equiv="Pragma" content="no-cache">
  <meta http-equiv="Expires" content="0">
  <title>Home</title>
  <meta name="keywords" content="bank">
  <meta name="description" content="Home">
  <meta name="summary" content="Home">
</head>
<body><header>Bank</header><main><h1>Welcome</h1><img src="a.png" alt="Branch"></main><footer>Legal</footer></body>
</html>"#
        );
        PageArtifact::parse(path, lang, html.into_bytes())
    }

    fn clean_input() -> ValidationInput {
        ValidationInput {
            pages: vec![
                page("chi/index.html", "zh-Hant", "tc"),
                page("eng/index.html", "en", "en"),
                page("schi/index.html", "zh-Hans", "sc"),
            ],
            ..ValidationInput::default()
        }
    }

    #[test]
    fn test_clean_run_passes() {
        let report = validate(&clean_input(), &Config::default()).unwrap();
        assert!(report.findings.is_empty(), "{:?}", report.findings);
        assert_eq!(report.status, RunStatus::Pass);
    }

    #[test]
    fn test_no_artifacts() {
        let result = validate(&ValidationInput::default(), &Config::default());
        assert!(matches!(result, Err(ComplianceError::NoArtifacts)));
    }

    #[test]
    fn test_findings_from_every_checker() {
        let mut input = clean_input();
        input.pages.pop();
        input.locked_assets.push(LockedAsset::from_bytes("common/js/main.js", b"x".to_vec()));
        let mut missing_alt = page("eng/about.html", "en", "en");
        missing_alt.root = missing_alt.root.with_child(crate::page::ElementNode::new("img"));
        input.pages.push(missing_alt);

        let report = validate(&input, &Config::default()).unwrap();
        let categories: Vec<Category> = report.findings.iter().map(|f| f.category).collect();
        assert!(categories.contains(&Category::Accessibility));
        assert!(categories.contains(&Category::AssetIntegrity));
        assert!(categories.contains(&Category::LocaleParity));
        assert_eq!(report.status, RunStatus::Fail);
    }

    #[test]
    fn test_cancelled_run() {
        let cancel = CancelToken::new();
        cancel.clone().cancel();
        let result = validate_with_cancel(&clean_input(), &Config::default(), &cancel);
        assert!(matches!(result, Err(ComplianceError::Cancelled)));
    }
}
