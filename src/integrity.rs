// SPDX-License-Identifier: PMPL-1.0-or-later
//! Locked asset integrity guard.
//!
//! Common production assets (shared scripts, stylesheets, images) are locked:
//! once released they must stay byte-identical. Each asset is fingerprinted
//! with SHA-256 and compared against a baseline that is maintained outside the
//! validation run. The guard only reads the baseline; recording new entries is
//! a separate administrative step.

use crate::engine::CancelToken;
use crate::error::{ComplianceError, Result};
use crate::finding::{Category, Finding, Location, Severity};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MODIFIED_RULE_ID: &str = "asset-modified";
pub const UNBASELINED_RULE_ID: &str = "asset-unbaselined";
pub const UNREADABLE_RULE_ID: &str = "asset-unreadable";
pub const MISSING_RULE_ID: &str = "asset-missing";

const PREFIX: &str = "sha256:";

/// Content fingerprint, `sha256:<hex>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint raw bytes
    pub fn of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Fingerprint(format!("{}{}", PREFIX, hex::encode(hasher.finalize())))
    }

    /// Parse a stored `sha256:<64 hex digits>` value
    pub fn parse(value: &str) -> Result<Self> {
        let digest = value.trim().strip_prefix(PREFIX).unwrap_or_default();
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ComplianceError::Config(format!(
                "invalid fingerprint '{}': expected sha256:<64 hex digits>",
                value
            )));
        }
        Ok(Fingerprint(format!("{}{}", PREFIX, digest.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = ComplianceError;

    fn try_from(value: String) -> Result<Self> {
        Fingerprint::parse(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> String {
        fingerprint.0
    }
}

/// Where a locked asset's bytes come from
#[derive(Debug, Clone)]
pub enum AssetSource {
    /// Already in memory
    Bytes(Vec<u8>),
    /// Read on demand
    File(PathBuf),
}

/// An asset whose content must not change after release
#[derive(Debug, Clone)]
pub struct LockedAsset {
    /// Path relative to the site root, `/`-separated; the baseline key
    pub path: String,
    pub source: AssetSource,
}

impl LockedAsset {
    pub fn from_bytes(path: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            source: AssetSource::Bytes(content),
        }
    }

    pub fn from_file(path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: AssetSource::File(file.into()),
        }
    }

    /// Fingerprint the current content
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        match &self.source {
            AssetSource::Bytes(content) => Ok(Fingerprint::of(content)),
            AssetSource::File(file) => {
                let content = std::fs::read(file).map_err(|e| ComplianceError::FingerprintCompute {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Fingerprint::of(&content))
            }
        }
    }
}

/// Recorded fingerprints of locked assets, keyed by path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBaseline {
    #[serde(default)]
    assets: BTreeMap<String, Fingerprint>,
}

impl AssetBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint every asset into a fresh baseline
    pub fn record(assets: &[LockedAsset]) -> Result<Self> {
        let fingerprints: Vec<(String, Fingerprint)> = assets
            .par_iter()
            .map(|asset| -> Result<(String, Fingerprint)> { Ok((asset.path.clone(), asset.fingerprint()?)) })
            .collect::<Result<_>>()?;

        let mut baseline = Self::new();
        for (path, fingerprint) in fingerprints {
            baseline.establish(&path, fingerprint)?;
        }
        Ok(baseline)
    }

    /// Add an entry. Re-establishing the same fingerprint is a no-op; a
    /// different fingerprint for a recorded path is a conflict.
    pub fn establish(&mut self, path: &str, fingerprint: Fingerprint) -> Result<()> {
        match self.assets.get(path) {
            Some(existing) if *existing != fingerprint => Err(ComplianceError::BaselineConflict {
                path: path.to_string(),
                existing: existing.to_string(),
                proposed: fingerprint.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.assets.insert(path.to_string(), fingerprint);
                Ok(())
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&Fingerprint> {
        self.assets.get(path)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fingerprint)> {
        self.assets.iter().map(|(p, f)| (p.as_str(), f))
    }

    /// Load a JSON baseline file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let baseline: AssetBaseline = serde_json::from_str(&content)?;
        debug!(path = %path.display(), entries = baseline.len(), "Loaded asset baseline");
        Ok(baseline)
    }

    /// Write the baseline as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Compares locked assets against a baseline
pub struct AssetIntegrityGuard<'a> {
    baseline: &'a AssetBaseline,
}

impl<'a> AssetIntegrityGuard<'a> {
    pub fn new(baseline: &'a AssetBaseline) -> Self {
        Self { baseline }
    }

    /// Check all assets; cancellation yields an empty result
    pub fn check(&self, assets: &[LockedAsset]) -> Vec<Finding> {
        self.check_cancellable(assets, &CancelToken::new())
            .unwrap_or_default()
    }

    /// Fingerprint assets in parallel. Findings follow input order, then
    /// baseline entries with no matching asset in path order.
    pub fn check_cancellable(&self, assets: &[LockedAsset], cancel: &CancelToken) -> Result<Vec<Finding>> {
        let per_asset: Option<Vec<Option<Finding>>> = assets
            .par_iter()
            .map(|asset| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(self.check_asset(asset))
            })
            .collect();
        let Some(per_asset) = per_asset.filter(|_| !cancel.is_cancelled()) else {
            return Err(ComplianceError::Cancelled);
        };

        let mut findings: Vec<Finding> = per_asset.into_iter().flatten().collect();
        for (path, expected) in self.baseline.iter() {
            if !assets.iter().any(|a| a.path == path) {
                findings.push(
                    finding(
                        MISSING_RULE_ID,
                        Severity::Error,
                        path,
                        &format!("Locked asset {} ({}) is missing", path, expected),
                    )
                    .with_suggestion("Restore the released file; locked assets must not be removed"),
                );
            }
        }
        Ok(findings)
    }

    fn check_asset(&self, asset: &LockedAsset) -> Option<Finding> {
        let actual = match asset.fingerprint() {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                warn!(path = %asset.path, error = %e, "Locked asset unreadable");
                return Some(finding(UNREADABLE_RULE_ID, Severity::Error, &asset.path, &e.to_string()));
            }
        };

        match self.baseline.get(&asset.path) {
            None => Some(
                finding(
                    UNBASELINED_RULE_ID,
                    Severity::Warning,
                    &asset.path,
                    &format!("Locked asset {} has no baseline entry ({})", asset.path, actual),
                )
                .with_suggestion("Record it with `compliancebot baseline` once the release is approved"),
            ),
            Some(expected) if *expected != actual => Some(
                finding(
                    MODIFIED_RULE_ID,
                    Severity::Error,
                    &asset.path,
                    &format!(
                        "Locked asset {} was modified: baseline {}, found {}",
                        asset.path, expected, actual
                    ),
                )
                .with_suggestion("Revert the change; put new behaviour in a page-specific file instead"),
            ),
            Some(_) => None,
        }
    }
}

fn finding(rule_id: &str, severity: Severity, path: &str, message: &str) -> Finding {
    Finding::new(rule_id, Category::AssetIntegrity, severity, Location::page(path), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MAIN_JS: &[u8] = b"$(function () { initMenu(); });\n";

    #[test]
    fn test_fingerprint_format() {
        let fp = Fingerprint::of(b"");
        assert_eq!(
            fp.as_str(),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(Fingerprint::parse(fp.as_str()).unwrap(), fp);
        assert!(Fingerprint::parse("md5:abc").is_err());
    }

    #[test]
    fn test_unchanged_asset_has_no_findings() {
        let assets = vec![LockedAsset::from_bytes("common/js/main.js", MAIN_JS.to_vec())];
        let baseline = AssetBaseline::record(&assets).unwrap();
        assert!(AssetIntegrityGuard::new(&baseline).check(&assets).is_empty());
    }

    #[test]
    fn test_no_op_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("main.js");
        std::fs::write(&file, MAIN_JS).unwrap();
        let assets = vec![LockedAsset::from_file("common/js/main.js", &file)];

        let baseline_path = dir.path().join("baseline.json");
        AssetBaseline::record(&assets).unwrap().save(&baseline_path).unwrap();

        // rewrite identical bytes
        let content = std::fs::read(&file).unwrap();
        std::fs::write(&file, content).unwrap();

        let baseline = AssetBaseline::load(&baseline_path).unwrap();
        assert!(AssetIntegrityGuard::new(&baseline).check(&assets).is_empty());
    }

    #[test]
    fn test_modified_asset() {
        let mut baseline = AssetBaseline::new();
        baseline.establish("common/js/main.js", Fingerprint::of(MAIN_JS)).unwrap();
        let assets = vec![LockedAsset::from_bytes("common/js/main.js", b"tampered".to_vec())];

        let findings = AssetIntegrityGuard::new(&baseline).check(&assets);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, MODIFIED_RULE_ID);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains(Fingerprint::of(MAIN_JS).as_str()));
        assert!(findings[0].message.contains(Fingerprint::of(b"tampered").as_str()));
    }

    #[test]
    fn test_unbaselined_unreadable_and_missing() {
        let mut baseline = AssetBaseline::new();
        baseline.establish("common/css/old.css", Fingerprint::of(b"a{}")).unwrap();
        let assets = vec![
            LockedAsset::from_bytes("common/img/logo.png", vec![0x89, 0x50]),
            LockedAsset::from_file("common/js/gone.js", "/nonexistent/compliancebot/gone.js"),
        ];

        let findings = AssetIntegrityGuard::new(&baseline).check(&assets);
        let rules: Vec<_> = findings.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(rules, vec![UNBASELINED_RULE_ID, UNREADABLE_RULE_ID, MISSING_RULE_ID]);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[2].target, "common/css/old.css");
    }

    #[test]
    fn test_establish_never_overwrites() {
        let mut baseline = AssetBaseline::new();
        baseline.establish("a.js", Fingerprint::of(b"1")).unwrap();
        baseline.establish("a.js", Fingerprint::of(b"1")).unwrap();
        let err = baseline.establish("a.js", Fingerprint::of(b"2")).unwrap_err();
        assert!(matches!(err, ComplianceError::BaselineConflict { .. }));
        assert_eq!(baseline.get("a.js"), Some(&Fingerprint::of(b"1")));
    }

    #[test]
    fn test_cancelled_check() {
        let baseline = AssetBaseline::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = AssetIntegrityGuard::new(&baseline)
            .check_cancellable(&[LockedAsset::from_bytes("a.js", vec![])], &cancel);
        assert!(matches!(result, Err(ComplianceError::Cancelled)));
    }
}
