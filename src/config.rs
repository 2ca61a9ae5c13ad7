// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration handling for compliancebot

use crate::error::{ComplianceError, Result};
use crate::locale::LocaleConfig;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Language profiles and the languages every page needs
    #[serde(default)]
    pub languages: LocaleConfig,

    /// Accessibility audit settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Locked asset settings
    #[serde(default)]
    pub assets: AssetConfig,

    /// Directory scan settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Check settings that serde cannot
    pub fn validate(&self) -> Result<()> {
        self.languages.validate()?;
        if self.languages.required.is_empty() {
            return Err(ComplianceError::Config(
                "languages.required must name at least one language".to_string(),
            ));
        }
        self.assets.glob_set()?;
        Ok(())
    }
}

/// Accessibility audit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Rule ids to skip
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    /// Text color assumed when none is declared (e.g. "#000000")
    #[serde(default)]
    pub default_foreground: Option<String>,

    /// Background assumed when none is declared (e.g. "#ffffff")
    #[serde(default)]
    pub default_background: Option<String>,

    /// Skip contrast checks for disabled and hidden elements
    #[serde(default = "default_true")]
    pub exempt_disabled_controls: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            disabled_rules: Vec::new(),
            default_foreground: None,
            default_background: None,
            exempt_disabled_controls: true,
        }
    }
}

/// Locked asset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Globs, relative to the scanned root, selecting locked assets
    #[serde(default = "default_locked_globs")]
    pub locked: Vec<String>,

    /// Baseline file, relative to the scanned root unless absolute
    #[serde(default = "default_baseline_path")]
    pub baseline: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            locked: default_locked_globs(),
            baseline: default_baseline_path(),
        }
    }
}

impl AssetConfig {
    /// Compile the locked globs
    pub fn glob_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.locked {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }

    /// Baseline location for a scan rooted at `root`
    pub fn baseline_path(&self, root: &Path) -> PathBuf {
        if self.baseline.is_absolute() {
            self.baseline.clone()
        } else {
            root.join(&self.baseline)
        }
    }
}

fn default_locked_globs() -> Vec<String> {
    vec!["common/**".to_string()]
}

fn default_baseline_path() -> PathBuf {
    PathBuf::from(".compliancebot/baseline.json")
}

/// Directory scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Page file extensions
    #[serde(default = "default_page_extensions")]
    pub extensions: Vec<String>,

    /// Directory names to skip
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Narrow the scan to a single `dNN/kNN` promo directory when one is found
    #[serde(default = "default_true")]
    pub auto_detect_root: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_page_extensions(),
            exclude: default_exclude(),
            auto_detect_root: true,
        }
    }
}

fn default_page_extensions() -> Vec<String> {
    vec!["html".to_string(), "htm".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec![
        ".git".to_string(),
        ".compliancebot".to_string(),
        "node_modules".to_string(),
        "target".to_string(),
        "vendor".to_string(),
    ]
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error), overridden by --verbose
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|e| e == "toml").unwrap_or(false)
}

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("Config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    let config: Config = if is_toml(path) {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    config.validate()?;
    debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Get the default config path for a site root
pub fn default_config_path() -> PathBuf {
    PathBuf::from(".compliancebot/config.yml")
}

/// Write default configuration to a file
pub fn write_default_config(path: &Path) -> Result<()> {
    let config = Config::default();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = if is_toml(path) {
        toml::to_string_pretty(&config).map_err(|e| ComplianceError::Config(e.to_string()))?
    } else {
        serde_yaml::to_string(&config)?
    };

    std::fs::write(path, content)?;
    Ok(())
}
