// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for compliancebot

use crate::contrast::InvalidColorError;
use thiserror::Error;

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, ComplianceError>;

/// Main error type for compliancebot
///
/// Rule-level problems (bad colours, unreadable assets, missing translations)
/// are normally captured as findings. They only surface through this type when
/// a caller uses the lower-level APIs directly.
#[derive(Error, Debug)]
pub enum ComplianceError {
    #[error("Invalid color: {0}")]
    InvalidColor(#[from] InvalidColorError),

    #[error("Missing artifact: page '{page_id}' has no '{language}' variant")]
    MissingArtifact { page_id: String, language: String },

    #[error("Cannot fingerprint {path}: {reason}")]
    FingerprintCompute { path: String, reason: String },

    #[error("No page artifacts supplied; nothing to validate")]
    NoArtifacts,

    #[error("Baseline already records {path} as {existing}; refusing to replace it with {proposed}")]
    BaselineConflict {
        path: String,
        existing: String,
        proposed: String,
    },

    #[error("Unknown language '{0}'")]
    UnknownLanguage(String),

    #[error("Validation run cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),
}
