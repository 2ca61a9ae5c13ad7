// SPDX-License-Identifier: PMPL-1.0-or-later
//! Finding types shared by every checker.
//!
//! A finding carries enough location data to be ordered deterministically:
//! the page (or asset) it refers to, the pre-order index of the element
//! within the page tree, and a byte offset for raw-content findings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Severity levels for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the release
    Error,
    /// Should be addressed, never changes pass/fail
    Warning,
}

impl Severity {
    /// Whether this severity fails a run
    pub fn blocks_release(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// Which checker produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Accessibility auditor
    Accessibility,
    /// Locked asset integrity guard
    AssetIntegrity,
    /// Locale parity checker
    LocaleParity,
}

impl Category {
    /// All categories in report order
    pub const ALL: [Category; 3] = [
        Category::Accessibility,
        Category::AssetIntegrity,
        Category::LocaleParity,
    ];

    /// Stable machine name
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Accessibility => "accessibility",
            Category::AssetIntegrity => "asset-integrity",
            Category::LocaleParity => "locale-parity",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a finding points
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Page id or asset path
    pub page: String,
    /// Slash-separated element path inside the page tree, e.g. `html/body/main/img[2]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Pre-order index of the element in the page tree
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_index: Option<usize>,
    /// Byte offset into raw content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<u64>,
}

impl Location {
    /// Location of a whole page or asset
    pub fn page(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            ..Self::default()
        }
    }

    /// Document order: page, then element, then byte offset.
    /// Page-level locations (no node) sort before any element of that page.
    pub fn document_order(&self, other: &Self) -> Ordering {
        self.page
            .cmp(&other.page)
            .then_with(|| self.node_index.cmp(&other.node_index))
            .then_with(|| self.byte_offset.cmp(&other.byte_offset))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.page)?;
        if let Some(ref path) = self.path {
            write!(f, " @ {}", path)?;
        }
        if let Some(offset) = self.byte_offset {
            write!(f, " +{}", offset)?;
        }
        Ok(())
    }
}

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule identifier (e.g. "alt-text", "asset-modified")
    pub rule_id: String,
    /// Checker that produced it
    pub category: Category,
    /// Severity level
    pub severity: Severity,
    /// Element or asset the finding is about
    pub target: String,
    /// Detailed message
    pub message: String,
    /// Position in the page set
    pub location: Location,
    /// Suggested fix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// WCAG success criterion, e.g. "1.4.3"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wcag_criterion: Option<String>,
}

impl Finding {
    /// Create a new finding located at `location`.
    ///
    /// The target defaults to the page-qualified location so that identical
    /// findings on different pages stay distinct.
    pub fn new(
        rule_id: &str,
        category: Category,
        severity: Severity,
        location: Location,
        message: &str,
    ) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            category,
            severity,
            target: location.to_string(),
            message: message.to_string(),
            location,
            suggestion: None,
            wcag_criterion: None,
        }
    }

    /// Set the target explicitly
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    /// Set suggestion
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    /// Set the WCAG criterion
    pub fn with_wcag(mut self, criterion: &str) -> Self {
        self.wcag_criterion = Some(criterion.to_string());
        self
    }

    /// Identity used for deduplication
    pub fn dedup_key(&self) -> (&str, &str, &str) {
        (&self.rule_id, &self.target, &self.message)
    }
}
