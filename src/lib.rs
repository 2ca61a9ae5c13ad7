// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compliancebot - release gate for static multi-language banking pages
//!
//! Validates a built page set before it ships:
//!
//! - **Accessibility** (WCAG 2.1 AA): contrast, alt text, heading order,
//!   landmarks, document skeleton and required meta tags
//! - **Asset integrity**: locked common assets must match their recorded
//!   SHA-256 fingerprints
//! - **Locale parity**: every page exists once in each required language
//!   (`zh-Hant`, `en`, `zh-Hans` by default) with the same section layout
//!
//! The three checks run in parallel and their findings are merged into one
//! deterministic [`ComplianceReport`].
//!
//! ```no_run
//! use compliancebot::{config, engine, scanner};
//! use std::path::Path;
//!
//! let site = Path::new("build");
//! let config = config::load_config(&site.join(config::default_config_path()))?;
//! let input = scanner::scan_directory(site, &config)?;
//! let report = engine::validate(&input, &config)?;
//! println!("{}", report.status);
//! # Ok::<(), compliancebot::ComplianceError>(())
//! ```

pub mod audit;
pub mod config;
pub mod contrast;
pub mod engine;
pub mod error;
pub mod finding;
pub mod integrity;
pub mod locale;
pub mod page;
pub mod report;
pub mod scanner;

pub use audit::{Auditor, Rule};
pub use config::Config;
pub use contrast::{contrast_ratio, evaluate, parse_color, relative_luminance, Rgb, TextSize};
pub use engine::{validate, validate_with_cancel, CancelToken, ValidationInput};
pub use error::{ComplianceError, Result};
pub use finding::{Category, Finding, Location, Severity};
pub use integrity::{AssetBaseline, AssetIntegrityGuard, Fingerprint, LockedAsset};
pub use locale::{LanguageProfile, LocaleConfig, LocaleParityChecker, PageId};
pub use page::{ElementNode, PageArtifact};
pub use report::{ComplianceReport, OutputFormat, PageSummary, RunStatus};
