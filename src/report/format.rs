// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report rendering.
//!
//! Supports multiple output formats:
//! - Text: human-readable findings grouped by checker
//! - JSON: the full report for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration
//! - HTML: a standalone page for reviewers, grouped by checker and page

use super::{ComplianceReport, RunStatus};
use crate::finding::{Category, Finding, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI integration
    Sarif,
    /// Standalone HTML page
    Html,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Sarif => write!(f, "sarif"),
            OutputFormat::Html => write!(f, "html"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            "html" => Ok(OutputFormat::Html),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render a report
pub fn generate_report(report: &ComplianceReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(report),
        OutputFormat::Json => generate_json_report(report),
        OutputFormat::Sarif => generate_sarif_report(report),
        OutputFormat::Html => generate_html_report(report),
    }
}

fn generate_text_report(report: &ComplianceReport) -> String {
    let mut output = String::new();

    output.push_str("=== Compliancebot Report ===\n");
    output.push_str(&format!(
        "Generated: {}\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for summary in &report.summary.categories {
        output.push_str(&format!(
            "{:<16} {}  ({} error(s), {} warning(s))\n",
            summary.category.as_str(),
            if summary.passed { "PASS" } else { "FAIL" },
            summary.errors,
            summary.warnings
        ));
    }
    let pages = &report.summary.pages;
    output.push_str(&format!(
        "Pages: {} checked, {} passed, {} failed\n\n",
        pages.total, pages.passed, pages.failed
    ));

    if report.findings.is_empty() {
        output.push_str("No compliance issues found. All checks passed.\n");
        return output;
    }

    for category in Category::ALL {
        let findings: Vec<_> = report.by_category(category).collect();
        if findings.is_empty() {
            continue;
        }

        output.push_str(&format!("--- {} ({}) ---\n", category, findings.len()));

        for finding in findings {
            output.push_str(&format!(
                "{} [{}] {}\n",
                finding.severity, finding.rule_id, finding.message
            ));
            output.push_str(&format!("  Location: {}\n", finding.location));

            if let Some(ref criterion) = finding.wcag_criterion {
                output.push_str(&format!("  WCAG: {}\n", criterion));
            }

            if let Some(ref suggestion) = finding.suggestion {
                output.push_str(&format!("  Fix: {}\n", suggestion));
            }

            output.push('\n');
        }
    }

    match report.status {
        RunStatus::Fail => output.push_str(&format!(
            "RESULT: FAIL ({} error(s), {} warning(s))\n",
            report.summary.errors, report.summary.warnings
        )),
        RunStatus::Pass if report.summary.warnings > 0 => {
            output.push_str("RESULT: PASS WITH WARNINGS\n")
        }
        RunStatus::Pass => output.push_str("RESULT: PASS\n"),
    }

    output
}

fn generate_json_report(report: &ComplianceReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize report: {}\"}}", e)
    })
}

fn generate_html_report(report: &ComplianceReport) -> String {
    let pages = &report.summary.pages;
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>Compliancebot Report</title>\n");
    out.push_str("<style>.error { color: #a40000; } .warning { color: #6b4e00; } .pass { color: #1b5e20; }</style>\n");
    out.push_str("</head>\n<body>\n<main>\n");

    out.push_str("<h1>Compliancebot Report</h1>\n");
    out.push_str(&format!(
        "<p>Generated {}. Result: <strong class=\"{}\">{}</strong></p>\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        if report.blocks_release() { "error" } else { "pass" },
        report.status.to_string().to_uppercase()
    ));
    out.push_str("<ul>\n");
    out.push_str(&format!(
        "<li>Pages: {} checked, {} passed, {} failed</li>\n",
        pages.total, pages.passed, pages.failed
    ));
    for summary in &report.summary.categories {
        out.push_str(&format!(
            "<li>{}: <span class=\"{}\">{}</span> ({} error(s), {} warning(s))</li>\n",
            summary.category,
            if summary.passed { "pass" } else { "error" },
            if summary.passed { "PASS" } else { "FAIL" },
            summary.errors,
            summary.warnings
        ));
    }
    out.push_str("</ul>\n");

    for category in Category::ALL {
        let findings: Vec<_> = report.by_category(category).collect();
        if findings.is_empty() {
            continue;
        }
        out.push_str(&format!("<section>\n<h2>{} ({})</h2>\n", category, findings.len()));

        let mut by_page: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
        for finding in findings {
            by_page.entry(finding.location.page.as_str()).or_default().push(finding);
        }
        for (page, findings) in by_page {
            out.push_str(&format!("<h3>{}</h3>\n", escape_html(page)));
            out.push_str("<table>\n");
            out.push_str("<thead><tr><th>Severity</th><th>Rule</th><th>Element</th><th>Message</th><th>WCAG</th><th>Fix</th></tr></thead>\n");
            out.push_str("<tbody>\n");
            for f in findings {
                let level = match f.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };
                out.push_str(&format!("<tr class=\"{}\">", level));
                out.push_str(&format!("<td>{}</td>", f.severity));
                out.push_str(&format!("<td>{}</td>", escape_html(&f.rule_id)));
                out.push_str(&format!(
                    "<td>{}</td>",
                    f.location.path.as_deref().map(escape_html).unwrap_or_default()
                ));
                out.push_str(&format!("<td>{}</td>", escape_html(&f.message)));
                out.push_str(&format!(
                    "<td>{}</td>",
                    f.wcag_criterion.as_deref().map(escape_html).unwrap_or_default()
                ));
                out.push_str(&format!(
                    "<td>{}</td>",
                    f.suggestion.as_deref().map(escape_html).unwrap_or_default()
                ));
                out.push_str("</tr>\n");
            }
            out.push_str("</tbody>\n</table>\n");
        }
        out.push_str("</section>\n");
    }

    if report.findings.is_empty() {
        out.push_str("<p>No compliance issues found. All checks passed.</p>\n");
    }

    out.push_str("</main>\n</body>\n</html>\n");
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// SARIF report structure (simplified)
#[derive(Debug, Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    #[serde(rename = "informationUri")]
    information_uri: String,
}

#[derive(Debug, Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
    properties: SarifProperties,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
    #[serde(rename = "logicalLocations", skip_serializing_if = "Vec::is_empty")]
    logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Debug, Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<SarifRegion>,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
struct SarifRegion {
    #[serde(rename = "byteOffset")]
    byte_offset: u64,
}

#[derive(Debug, Serialize)]
struct SarifLogicalLocation {
    #[serde(rename = "fullyQualifiedName")]
    fully_qualified_name: String,
    kind: String,
}

#[derive(Debug, Serialize)]
struct SarifProperties {
    category: Category,
    #[serde(rename = "wcagCriterion", skip_serializing_if = "Option::is_none")]
    wcag_criterion: Option<String>,
}

fn generate_sarif_report(report: &ComplianceReport) -> String {
    let results: Vec<SarifResult> = report
        .findings
        .iter()
        .map(|f| {
            let level = match f.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };

            let logical_locations = f
                .location
                .path
                .iter()
                .map(|path| SarifLogicalLocation {
                    fully_qualified_name: path.clone(),
                    kind: "element".to_string(),
                })
                .collect();

            SarifResult {
                rule_id: f.rule_id.clone(),
                level: level.to_string(),
                message: SarifMessage { text: f.message.clone() },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifactLocation {
                            uri: f.location.page.clone(),
                        },
                        region: f.location.byte_offset.map(|o| SarifRegion { byte_offset: o }),
                    },
                    logical_locations,
                }],
                properties: SarifProperties {
                    category: f.category,
                    wcag_criterion: f.wcag_criterion.clone(),
                },
            }
        })
        .collect();

    let sarif = SarifReport {
        schema: "https://json.schemastore.org/sarif-2.1.0.json".to_string(),
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "compliancebot".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    information_uri: "https://github.com/hyperpolymath/compliancebot".to_string(),
                },
            },
            results,
        }],
    };

    serde_json::to_string_pretty(&sarif).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize SARIF report: {}\"}}", e)
    })
}
