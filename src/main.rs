// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compliancebot CLI - WCAG 2.1 AA, locked asset and locale parity gate

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use compliancebot::audit::{self, Auditor};
use compliancebot::config::{self, Config};
use compliancebot::contrast::{self, TextSize};
use compliancebot::integrity::{self, AssetBaseline};
use compliancebot::locale;
use compliancebot::report::{generate_report, OutputFormat};
use compliancebot::{engine, scanner};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Compliance gate for static multi-language pages
#[derive(Parser)]
#[command(name = "compliancebot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a built site
    Check {
        /// Site root to scan
        dir: PathBuf,

        /// Config file (default: <dir>/.compliancebot/config.yml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Record fingerprints of the locked assets as the new baseline
    Baseline {
        /// Site root to scan
        dir: PathBuf,

        /// Config file (default: <dir>/.compliancebot/config.yml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Replace an existing baseline file
        #[arg(long)]
        force: bool,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Compute the contrast ratio of two colors
    Contrast {
        /// Text color, e.g. "#777777"
        foreground: String,

        /// Background color, e.g. "white"
        background: String,

        /// Font size in CSS units, e.g. "18pt" or "24px"
        #[arg(long)]
        font_size: Option<String>,

        /// Text is bold
        #[arg(long)]
        bold: bool,
    },

    /// List the rules compliancebot checks
    Rules,

    /// Write a default configuration file
    Init {
        /// Site root
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Write TOML instead of YAML
        #[arg(long)]
        toml: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI
    Sarif,
    /// Standalone HTML page for reviewers
    Html,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Sarif => OutputFormat::Sarif,
            FormatArg::Html => OutputFormat::Html,
        }
    }
}

fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("compliancebot=debug")
    } else {
        EnvFilter::new(format!("compliancebot={}", level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(dir: &Path, path: Option<PathBuf>) -> anyhow::Result<Config> {
    let path = path.unwrap_or_else(|| dir.join(config::default_config_path()));
    config::load_config(&path).with_context(|| format!("loading {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { dir, config, format, output, verbose } => {
            let config = load(&dir, config)?;
            init_logging(verbose, &config.log.level);

            let input = scanner::scan_directory(&dir, &config)?;
            let report = engine::validate(&input, &config)?;
            write_output(&generate_report(&report, format.into()), output.as_deref())?;

            if report.blocks_release() {
                std::process::exit(1);
            }
        }

        Commands::Baseline { dir, config, force, verbose } => {
            let config = load(&dir, config)?;
            init_logging(verbose, &config.log.level);

            let path = config.assets.baseline_path(&dir);
            if path.exists() && !force {
                bail!(
                    "{} already exists; locked assets are never re-baselined silently (use --force)",
                    path.display()
                );
            }

            let input = scanner::scan_directory(&dir, &config)?;
            let baseline = AssetBaseline::record(&input.locked_assets)?;
            baseline.save(&path)?;
            eprintln!("Recorded {} locked asset(s) in {}", baseline.len(), path.display());
        }

        Commands::Contrast { foreground, background, font_size, bold } => {
            let fg = contrast::parse_color(&foreground)?;
            let bg = contrast::parse_color(&background)?;
            let px = font_size.as_deref().and_then(contrast::parse_font_size_px);
            let size = TextSize::classify(px, bold);
            let result = contrast::evaluate(fg, bg, size);

            println!(
                "{} on {}: {:.2}:1 (AA {} text needs {:.1}:1) {}",
                fg,
                bg,
                result.ratio,
                size,
                result.threshold,
                if result.passes { "PASS" } else { "FAIL" }
            );
            if !result.passes {
                std::process::exit(1);
            }
        }

        Commands::Rules => {
            let auditor = Auditor::with_default_rules();
            println!("accessibility:");
            for rule in auditor.rules() {
                println!("  {:<22} {}", rule.id(), rule.description());
            }
            println!(
                "  {:<22} Color pair could not be evaluated (warning)",
                audit::contrast::UNRESOLVED_RULE_ID
            );
            println!("asset-integrity:");
            for (id, description) in [
                (integrity::MODIFIED_RULE_ID, "Locked asset differs from its baseline fingerprint"),
                (integrity::UNBASELINED_RULE_ID, "Locked asset has no baseline entry (warning)"),
                (integrity::UNREADABLE_RULE_ID, "Locked asset could not be read"),
                (integrity::MISSING_RULE_ID, "Baselined asset no longer exists"),
            ] {
                println!("  {:<22} {}", id, description);
            }
            println!("locale-parity:");
            for (id, description) in [
                (locale::MISSING_RULE_ID, "Page is missing a required language"),
                (locale::COLLISION_RULE_ID, "Page has two variants in one language"),
                (locale::CONSISTENCY_RULE_ID, "<html lang> or class code disagrees with the page language"),
                (locale::STRUCTURE_RULE_ID, "Section layout differs between languages (warning)"),
            ] {
                println!("  {:<22} {}", id, description);
            }
        }

        Commands::Init { dir, toml, force } => {
            let mut path = dir.join(config::default_config_path());
            if toml {
                path.set_extension("toml");
            }
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config::write_default_config(&path)?;
            eprintln!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Report written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
