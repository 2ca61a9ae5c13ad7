// SPDX-License-Identifier: PMPL-1.0-or-later
//! Directory scanner that turns a built site into validation input.
//!
//! Walks the site root, loads pages and assigns each one a language from its
//! path (falling back to `<html lang>`), collects locked assets by glob, and
//! loads the asset baseline if one exists.

use crate::config::Config;
use crate::engine::ValidationInput;
use crate::error::Result;
use crate::integrity::{AssetBaseline, LockedAsset};
use crate::locale::language_from_path;
use crate::page::PageArtifact;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

fn promo_root_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|/)d\d{2}/k\d{2}$").expect("valid regex"))
}

/// Site-relative path with `/` separators
fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn walk<'a>(dir: &Path, config: &'a Config) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| {
            let name = e.file_name().to_str().unwrap_or("");
            !(e.depth() > 0 && e.file_type().is_dir() && config.scan.exclude.iter().any(|x| x == name))
        })
        .filter_map(|entry| entry.ok())
}

/// Find the single `dNN/kNN` promo directory under `dir`, if there is exactly one
pub fn detect_page_root(dir: &Path, config: &Config) -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = walk(dir, config)
        .filter(|e| e.file_type().is_dir())
        .filter(|e| promo_root_regex().is_match(&relative_path(dir, e.path())))
        .map(|e| e.into_path())
        .collect();

    match candidates.as_slice() {
        [single] => Some(single.clone()),
        [] => None,
        many => {
            info!("Found {} promo directories, scanning the whole site", many.len());
            None
        }
    }
}

/// Scan a site directory into validation input
pub fn scan_directory(dir: &Path, config: &Config) -> Result<ValidationInput> {
    let locked = config.assets.glob_set()?;
    let profiles = &config.languages.profiles;
    let page_root = if config.scan.auto_detect_root {
        detect_page_root(dir, config).unwrap_or_else(|| dir.to_path_buf())
    } else {
        dir.to_path_buf()
    };

    info!("Scanning directory: {} (pages under {})", dir.display(), page_root.display());

    let mut input = ValidationInput::default();

    for entry in walk(dir, config) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let rel = relative_path(dir, path);

        if locked.is_match(&rel) {
            input.locked_assets.push(LockedAsset::from_file(rel, path));
            continue;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !config.scan.extensions.iter().any(|x| x.eq_ignore_ascii_case(&ext)) {
            continue;
        }
        if !path.starts_with(&page_root) {
            continue;
        }

        let content = match std::fs::read(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let from_path = language_from_path(&rel, profiles).map(|p| p.tag.clone());
        let page = PageArtifact::parse(rel, from_path.clone().unwrap_or_default(), content);
        let language = from_path.or_else(|| {
            page.html_element()
                .and_then(|html| html.attr("lang"))
                .and_then(|lang| config.languages.profile(lang))
                .map(|p| p.tag.clone())
        });

        match language {
            Some(language) => input.pages.push(PageArtifact { language, ..page }),
            None => warn!("Skipping {}: cannot determine its language", page.id),
        }
    }

    let baseline_path = config.assets.baseline_path(dir);
    if baseline_path.exists() {
        input.baseline = AssetBaseline::load(&baseline_path)?;
    } else {
        info!("No asset baseline at {}", baseline_path.display());
    }

    info!(
        "Found {} pages and {} locked assets",
        input.pages.len(),
        input.locked_assets.len()
    );

    Ok(input)
}
