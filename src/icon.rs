//! Icon discovery for GUI installers
//!
//! Icons live in an `assets` folder anywhere in the project, named `icon`
//! with one of the supported extensions. Build output folders (`build`,
//! `dist`, `target`, `venv`) and hidden folders are never searched.
//!
//! Without an explicit format the first of `svg`, `png`, `jpg`, `jpeg` wins.
//! Windows (`ico`) and macOS (`icns`) icons must be requested explicitly.

use crate::error::{BoxError, BoxResult};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Folders skipped while searching for `assets`
const EXCLUDED_DIRS: &[&str] = &["build", "dist", "target", "venv"];

/// Folder name that holds the icon
const ASSETS_DIR: &str = "assets";

/// Icon file stem
const ICON_STEM: &str = "icon";

/// Supported icon formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconFormat {
    Svg,
    Png,
    Jpeg,
    Ico,
    Icns,
}

impl IconFormat {
    /// Extensions tried when no format is requested, in order
    pub const DEFAULT_SUFFIXES: &'static [&'static str] = &["svg", "png", "jpg", "jpeg"];

    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "ico" => Some(Self::Ico),
            "icns" => Some(Self::Icns),
            _ => None,
        }
    }

    /// Detect format from magic bytes
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG magic: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(Self::Png);
        }

        // JPEG magic: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // ICO magic: 00 00 01 00
        if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
            return Some(Self::Ico);
        }

        if data.starts_with(b"icns") {
            return Some(Self::Icns);
        }

        let text = String::from_utf8_lossy(data);
        let text = text.trim_start_matches('\u{feff}').trim_start();
        if text.starts_with("<svg") || text.starts_with("<?xml") {
            return Some(Self::Svg);
        }

        None
    }
}

/// Find the project icon below `root`
///
/// `suffix` restricts the search to one extension (`"ico"`, `"icns"`, ...).
pub fn find_icon(root: &Path, suffix: Option<&str>) -> BoxResult<PathBuf> {
    let suffixes: Vec<&str> = match suffix {
        Some(s) => vec![s.trim_start_matches('.')],
        None => IconFormat::DEFAULT_SUFFIXES.to_vec(),
    };

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e));

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_dir() || entry.file_name() != ASSETS_DIR {
            continue;
        }

        for ext in &suffixes {
            let candidate = entry.path().join(format!("{}.{}", ICON_STEM, ext));
            if candidate.is_file() {
                check_format(&candidate, ext);
                tracing::debug!(icon = %candidate.display(), "Found icon");
                return Ok(candidate);
            }
        }
    }

    Err(BoxError::IconNotFound {
        root: root.to_path_buf(),
        formats: suffixes.join(", "),
    })
}

fn is_excluded(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || EXCLUDED_DIRS.contains(&&*name)
}

/// Warn when the icon content does not match its extension
fn check_format(path: &Path, ext: &str) {
    let mut header = [0u8; 64];
    let read = File::open(path).and_then(|mut f| f.read(&mut header));
    let Ok(n) = read else {
        return;
    };

    let expected = IconFormat::from_extension(ext);
    let actual = IconFormat::from_bytes(&header[..n]);
    if actual.is_some() && actual != expected {
        tracing::warn!(
            icon = %path.display(),
            expected = ?expected,
            actual = ?actual,
            "Icon content does not match its extension"
        );
    }
}
