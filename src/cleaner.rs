//! `box clean`: remove build outputs from the project folder
//!
//! The flags are "clean only" options. Without any flag `dist/`, `build/`
//! and `target/` are all removed.

use crate::config::{ProjectLayout, BUILD_DIR_NAME, DIST_DIR_NAME, PYAPP_TREE_PREFIX};
use crate::error::{BoxError, BoxResult};
use crate::messages;
use std::fs;
use std::path::PathBuf;

/// Which parts of the project to clean
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanOptions {
    /// `dist/`
    pub dist: bool,
    /// `build/`
    pub build: bool,
    /// `target/`
    pub target: bool,
    /// Cached PyApp source archives in `build/`
    pub source_pyapp: bool,
    /// Extracted `pyapp-*` trees in `build/`
    pub pyapp_folder: bool,
}

impl CleanOptions {
    /// No flag set
    pub fn is_empty(&self) -> bool {
        !(self.dist || self.build || self.target || self.source_pyapp || self.pyapp_folder)
    }
}

/// What a clean run removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Top-level folders removed
    pub folders: Vec<String>,
    /// Source archives removed from `build/`
    pub archives: Vec<String>,
    /// Number of `pyapp-*` trees removed
    pub trees: usize,
    /// Cleaning was requested without flags
    pub whole_project: bool,
}

impl CleanReport {
    /// Whether anything was removed
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.archives.is_empty() && self.trees == 0
    }

    /// Message summarizing the run
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "Nothing to clean.".to_string();
        }
        if self.whole_project {
            return "The whole project was cleaned.".to_string();
        }

        let mut lines = Vec::new();
        if !self.folders.is_empty() {
            lines.push(format!("Folder(s) {} cleaned.", self.folders.join(", ")));
        }
        let mut build_items = self.archives.clone();
        if self.trees > 0 {
            build_items.push("pyapp folder(s)".to_string());
        }
        if !build_items.is_empty() {
            lines.push(format!("{} cleaned.", build_items.join(", ")));
        }
        lines.join("\n")
    }
}

/// Removes build outputs below a project root
pub struct Cleaner {
    layout: ProjectLayout,
    folders: Vec<&'static str>,
    options: CleanOptions,
}

impl Cleaner {
    /// Cleaner for `layout` with the given flags
    ///
    /// `source_pyapp` and `pyapp_folder` take precedence over `build`.
    pub fn new(layout: ProjectLayout, options: CleanOptions) -> Self {
        let mut folders = Vec::new();
        if options.is_empty() {
            folders = vec![DIST_DIR_NAME, BUILD_DIR_NAME, "target"];
        } else {
            let keeps_build = options.source_pyapp || options.pyapp_folder;
            if keeps_build && options.build {
                messages::info("Build folder flag `-b`, `--build` ignored.");
            }
            if options.dist {
                folders.push(DIST_DIR_NAME);
            }
            if options.build && !keeps_build {
                folders.push(BUILD_DIR_NAME);
            }
            if options.target {
                folders.push("target");
            }
        }

        Self {
            layout,
            folders,
            options,
        }
    }

    /// Top-level folders this cleaner removes
    pub fn folders(&self) -> &[&'static str] {
        &self.folders
    }

    /// Remove everything selected
    pub fn clean(&self) -> BoxResult<CleanReport> {
        let mut report = CleanReport {
            whole_project: self.options.is_empty(),
            ..CleanReport::default()
        };

        for folder in &self.folders {
            let path = self.layout.root().join(folder);
            if path.exists() {
                fs::remove_dir_all(&path)?;
                tracing::debug!(folder = %path.display(), "Removed");
                report.folders.push(folder.to_string());
            }
        }

        if self.options.source_pyapp {
            for archive in self.source_archives()? {
                fs::remove_file(&archive)?;
                if let Some(name) = archive.file_name() {
                    report.archives.push(name.to_string_lossy().into_owned());
                }
            }
        }

        if self.options.pyapp_folder {
            for tree in self.pyapp_trees()? {
                fs::remove_dir_all(&tree)?;
                report.trees += 1;
            }
        }

        Ok(report)
    }

    fn source_archives(&self) -> BoxResult<Vec<PathBuf>> {
        let pattern = format!(
            "{}/pyapp-source*.tar.gz",
            glob::Pattern::escape(&self.layout.build_dir().to_string_lossy())
        );
        let paths = glob::glob(&pattern)
            .map_err(|e| BoxError::Config(format!("Invalid pattern {}: {}", pattern, e)))?;
        Ok(paths.filter_map(Result::ok).filter(|p| p.is_file()).collect())
    }

    fn pyapp_trees(&self) -> BoxResult<Vec<PathBuf>> {
        let build = self.layout.build_dir();
        if !build.is_dir() {
            return Ok(Vec::new());
        }
        let mut trees = Vec::new();
        for entry in fs::read_dir(&build)? {
            let entry = entry?;
            if entry.file_type()?.is_dir()
                && entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with(PYAPP_TREE_PREFIX)
            {
                trees.push(entry.path());
            }
        }
        Ok(trees)
    }
}
