//! PyApp source acquisition and the `build/` cache
//!
//! The PyApp source can come from three places, all normalized into one
//! extracted tree inside `build/`:
//!
//! - a release archive downloaded from GitHub (latest or a tag)
//! - a local `.tar.gz` archive, copied under the canonical archive name
//! - a local folder, copied once into `build/pyapp-local`
//!
//! Extraction is skipped when a tree with the archive's top-level name
//! already exists, so repeated runs never overwrite an extracted tree.

use crate::config::{PyAppVersion, PYAPP_LOCAL_TREE, PYAPP_TREE_PREFIX};
use crate::downloader::{self, Downloader};
use crate::error::{BoxError, BoxResult};
use crate::messages;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Where the PyApp source comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    /// Download from GitHub unless already cached
    Remote(PyAppVersion),
    /// Local `.tar.gz` archive
    LocalArchive(PathBuf),
    /// Local source folder
    LocalDir(PathBuf),
}

impl SourceOrigin {
    /// Classify a user-provided source, rejecting anything that is neither
    /// an existing `.tar.gz` file nor an existing directory
    pub fn from_local(path: impl AsRef<Path>) -> BoxResult<Self> {
        let path = path.as_ref();
        let is_archive = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".tar.gz"));

        if is_archive && path.is_file() {
            Ok(Self::LocalArchive(path.to_path_buf()))
        } else if path.is_dir() {
            Ok(Self::LocalDir(path.to_path_buf()))
        } else {
            Err(BoxError::Acquisition(format!(
                "invalid local pyapp source code `{}`. \
                 Please provide a valid folder or a .tar.gz archive.",
                path.display()
            )))
        }
    }

    /// Resolve CLI inputs: an optional local path wins over the version
    pub fn resolve(local: Option<&Path>, version: PyAppVersion) -> BoxResult<Self> {
        match local {
            Some(path) => Self::from_local(path),
            None => Ok(Self::Remote(version)),
        }
    }
}

/// The tree selected for this packaging run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
    /// Absolute path to the selected tree
    pub path: PathBuf,
    /// Other candidate trees that were passed over
    pub ignored: Vec<PathBuf>,
}

impl SourceTree {
    /// Tree directory name
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Warning to show when several versioned trees were found
    pub fn ambiguity_warning(&self) -> Option<String> {
        if self.ignored.is_empty() || self.name() == PYAPP_LOCAL_TREE {
            return None;
        }
        Some(format!(
            "Multiple pyapp versions were found. Using {}. \
             Consider cleaning the build folder with `box clean`.",
            self.name()
        ))
    }
}

/// PyApp source cache inside the project's `build/` folder
pub struct SourceCache {
    dir: PathBuf,
    downloader: Downloader,
}

impl SourceCache {
    /// Cache rooted at `build_dir`
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: build_dir.into(),
            downloader: Downloader::new(),
        }
    }

    /// Use a specific downloader
    pub fn with_downloader(mut self, downloader: Downloader) -> Self {
        self.downloader = downloader;
        self
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Obtain the PyApp source and select the tree to build from
    pub fn acquire(&self, origin: &SourceOrigin) -> BoxResult<SourceTree> {
        fs::create_dir_all(&self.dir)?;
        let local_tree = self.dir.join(PYAPP_LOCAL_TREE);

        match origin {
            SourceOrigin::LocalDir(src) => {
                if local_tree.exists() {
                    messages::info(format!(
                        "Local pyapp source already copied to {}. \
                         Clean the build folder with `box clean` to refresh it.",
                        local_tree.display()
                    ));
                } else {
                    info!(src = %src.display(), "Copying local pyapp source");
                    copy_dir(src, &local_tree)?;
                }
            }
            SourceOrigin::LocalArchive(src) => {
                let archive = self.dir.join(PyAppVersion::Latest.archive_name());
                if !same_file(src, &archive) {
                    fs::copy(src, &archive)?;
                }
                self.extract_once(&archive)?;
            }
            SourceOrigin::Remote(version) => {
                if local_tree.is_dir() {
                    debug!("Reusing {} without network access", local_tree.display());
                } else {
                    let archive = self.dir.join(version.archive_name());
                    if !archive.is_file() {
                        if let Err(e) = self
                            .downloader
                            .download_to(&version.source_url(), &archive)
                        {
                            warn!(error = %e, "PyApp source download failed");
                        }
                    }
                    if !archive.is_file() {
                        return Err(BoxError::Acquisition(
                            "no pyapp source code found. \
                             Please check your internet connection and try again."
                                .to_string(),
                        ));
                    }
                    self.extract_once(&archive)?;
                }
            }
        }

        let tree = self.select()?;
        if let Some(msg) = tree.ambiguity_warning() {
            warn!(selected = %tree.path.display(), "Multiple pyapp trees in cache");
            messages::warning(msg);
        }
        Ok(tree)
    }

    /// All `pyapp-*` directories currently in the cache, sorted by name
    pub fn candidates(&self) -> BoxResult<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if entry.file_type()?.is_dir() && name.to_string_lossy().starts_with(PYAPP_TREE_PREFIX)
            {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Pick the tree to build from
    ///
    /// `pyapp-local` always wins; otherwise the lexicographically greatest
    /// name is used.
    pub fn select(&self) -> BoxResult<SourceTree> {
        let mut candidates = self.candidates()?;

        let position = candidates
            .iter()
            .position(|p| p.file_name().is_some_and(|n| n == PYAPP_LOCAL_TREE))
            .or_else(|| candidates.len().checked_sub(1));

        let Some(position) = position else {
            return Err(BoxError::Acquisition(
                "no pyapp source code folder found. \
                 Consider cleaning your project with `box clean`."
                    .to_string(),
            ));
        };

        let selected = candidates.remove(position);
        let path = fs::canonicalize(&selected).unwrap_or(selected);
        Ok(SourceTree {
            path,
            ignored: candidates,
        })
    }

    /// Extract `archive` unless its top-level tree already exists
    fn extract_once(&self, archive: &Path) -> BoxResult<()> {
        let root = downloader::archive_root(archive)?.ok_or_else(|| {
            BoxError::Acquisition(format!(
                "pyapp source archive {} is empty. \
                 Consider cleaning your project with `box clean`.",
                archive.display()
            ))
        })?;

        if self.dir.join(&root).is_dir() {
            debug!(tree = %root, "Source tree already extracted, skipping");
            return Ok(());
        }

        downloader::extract_tar_gz(archive, &self.dir)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Recursively copy a directory
pub(crate) fn copy_dir(src: &Path, dest: &Path) -> BoxResult<()> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| BoxError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| BoxError::Acquisition(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
