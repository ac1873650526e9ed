//! Fixed project layout and PyApp constants
//!
//! All paths are resolved against an explicit project root so that the
//! packager never changes the working directory of the process.

use std::path::{Path, PathBuf};

/// Folder holding the Python source distribution
pub const DIST_DIR_NAME: &str = "dist";

/// Folder holding the PyApp source cache
pub const BUILD_DIR_NAME: &str = "build";

/// Folder holding the final binary and installers
pub const RELEASE_DIR_NAME: &str = "target/release";

/// Prefix of every environment variable PyApp reads at build time
pub const PYAPP_ENV_PREFIX: &str = "PYAPP";

/// Prefix of extracted PyApp source trees in the cache
pub const PYAPP_TREE_PREFIX: &str = "pyapp-";

/// Name of the tree copied from a local source folder
pub const PYAPP_LOCAL_TREE: &str = "pyapp-local";

/// Cached archive name for the latest PyApp release
pub const PYAPP_ARCHIVE_NAME: &str = "pyapp-source.tar.gz";

/// Download URL of the latest PyApp source release
pub const PYAPP_SOURCE_LATEST: &str =
    "https://github.com/ofek/pyapp/releases/latest/download/source.tar.gz";

/// Executable PyApp produces inside its source tree
pub const PYAPP_BINARY_PATH: &str = "target/release/pyapp";

/// Which PyApp release to build against
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PyAppVersion {
    /// Whatever `releases/latest` points to
    #[default]
    Latest,
    /// A tagged release such as `v0.22.0`
    Tag(String),
}

impl PyAppVersion {
    /// Parse a CLI value, `latest` (any case) or empty maps to [`PyAppVersion::Latest`]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("latest") {
            Self::Latest
        } else if value.starts_with('v') {
            Self::Tag(value.to_string())
        } else {
            Self::Tag(format!("v{}", value))
        }
    }

    /// Release download URL
    pub fn source_url(&self) -> String {
        match self {
            Self::Latest => PYAPP_SOURCE_LATEST.to_string(),
            Self::Tag(tag) => {
                format!("https://github.com/ofek/pyapp/releases/download/{tag}/source.tar.gz")
            }
        }
    }

    /// File name of the cached archive for this version
    pub fn archive_name(&self) -> String {
        match self {
            Self::Latest => PYAPP_ARCHIVE_NAME.to_string(),
            Self::Tag(tag) => format!("pyapp-source-{tag}.tar.gz"),
        }
    }
}

/// Directory layout of a box project
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Layout rooted at the given project directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at the current working directory
    pub fn current() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    /// Project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `dist/`
    pub fn dist_dir(&self) -> PathBuf {
        self.root.join(DIST_DIR_NAME)
    }

    /// `build/`
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR_NAME)
    }

    /// `target/release/`
    pub fn release_dir(&self) -> PathBuf {
        self.root.join(RELEASE_DIR_NAME)
    }

    /// `target/`
    pub fn target_dir(&self) -> PathBuf {
        self.root.join("target")
    }
}
