//! Error types for box-packager

use std::path::PathBuf;
use thiserror::Error;

/// Result type for packaging operations
pub type BoxResult<T> = Result<T, BoxError>;

/// Errors that can occur while building, packaging or creating installers
#[derive(Error, Debug)]
pub enum BoxError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Format-preserving TOML edit error
    #[error("TOML edit error: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    /// Property list serialization error
    #[error("Property list error: {0}")]
    Plist(#[from] plist::Error),

    /// Interactive prompt failed
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// Configuration error (unknown builder, invalid values, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// `pyproject.toml` missing or malformed
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// PyApp source could not be obtained or resolved
    #[error("Error: {0}")]
    Acquisition(String),

    /// Network download failed
    #[error("Download error: {0}")]
    Download(String),

    /// External tool missing or failed
    #[error("Toolchain error: {0}")]
    Toolchain(String),

    /// A required earlier step has not been run
    #[error("{0}")]
    Precondition(String),

    /// Installer script template failed to render
    #[error("Template error: {0}")]
    Template(String),

    /// Installer assembly failed
    #[error("Installer error: {0}")]
    Installer(String),

    /// Icon file not found
    #[error("No icon file found in {root}. Please provide an icon file in an `assets` folder. Valid formats are {formats}.")]
    IconNotFound {
        /// Project root that was searched
        root: PathBuf,
        /// Comma separated list of accepted suffixes
        formats: String,
    },
}
