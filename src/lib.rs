//! Box - Package Python Projects with PyApp
//!
//! This crate turns a Python project described by a `pyproject.toml` into a
//! standalone executable and, optionally, a platform installer.
//!
//! # How It Works
//!
//! The executable is a [PyApp](https://github.com/ofek/pyapp) binary. PyApp
//! is a Rust project configured entirely through `PYAPP_*` environment
//! variables at compile time, so packaging a project means:
//!
//! 1. Build a source distribution with the project's build tool
//! 2. Acquire the PyApp source code (download, local archive or folder)
//! 3. Compose the `PYAPP_*` variables from `pyproject.toml`
//! 4. Run `cargo build --release` in the PyApp tree with those variables
//! 5. Move the binary to `target/release/<project name>`
//!
//! # Quick Start
//!
//! ```bash
//! # Configure the project once
//! box init
//!
//! # Build target/release/<name>
//! box package
//!
//! # Wrap it into an installer for the current OS
//! box installer
//! ```
//!
//! ## Configuration (pyproject.toml)
//!
//! ```toml
//! [project]
//! name = "my-app"
//! version = "0.1.0"
//!
//! [tool.box]
//! builder = "hatch"
//! app_entry = "my_app:run"
//! entry_type = "spec"
//! python_version = "3.12"
//! is_gui = false
//!
//! [tool.box.env-vars]
//! PYAPP_FULL_ISOLATION = "1"
//! ```
//!
//! # Installers
//!
//! | OS      | CLI project        | GUI project                    |
//! |---------|--------------------|--------------------------------|
//! | Linux   | self-extracting sh | self-extracting sh with icon   |
//! | Windows | NSIS `.exe`        | NSIS `.exe` with shortcuts     |
//! | macOS   | `.pkg`             | `.dmg` with an `.app` bundle   |

pub mod builder;
pub mod cleaner;
pub mod compile;
mod config;
pub mod downloader;
pub mod env_vars;
pub mod environment;
mod error;
pub mod icon;
pub mod init;
pub mod installer;
pub mod linux;
pub mod macos;
mod manifest;
pub mod messages;
pub mod nsis;
mod packager;
pub mod progress;
pub mod source;

pub use builder::{BuildBackend, BUILDERS};
pub use cleaner::{CleanOptions, CleanReport, Cleaner};
pub use compile::Compiler;
pub use config::{
    ProjectLayout, PyAppVersion, BUILD_DIR_NAME, DIST_DIR_NAME, PYAPP_ENV_PREFIX,
    RELEASE_DIR_NAME,
};
pub use downloader::Downloader;
pub use env_vars::VariableType;
pub use environment::BuildEnvironment;
pub use error::{BoxError, BoxResult};
pub use icon::{find_icon, IconFormat};
pub use init::{InitOptions, InitSettings, Initializer, Prompter};
pub use installer::{InstallerBuilder, InstallerPlan, Mode, Platform};
pub use manifest::{
    default_python_version, EntryCandidate, EntryType, ManifestWriter, ProjectManifest,
    ENV_VARS_TABLE, MANIFEST_FILE, PYTHON_VERSIONS,
};
pub use packager::{PackageOutput, Packager};
pub use progress::{ProgressExt, ProgressStyles};
pub use source::{SourceCache, SourceOrigin, SourceTree};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
