//! Python source distribution builders
//!
//! Each supported backend is a fixed argv template that writes an sdist into
//! the project's `dist/` folder. The `custom` backend runs the user's
//! `build_command` through the platform shell instead.

use crate::error::{BoxError, BoxResult};
use crate::manifest::ProjectManifest;
use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::str::FromStr;

/// Identifiers accepted for `[tool.box].builder`
pub const BUILDERS: &[&str] = &["rye", "hatch", "pdm", "build", "flit", "custom"];

/// Backend that produces the source distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildBackend {
    /// `rye build`
    Rye,
    /// `hatch build`
    Hatch,
    /// `pdm build`
    Pdm,
    /// `python -m build`
    Build,
    /// `flit build`
    Flit,
    /// User-provided shell command
    Custom(String),
}

impl BuildBackend {
    /// Backend configured in the manifest
    pub fn from_manifest(manifest: &ProjectManifest) -> BoxResult<Self> {
        match manifest.builder()? {
            "custom" => {
                let command = manifest.build_command().ok_or_else(|| {
                    BoxError::Config(
                        "The `custom` builder requires a `build_command` in [tool.box]."
                            .to_string(),
                    )
                })?;
                Ok(Self::Custom(command.to_string()))
            }
            other => other.parse(),
        }
    }

    /// Identifier as stored in `pyproject.toml`
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rye => "rye",
            Self::Hatch => "hatch",
            Self::Pdm => "pdm",
            Self::Build => "build",
            Self::Flit => "flit",
            Self::Custom(_) => "custom",
        }
    }

    /// Command line for this backend writing into `dist`
    ///
    /// `Custom` yields the platform shell invocation.
    pub fn argv(&self, dist: &Path) -> Vec<String> {
        let dist = dist.to_string_lossy();
        let dist: &str = &dist;
        let argv: Vec<&str> = match self {
            Self::Rye => vec!["rye", "build", "--out", dist, "--sdist"],
            Self::Hatch => vec!["hatch", "build", "-t", "sdist", dist],
            Self::Pdm => vec!["pdm", "build", "--no-wheel", "-d", dist],
            Self::Build => vec![
                python_launcher(),
                "-m",
                "build",
                "--sdist",
                "--outdir",
                dist,
            ],
            Self::Flit => vec!["flit", "build", "--format", "sdist"],
            Self::Custom(cmd) => {
                if cfg!(windows) {
                    vec!["cmd", "/C", cmd.as_str()]
                } else {
                    vec!["sh", "-c", cmd.as_str()]
                }
            }
        };
        argv.into_iter().map(String::from).collect()
    }

    /// Build the sdist for the project at `root`
    ///
    /// Child output is discarded unless `verbose` is set.
    pub fn run(&self, root: &Path, verbose: bool) -> BoxResult<()> {
        let dist = root.join(crate::config::DIST_DIR_NAME);
        let argv = self.argv(&dist);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| BoxError::Config("Empty build command".to_string()))?;

        tracing::info!(
            builder = %self,
            command = %argv.join(" "),
            "Building source distribution"
        );

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(root);
        if !verbose {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let status = cmd.status().map_err(|e| {
            BoxError::Toolchain(format!("Failed to run builder `{}`: {}", program, e))
        })?;

        if !status.success() {
            return Err(BoxError::Toolchain(format!(
                "Builder `{}` failed (exit code {:?}). Run with `-v` to see its output.",
                self,
                status.code()
            )));
        }

        Ok(())
    }
}

impl fmt::Display for BuildBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildBackend {
    type Err = BoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rye" => Ok(Self::Rye),
            "hatch" => Ok(Self::Hatch),
            "pdm" => Ok(Self::Pdm),
            "build" => Ok(Self::Build),
            "flit" => Ok(Self::Flit),
            "custom" => Err(BoxError::Config(
                "The `custom` builder requires a build command.".to_string(),
            )),
            other => Err(BoxError::Config(format!(
                "Unknown builder '{}'. Valid builders are: {}",
                other,
                BUILDERS.join(", ")
            ))),
        }
    }
}

/// `py` on Windows when the launcher is installed, `python` otherwise
fn python_launcher() -> &'static str {
    if cfg!(windows) && which::which("py").is_ok() {
        "py"
    } else {
        "python"
    }
}
