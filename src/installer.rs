//! Installer assembly
//!
//! The installer depends on the operating system and on whether the project
//! is a GUI or a CLI application:
//!
//! | OS      | CLI                 | GUI                          |
//! |---------|---------------------|------------------------------|
//! | Linux   | `-linux.sh`         | `-linux.sh` with icon        |
//! | Windows | `-win.exe` (NSIS)   | `-win.exe` with start menu   |
//! | macOS   | `-macos.pkg`        | `-macos.dmg` with `.app`     |
//!
//! Any other combination is reported and skipped without failing.

use crate::config::ProjectLayout;
use crate::error::{BoxError, BoxResult};
use crate::icon::find_icon;
use crate::manifest::ProjectManifest;
use crate::messages;
use crate::nsis::{self, NsisProject};
use crate::progress::{self, ProgressExt};
use crate::{linux, macos};
use std::fmt;
use std::path::{Path, PathBuf};

/// Operating system the installer is built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
    MacOS,
    /// Anything else, named as the target reports it
    Other(String),
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" => Self::Linux,
            "windows" => Self::Windows,
            "macos" => Self::MacOS,
            other => Self::Other(other.to_string()),
        }
    }

    /// Suffix of executables on this platform
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            _ => "",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => f.write_str("Linux"),
            Self::Windows => f.write_str("Windows"),
            Self::MacOS => f.write_str("macOS"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Kind of application being installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Cli,
    Gui,
}

impl Mode {
    /// Mode for a project's GUI flag
    pub fn from_gui(is_gui: bool) -> Self {
        if is_gui {
            Self::Gui
        } else {
            Self::Cli
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => f.write_str("CLI"),
            Self::Gui => f.write_str("GUI"),
        }
    }
}

/// Concrete installer to build, with the inputs each one needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallerPlan {
    LinuxCli,
    LinuxGui { icon: PathBuf },
    WindowsCli,
    WindowsGui { icon: PathBuf },
    MacCli,
    MacGui { icon: PathBuf },
    Unsupported { os: String, mode: Mode },
}

impl InstallerPlan {
    /// Select the installer for a platform and mode, locating icons as needed
    pub fn resolve(platform: &Platform, mode: Mode, root: &Path) -> BoxResult<Self> {
        Ok(match (platform, mode) {
            (Platform::Linux, Mode::Cli) => Self::LinuxCli,
            (Platform::Linux, Mode::Gui) => Self::LinuxGui {
                icon: find_icon(root, None)?,
            },
            (Platform::Windows, Mode::Cli) => Self::WindowsCli,
            (Platform::Windows, Mode::Gui) => Self::WindowsGui {
                icon: find_icon(root, Some("ico"))?,
            },
            (Platform::MacOS, Mode::Cli) => Self::MacCli,
            (Platform::MacOS, Mode::Gui) => Self::MacGui {
                icon: find_icon(root, Some("icns"))?,
            },
            (Platform::Other(os), mode) => Self::Unsupported {
                os: os.clone(),
                mode,
            },
        })
    }
}

/// Notice printed for platform and mode combinations without an installer
pub fn unsupported_message(os: &str, mode: Mode) -> String {
    format!(
        "Creating an installer for a {} is currently not supported on {}.",
        mode, os
    )
}

/// Builds the installer for a packaged project
pub struct InstallerBuilder {
    layout: ProjectLayout,
    manifest: ProjectManifest,
    platform: Platform,
    verbose: bool,
}

impl InstallerBuilder {
    /// Builder for the current platform
    pub fn new(layout: ProjectLayout, manifest: ProjectManifest) -> Self {
        Self {
            layout,
            manifest,
            platform: Platform::current(),
            verbose: false,
        }
    }

    /// Load the manifest from the project root
    pub fn from_layout(layout: ProjectLayout) -> BoxResult<Self> {
        let manifest = ProjectManifest::from_dir(layout.root())?;
        Ok(Self::new(layout, manifest))
    }

    /// Build for another platform
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Stream the output of installer tools
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// GUI or CLI, from the manifest
    pub fn mode(&self) -> Mode {
        Mode::from_gui(self.manifest.is_gui())
    }

    /// Release binary produced by `box package`
    pub fn release_file(&self) -> BoxResult<PathBuf> {
        let file = self.layout.release_dir().join(format!(
            "{}{}",
            self.manifest.name(),
            self.platform.exe_suffix()
        ));
        if file.is_file() {
            Ok(file)
        } else {
            Err(BoxError::Precondition(
                "No release found. Run `box package` first.".to_string(),
            ))
        }
    }

    /// Path of the installer for a platform suffix such as `linux.sh`
    fn installer_path(&self, suffix: &str) -> PathBuf {
        self.layout.release_dir().join(format!(
            "{}-v{}-{}",
            self.manifest.name(),
            self.manifest.version(),
            suffix
        ))
    }

    /// Build the installer
    ///
    /// Returns `None` when the platform and mode have no installer.
    pub fn create(&self) -> BoxResult<Option<PathBuf>> {
        let release = self.release_file()?;
        let plan = InstallerPlan::resolve(&self.platform, self.mode(), self.layout.root())?;
        tracing::debug!(plan = ?plan, "Installer plan");

        if let InstallerPlan::Unsupported { os, mode } = &plan {
            messages::warning(unsupported_message(os, *mode));
            return Ok(None);
        }

        let pb = progress::step("Creating installer", self.verbose);
        match self.build(&plan, &release) {
            Ok(installer) if installer.exists() => {
                pb.finish_success("Installer created");
                Ok(Some(installer))
            }
            Ok(installer) => {
                pb.finish_error("Installer creation failed");
                Err(BoxError::Installer(format!(
                    "{} was not created. Run `box installer -v` to see what went wrong.",
                    installer.display()
                )))
            }
            Err(e) => {
                pb.finish_error("Installer creation failed");
                Err(e)
            }
        }
    }

    fn build(&self, plan: &InstallerPlan, release: &Path) -> BoxResult<PathBuf> {
        let name = self.manifest.name();
        let version = self.manifest.version();
        let release_dir = self.layout.release_dir();

        match plan {
            InstallerPlan::LinuxCli => {
                let out = self.installer_path("linux.sh");
                linux::write_cli_installer(&out, release, name, version)?;
                Ok(out)
            }
            InstallerPlan::LinuxGui { icon } => {
                let out = self.installer_path("linux.sh");
                linux::write_gui_installer(&out, release, icon, name, version)?;
                Ok(out)
            }
            InstallerPlan::WindowsCli | InstallerPlan::WindowsGui { .. } => {
                let icon = match plan {
                    InstallerPlan::WindowsGui { icon } => {
                        Some(std::path::absolute(icon).unwrap_or_else(|_| icon.clone()))
                    }
                    _ => None,
                };
                let project = NsisProject {
                    name: name.to_string(),
                    installer_name: format!("{}-v{}-win.exe", name, version),
                    author: self.manifest.author().to_string(),
                    version: version.to_string(),
                    binary_name: file_name(release),
                    icon,
                };
                nsis::build_installer(&project, &release_dir, self.verbose)
            }
            InstallerPlan::MacCli => {
                let out = self.installer_path("macos.pkg");
                macos::build_pkg(release, name, version, &out, self.verbose)?;
                Ok(out)
            }
            InstallerPlan::MacGui { icon } => {
                let out = self.installer_path("macos.dmg");
                let app =
                    macos::make_app(&release_dir, name, self.manifest.author(), version, icon)?;
                let settings = macos::DmgSettings::new(&release_dir, name)
                    .with_background(macos::DmgBackground::for_icon(icon));
                let built = macos::build_dmg(&settings, &out, &file_name(&out), self.verbose);
                std::fs::remove_dir_all(&app)?;
                built?;
                Ok(out)
            }
            InstallerPlan::Unsupported { os, mode } => Err(BoxError::Installer(
                unsupported_message(os, *mode),
            )),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::MacOS.to_string(), "macOS");
        assert_eq!(Platform::Other("freebsd".into()).to_string(), "freebsd");
        assert_eq!(Platform::Windows.exe_suffix(), ".exe");
        assert_eq!(Platform::Linux.exe_suffix(), "");
    }

    #[test]
    fn test_unsupported_message() {
        let msg = unsupported_message("freebsd", Mode::Gui);
        assert_eq!(
            msg,
            "Creating an installer for a GUI is currently not supported on freebsd."
        );
    }

    #[test]
    fn test_resolve_cli_plans_need_no_icon() {
        let temp = tempfile::TempDir::new().unwrap();
        for (platform, plan) in [
            (Platform::Linux, InstallerPlan::LinuxCli),
            (Platform::Windows, InstallerPlan::WindowsCli),
            (Platform::MacOS, InstallerPlan::MacCli),
        ] {
            assert_eq!(
                InstallerPlan::resolve(&platform, Mode::Cli, temp.path()).unwrap(),
                plan
            );
        }
    }

    #[test]
    fn test_resolve_gui_without_icon_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = InstallerPlan::resolve(&Platform::MacOS, Mode::Gui, temp.path()).unwrap_err();
        assert!(err.to_string().contains("icns"));
    }
}
