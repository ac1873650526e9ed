//! PyApp compile step
//!
//! Runs `cargo build --release` inside the selected PyApp tree with the
//! composed [`BuildEnvironment`] and moves the produced `pyapp` binary to
//! `target/release/<project name>` in the project.

use crate::config::PYAPP_BINARY_PATH;
use crate::environment::BuildEnvironment;
use crate::error::{BoxError, BoxResult};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Drives the Rust toolchain that compiles PyApp
#[derive(Debug, Clone)]
pub struct Compiler {
    program: OsString,
    verbose: bool,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Compiler using `cargo` from `PATH`
    pub fn new() -> Self {
        Self {
            program: OsString::from("cargo"),
            verbose: false,
        }
    }

    /// Use a different toolchain executable
    pub fn program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Stream the toolchain output instead of discarding it
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the toolchain is installed, returns its version line
    pub fn check_available(&self) -> BoxResult<String> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| {
                BoxError::Toolchain(format!(
                    "Cargo is not installed or not available on the PATH ({}). \
                     Install Rust from https://rustup.rs",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(BoxError::Toolchain(
                "Cargo version check failed".to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Compile the PyApp tree with the given environment
    pub fn compile(&self, tree: &Path, env: &BuildEnvironment) -> BoxResult<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["build", "--release"]).current_dir(tree);
        env.apply(&mut cmd);
        if !self.verbose {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        tracing::info!(tree = %tree.display(), "Compiling PyApp");
        let status = cmd
            .status()
            .map_err(|e| BoxError::Toolchain(format!("Failed to run cargo: {}", e)))?;

        if !status.success() {
            return Err(BoxError::Toolchain(format!(
                "PyApp compilation failed with status: {}. Run `box package -v` to see the build output.",
                status
            )));
        }

        Ok(())
    }

    /// Compile and relocate, returns the final binary path
    pub fn build(
        &self,
        tree: &Path,
        env: &BuildEnvironment,
        release_dir: &Path,
        name: &str,
    ) -> BoxResult<PathBuf> {
        self.compile(tree, env)?;
        let binary = locate_binary(tree)?;
        relocate(&binary, release_dir, name)
    }
}

/// Binary produced by a PyApp build, `pyapp` or `pyapp.exe`
pub fn locate_binary(tree: &Path) -> BoxResult<PathBuf> {
    let plain = tree.join(PYAPP_BINARY_PATH);
    let exe = plain.with_extension("exe");

    [plain, exe]
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| {
            BoxError::Toolchain(
                "No PyApp binary found after compilation. \
                 Run `box package -v` to see the build output."
                    .to_string(),
            )
        })
}

/// Move `binary` to `release_dir/<name>`, keeping its extension
pub fn relocate(binary: &Path, release_dir: &Path, name: &str) -> BoxResult<PathBuf> {
    fs::create_dir_all(release_dir)?;

    let mut file_name = OsString::from(name);
    if let Some(ext) = binary.extension() {
        file_name.push(".");
        file_name.push(ext);
    }
    let dest = release_dir.join(file_name);

    if dest.exists() {
        fs::remove_file(&dest)?;
    }
    if fs::rename(binary, &dest).is_err() {
        // rename fails across filesystems
        fs::copy(binary, &dest)?;
        fs::remove_file(binary)?;
    }

    tracing::info!(binary = %dest.display(), "Binary ready");
    Ok(dest)
}
