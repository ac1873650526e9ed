//! Packaging pipeline
//!
//! `box package` runs these steps in order and aborts on the first failure:
//!
//! 1. check the Rust toolchain is installed
//! 2. build the Python sdist with the configured backend
//! 3. acquire the PyApp source tree
//! 4. compose the PyApp build environment
//! 5. compile PyApp and move the binary to `target/release/<name>`

use crate::builder::BuildBackend;
use crate::compile::Compiler;
use crate::config::{ProjectLayout, PyAppVersion};
use crate::downloader::Downloader;
use crate::environment::BuildEnvironment;
use crate::error::BoxResult;
use crate::manifest::ProjectManifest;
use crate::progress::{self, ProgressExt};
use crate::source::{SourceCache, SourceOrigin, SourceTree};
use std::fs;
use std::path::PathBuf;

/// Result of a packaging run
#[derive(Debug)]
pub struct PackageOutput {
    /// Relocated binary
    pub binary: PathBuf,
    /// Size of the binary in bytes
    pub size: u64,
    /// PyApp tree the binary was built from
    pub tree: SourceTree,
    /// Environment handed to the compiler
    pub environment: BuildEnvironment,
}

/// Runs the full packaging pipeline for one project
pub struct Packager {
    layout: ProjectLayout,
    manifest: ProjectManifest,
    origin: SourceOrigin,
    downloader: Downloader,
    compiler: Compiler,
    verbose: bool,
    build_sdist: bool,
}

impl Packager {
    /// Packager for the project at `layout`
    pub fn new(layout: ProjectLayout, manifest: ProjectManifest) -> Self {
        Self {
            layout,
            manifest,
            origin: SourceOrigin::Remote(PyAppVersion::Latest),
            downloader: Downloader::new(),
            compiler: Compiler::new(),
            verbose: false,
            build_sdist: true,
        }
    }

    /// Load the manifest from the project root
    pub fn from_layout(layout: ProjectLayout) -> BoxResult<Self> {
        let manifest = ProjectManifest::from_dir(layout.root())?;
        Ok(Self::new(layout, manifest))
    }

    /// Where to take the PyApp source from
    pub fn source(mut self, origin: SourceOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Downloader used for remote sources
    pub fn downloader(mut self, downloader: Downloader) -> Self {
        self.downloader = downloader;
        self
    }

    /// Compiler driving the PyApp build
    pub fn compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Stream child process output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self.compiler = self.compiler.verbose(verbose);
        self
    }

    /// Skip the sdist build and reuse whatever is in `dist/`
    pub fn build_sdist(mut self, build: bool) -> Self {
        self.build_sdist = build;
        self
    }

    /// Project manifest
    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    /// Run every packaging step
    pub fn package(&self) -> BoxResult<PackageOutput> {
        self.manifest.ensure_box_project()?;

        let toolchain = self.compiler.check_available()?;
        tracing::info!(toolchain = %toolchain, "Using Rust toolchain");

        if self.build_sdist {
            self.build_python_project()?;
        }

        let cache = SourceCache::new(self.layout.build_dir()).with_downloader(
            self.downloader
                .clone()
                .show_progress(!self.verbose),
        );
        let tree = cache.acquire(&self.origin)?;
        tracing::info!(tree = %tree.path.display(), "Using PyApp source");

        let environment = BuildEnvironment::compose(&self.manifest, &self.layout.dist_dir())?;
        tracing::debug!(vars = ?environment.vars(), "PyApp build environment");

        let pb = progress::step("Compiling PyApp", self.verbose);
        let binary = match self.compiler.build(
            &tree.path,
            &environment,
            &self.layout.release_dir(),
            self.manifest.name(),
        ) {
            Ok(binary) => binary,
            Err(e) => {
                pb.finish_error("PyApp compilation failed");
                return Err(e);
            }
        };
        pb.finish_success("PyApp compiled");

        let size = fs::metadata(&binary)?.len();
        Ok(PackageOutput {
            binary,
            size,
            tree,
            environment,
        })
    }

    fn build_python_project(&self) -> BoxResult<()> {
        let backend = BuildBackend::from_manifest(&self.manifest)?;
        let pb = progress::step(&format!("Building project with {}", backend), self.verbose);
        match backend.run(self.layout.root(), self.verbose) {
            Ok(()) => {
                pb.finish_success("Source distribution built");
                Ok(())
            }
            Err(e) => {
                pb.finish_error("Source distribution build failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_package_requires_box_project() {
        let temp = TempDir::new().unwrap();
        let manifest = ProjectManifest::parse(
            r#"
[project]
name = "demo"
version = "0.1.0"
"#,
        )
        .unwrap();

        let err = Packager::new(ProjectLayout::new(temp.path()), manifest)
            .package()
            .unwrap_err();
        assert!(err.to_string().contains("not a box project"));
    }
}
