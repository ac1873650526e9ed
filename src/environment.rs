//! Build environment for the PyApp compile step
//!
//! PyApp is configured entirely through `PYAPP_*` variables read by its build
//! script. The composed map is applied to the compiler's child process only:
//! every inherited `PYAPP*` variable is removed from the child first, so a
//! stale value from an earlier run or the user's shell can never leak in,
//! and the parent process environment is left untouched.

use crate::config::PYAPP_ENV_PREFIX;
use crate::error::{BoxError, BoxResult};
use crate::manifest::{default_python_version, ProjectManifest};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Variable set to `1` for GUI projects, absent otherwise
pub const PYAPP_IS_GUI: &str = "PYAPP_IS_GUI";

/// Flat variable map handed to the PyApp build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
    vars: BTreeMap<String, String>,
}

impl BuildEnvironment {
    /// Compose the environment from the manifest and the `dist/` folder
    pub fn compose(manifest: &ProjectManifest, dist_dir: &Path) -> BoxResult<Self> {
        let mut vars = BTreeMap::new();

        vars.insert("PYAPP_PROJECT_NAME".to_string(), manifest.name_pkg());
        vars.insert(
            "PYAPP_PROJECT_VERSION".to_string(),
            manifest.version().to_string(),
        );

        match find_sdist(dist_dir, manifest.version())? {
            Some(sdist) => {
                let sdist = std::path::absolute(&sdist).unwrap_or(sdist);
                vars.insert(
                    "PYAPP_PROJECT_PATH".to_string(),
                    sdist.to_string_lossy().into_owned(),
                );
            }
            None => {
                tracing::warn!(
                    dist = %dist_dir.display(),
                    version = %manifest.version(),
                    "No source distribution found, PyApp will not find the project"
                );
            }
        }

        vars.insert(
            "PYAPP_PYTHON_VERSION".to_string(),
            manifest
                .python_version()
                .unwrap_or(default_python_version())
                .to_string(),
        );

        vars.insert(
            manifest.entry_type().env_key(),
            manifest.app_entry()?.to_string(),
        );

        if let Some(extras) = manifest.optional_dependencies() {
            vars.insert("PYAPP_PROJECT_FEATURES".to_string(), extras.to_string());
        }

        if manifest.is_gui() {
            vars.insert(PYAPP_IS_GUI.to_string(), "1".to_string());
        }

        // user overrides win over everything above
        vars.extend(manifest.env_vars());

        Ok(Self { vars })
    }

    /// Value of a composed variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// All composed variables
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Apply to a child command, dropping inherited `PYAPP*` variables first
    pub fn apply(&self, cmd: &mut Command) {
        for key in inherited_reserved(std::env::vars_os().map(|(k, _)| k)) {
            cmd.env_remove(key);
        }
        cmd.envs(&self.vars);
    }
}

fn inherited_reserved(keys: impl Iterator<Item = OsString>) -> Vec<OsString> {
    keys.filter(|k| k.to_string_lossy().starts_with(PYAPP_ENV_PREFIX))
        .collect()
}

/// First `*.gz` file in `dist_dir` whose name contains `version`
pub fn find_sdist(dist_dir: &Path, version: &str) -> BoxResult<Option<PathBuf>> {
    if !dist_dir.is_dir() {
        return Ok(None);
    }

    let pattern = format!(
        "{}/*{}*.gz",
        glob::Pattern::escape(&dist_dir.to_string_lossy()),
        glob::Pattern::escape(version)
    );
    let paths = glob::glob(&pattern)
        .map_err(|e| BoxError::Config(format!("Invalid dist pattern {}: {}", pattern, e)))?;

    Ok(paths.filter_map(Result::ok).find(|p| p.is_file()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[project]
name = "my-app"
version = "0.1.0"

[tool.box]
builder = "build"
app_entry = "my_app:run"
entry_type = "module"
"#;

    #[test]
    fn test_find_sdist_matches_version() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("my_app-0.0.9.tar.gz"), "").unwrap();
        fs::write(temp.path().join("my_app-0.1.0-py3-none-any.whl"), "").unwrap();
        fs::write(temp.path().join("my_app-0.1.0.tar.gz"), "").unwrap();

        let found = find_sdist(temp.path(), "0.1.0").unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "my_app-0.1.0.tar.gz");
    }

    #[test]
    fn test_find_sdist_missing_dir() {
        let temp = TempDir::new().unwrap();
        assert!(find_sdist(&temp.path().join("dist"), "0.1.0")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_entry_key_follows_entry_type() {
        let temp = TempDir::new().unwrap();
        let manifest = ProjectManifest::parse(MANIFEST).unwrap();
        let env = BuildEnvironment::compose(&manifest, temp.path()).unwrap();

        assert_eq!(env.get("PYAPP_EXEC_MODULE"), Some("my_app:run"));
        assert_eq!(env.get("PYAPP_EXEC_SPEC"), None);
        assert_eq!(env.get("PYAPP_PROJECT_PATH"), None);
    }

    #[test]
    fn test_inherited_reserved_keys() {
        let keys = vec![
            OsString::from("PYAPP_OLD"),
            OsString::from("PATH"),
            OsString::from("PYAPPX"),
        ];
        assert_eq!(
            inherited_reserved(keys.into_iter()),
            vec![OsString::from("PYAPP_OLD"), OsString::from("PYAPPX")]
        );
    }
}
