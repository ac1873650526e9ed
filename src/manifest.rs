//! `pyproject.toml` reader and writer
//!
//! The packager only reads the project configuration; initialization and the
//! `env` sub-commands write into the `[tool.box]` table.
//!
//! ## Configuration Layout
//!
//! ```toml
//! [project]
//! name = "my-app"
//! version = "0.1.0"
//! authors = [{ name = "Jane Doe" }]
//!
//! [tool.box]
//! builder = "hatch"            # rye | hatch | pdm | build | flit | custom
//! build_command = "make sdist" # only for builder = "custom"
//! app_entry = "my_app:run"
//! entry_type = "spec"          # spec | module | script | notebook
//! python_version = "3.12"
//! optional_deps = "gui"
//! is_gui = false
//!
//! [tool.box.env-vars]
//! PYAPP_FULL_ISOLATION = "1"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{BoxError, BoxResult};

/// Name of the project configuration file
pub const MANIFEST_FILE: &str = "pyproject.toml";

/// Table under `[tool.box]` that holds user-declared environment variables
pub const ENV_VARS_TABLE: &str = "env-vars";

/// Python versions PyApp can embed, oldest first
pub const PYTHON_VERSIONS: &[&str] = &["3.8", "3.9", "3.10", "3.11", "3.12", "3.13"];

/// Newest supported Python version, used when none is configured
pub fn default_python_version() -> &'static str {
    PYTHON_VERSIONS[PYTHON_VERSIONS.len() - 1]
}

// ============================================================================
// Entry Type
// ============================================================================

/// How PyApp interprets the configured app entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Entry point spec, e.g. `my_app.cli:main`
    #[default]
    Spec,
    /// Module run with `python -m`
    Module,
    /// Script file
    Script,
    /// Jupyter notebook
    Notebook,
}

impl EntryType {
    /// All entry types in display order
    pub const ALL: [EntryType; 4] = [
        EntryType::Spec,
        EntryType::Module,
        EntryType::Script,
        EntryType::Notebook,
    ];

    /// Lowercase name as stored in `pyproject.toml`
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Spec => "spec",
            EntryType::Module => "module",
            EntryType::Script => "script",
            EntryType::Notebook => "notebook",
        }
    }

    /// PyApp variable carrying the entry value for this kind
    pub fn env_key(&self) -> String {
        format!("PYAPP_EXEC_{}", self.as_str().to_uppercase())
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = BoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.to_lowercase())
            .ok_or_else(|| {
                BoxError::Config(format!(
                    "Unknown entry type '{}'. Valid types are: spec, module, script, notebook",
                    s
                ))
            })
    }
}

// ============================================================================
// Raw TOML Structure
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct PyProject {
    project: Option<toml::Table>,
    #[serde(default)]
    tool: ToolTable,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ToolTable {
    #[serde(rename = "box")]
    box_config: Option<BoxTable>,
    rye: Option<toml::Value>,
    hatch: Option<toml::Value>,
    pdm: Option<toml::Value>,
    flit: Option<toml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BoxTable {
    builder: Option<String>,
    build_command: Option<String>,
    app_entry: Option<String>,
    entry_type: Option<EntryType>,
    python_version: Option<String>,
    optional_deps: Option<String>,
    #[serde(default)]
    is_gui: bool,
    #[serde(rename = "env-vars", default)]
    env_vars: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectTable {
    name: String,
    version: String,
    #[serde(default)]
    authors: Vec<Author>,
    #[serde(default)]
    scripts: BTreeMap<String, String>,
    #[serde(rename = "gui-scripts", default)]
    gui_scripts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Author {
    name: Option<String>,
}

/// A candidate app entry found in `[project.scripts]` or `[project.gui-scripts]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCandidate {
    /// Source table (`gui-scripts` or `scripts`)
    pub group: &'static str,
    /// Script name
    pub name: String,
    /// Entry point spec
    pub value: String,
}

// ============================================================================
// Project Manifest
// ============================================================================

/// Immutable snapshot of a project's `pyproject.toml`
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    project: ProjectTable,
    tool: ToolTable,
}

impl ProjectManifest {
    /// Load the manifest from a project directory
    pub fn from_dir(root: impl AsRef<Path>) -> BoxResult<Self> {
        Self::from_file(root.as_ref().join(MANIFEST_FILE))
    }

    /// Load the manifest from a file
    pub fn from_file(path: impl AsRef<Path>) -> BoxResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BoxError::Manifest(format!(
                "No `{}` file found in {}",
                MANIFEST_FILE,
                path.parent().unwrap_or(Path::new(".")).display()
            )));
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse manifest from TOML string
    pub fn parse(content: &str) -> BoxResult<Self> {
        let raw: PyProject = toml::from_str(content)?;
        let table = raw.project.ok_or_else(|| {
            BoxError::Manifest(
                "Invalid `pyproject.toml` file. Missing `project` table. \
                 At least the `name` and `version` keys are required."
                    .to_string(),
            )
        })?;
        let project: ProjectTable = toml::Value::Table(table).try_into().map_err(|e| {
            BoxError::Manifest(format!(
                "Invalid `pyproject.toml` file. At least the `name` and `version` keys are required: {}",
                e
            ))
        })?;

        Ok(Self {
            project,
            tool: raw.tool,
        })
    }

    /// Project name as declared
    pub fn name(&self) -> &str {
        &self.project.name
    }

    /// Project name with `-` replaced by `_`
    pub fn name_pkg(&self) -> String {
        self.project.name.replace('-', "_")
    }

    /// Project version
    pub fn version(&self) -> &str {
        &self.project.version
    }

    /// First author's name, empty if none is declared
    pub fn author(&self) -> &str {
        self.project
            .authors
            .iter()
            .find_map(|a| a.name.as_deref())
            .unwrap_or("")
    }

    /// Whether `[tool.box]` exists
    pub fn is_box_project(&self) -> bool {
        self.tool.box_config.is_some()
    }

    /// Fail unless the project has been initialized with `box init`
    pub fn ensure_box_project(&self) -> BoxResult<()> {
        if self.is_box_project() {
            Ok(())
        } else {
            Err(BoxError::Config(
                "This is not a box project. Initialize it first with `box init`.".to_string(),
            ))
        }
    }

    fn box_table(&self) -> BoxResult<&BoxTable> {
        self.tool.box_config.as_ref().ok_or_else(|| {
            BoxError::Config(
                "This is not a box project. Initialize it first with `box init`.".to_string(),
            )
        })
    }

    /// Configured builder identifier
    pub fn builder(&self) -> BoxResult<&str> {
        self.box_table()?
            .builder
            .as_deref()
            .ok_or_else(|| BoxError::Config("No builder configured in [tool.box]".to_string()))
    }

    /// Shell command for the `custom` builder
    pub fn build_command(&self) -> Option<&str> {
        self.tool
            .box_config
            .as_ref()
            .and_then(|b| b.build_command.as_deref())
            .filter(|c| !c.trim().is_empty())
    }

    /// App entry value passed to PyApp
    pub fn app_entry(&self) -> BoxResult<&str> {
        self.box_table()?
            .app_entry
            .as_deref()
            .ok_or_else(|| BoxError::Config("No app entry configured in [tool.box]".to_string()))
    }

    /// Entry type, `spec` when unset
    pub fn entry_type(&self) -> EntryType {
        self.tool
            .box_config
            .as_ref()
            .and_then(|b| b.entry_type)
            .unwrap_or_default()
    }

    /// Python version to embed, `None` when unset
    pub fn python_version(&self) -> Option<&str> {
        self.tool
            .box_config
            .as_ref()
            .and_then(|b| b.python_version.as_deref())
    }

    /// Optional dependency extras, `None` when unset
    pub fn optional_dependencies(&self) -> Option<&str> {
        self.tool
            .box_config
            .as_ref()
            .and_then(|b| b.optional_deps.as_deref())
            .filter(|d| !d.is_empty())
    }

    /// Whether the project is a GUI application
    pub fn is_gui(&self) -> bool {
        self.tool.box_config.as_ref().is_some_and(|b| b.is_gui)
    }

    /// User-declared environment variables, values rendered as strings
    pub fn env_vars(&self) -> BTreeMap<String, String> {
        self.tool
            .box_config
            .as_ref()
            .map(|b| {
                b.env_vars
                    .iter()
                    .map(|(k, v)| (k.clone(), toml_value_to_env(v)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Builder inferred from tool tables, used as the init default
    pub fn detected_builder(&self) -> Option<&'static str> {
        if self.tool.rye.is_some() {
            Some("rye")
        } else if self.tool.hatch.is_some() {
            Some("hatch")
        } else if self.tool.pdm.is_some() {
            Some("pdm")
        } else if self.tool.flit.is_some() {
            Some("flit")
        } else {
            None
        }
    }

    /// Entry points declared by the project, GUI scripts first
    pub fn possible_app_entries(&self) -> Vec<EntryCandidate> {
        let gui = self
            .project
            .gui_scripts
            .iter()
            .map(|(name, value)| EntryCandidate {
                group: "gui-scripts",
                name: name.clone(),
                value: value.clone(),
            });
        let cli = self
            .project
            .scripts
            .iter()
            .map(|(name, value)| EntryCandidate {
                group: "scripts",
                name: name.clone(),
                value: value.clone(),
            });
        gui.chain(cli).collect()
    }
}

fn toml_value_to_env(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// Manifest Writer
// ============================================================================

/// Format-preserving writer for the `[tool.box]` table
pub struct ManifestWriter {
    path: PathBuf,
}

impl ManifestWriter {
    /// Writer for the `pyproject.toml` in a project directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            path: root.as_ref().join(MANIFEST_FILE),
        }
    }

    /// Set `key = value` in `[tool.box]`, creating the table when needed
    pub fn set(&self, key: &str, value: impl Into<toml_edit::Value>) -> BoxResult<()> {
        let mut doc = self.load()?;
        let table = box_table_mut(&mut doc)?;
        table.insert(key, toml_edit::value(value));
        self.save(&doc)
    }

    /// Set `key = value` in the `[tool.box.<table>]` sub-table
    pub fn set_in(
        &self,
        table: &str,
        key: &str,
        value: impl Into<toml_edit::Value>,
    ) -> BoxResult<()> {
        let mut doc = self.load()?;
        let sub = sub_table_mut(box_table_mut(&mut doc)?, table)?;
        sub.insert(key, toml_edit::value(value));
        self.save(&doc)
    }

    /// Remove `key` from `[tool.box.<table>]`, returns whether it existed
    pub fn unset_in(&self, table: &str, key: &str) -> BoxResult<bool> {
        let mut doc = self.load()?;
        let removed = doc
            .get_mut("tool")
            .and_then(|t| t.get_mut("box"))
            .and_then(|b| b.get_mut(table))
            .and_then(|s| s.as_table_like_mut())
            .and_then(|s| s.remove(key))
            .is_some();
        if removed {
            self.save(&doc)?;
        }
        Ok(removed)
    }

    /// Remove the whole `[tool.box]` table
    pub fn uninitialize(&self) -> BoxResult<()> {
        let mut doc = self.load()?;
        if let Some(tool) = doc.get_mut("tool").and_then(|t| t.as_table_like_mut()) {
            tool.remove("box");
        }
        self.save(&doc)
    }

    fn load(&self) -> BoxResult<toml_edit::DocumentMut> {
        if !self.path.is_file() {
            return Err(BoxError::Manifest(format!(
                "No `{}` file found at {}",
                MANIFEST_FILE,
                self.path.display()
            )));
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(content.parse::<toml_edit::DocumentMut>()?)
    }

    fn save(&self, doc: &toml_edit::DocumentMut) -> BoxResult<()> {
        // toml_edit emits `\n`; keep it that way on Windows too
        fs::write(&self.path, doc.to_string())?;
        tracing::debug!(path = %self.path.display(), "Updated manifest");
        Ok(())
    }
}

fn box_table_mut(doc: &mut toml_edit::DocumentMut) -> BoxResult<&mut toml_edit::Table> {
    let tool = doc
        .entry("tool")
        .or_insert(toml_edit::table())
        .as_table_mut()
        .ok_or_else(|| BoxError::Manifest("`tool` is not a table".to_string()))?;
    tool.set_implicit(true);
    sub_table_mut(tool, "box")
}

fn sub_table_mut<'a>(
    parent: &'a mut toml_edit::Table,
    name: &str,
) -> BoxResult<&'a mut toml_edit::Table> {
    parent
        .entry(name)
        .or_insert(toml_edit::table())
        .as_table_mut()
        .ok_or_else(|| BoxError::Manifest(format!("`{}` is not a table", name)))
}
