//! `box init`: write the `[tool.box]` table
//!
//! Every setting can be given on the command line. Missing settings are
//! asked for interactively, or take their defaults in quiet mode.

use crate::builder::BUILDERS;
use crate::error::{BoxError, BoxResult};
use crate::manifest::{
    default_python_version, EntryType, ManifestWriter, ProjectManifest, ENV_VARS_TABLE,
    PYTHON_VERSIONS,
};
use std::path::{Path, PathBuf};

/// Builder used when the project declares no known tool table
pub const DEFAULT_BUILDER: &str = "build";

/// Settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Never prompt, use defaults for everything not given
    pub quiet: bool,
    pub builder: Option<String>,
    pub build_command: Option<String>,
    pub optional_deps: Option<String>,
    pub gui: Option<bool>,
    pub app_entry: Option<String>,
    pub entry_type: Option<EntryType>,
    pub python_version: Option<String>,
    /// Extra PyApp variables as `KEY VALUE [KEY VALUE ...]`
    pub opt_pyapp_vars: Option<String>,
}

/// Resolved `[tool.box]` content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitSettings {
    pub builder: String,
    pub build_command: Option<String>,
    pub optional_deps: String,
    pub is_gui: bool,
    pub app_entry: String,
    pub entry_type: EntryType,
    pub python_version: String,
    pub env_vars: Vec<(String, String)>,
}

/// Source of answers for settings not given on the command line
pub trait Prompter {
    /// Free text with a default
    fn input(&self, prompt: &str, default: &str) -> BoxResult<String>;

    /// Pick one item, returns its index
    fn select(&self, prompt: &str, items: &[&str], default: usize) -> BoxResult<usize>;

    /// Yes or no
    fn confirm(&self, prompt: &str, default: bool) -> BoxResult<bool>;
}

/// Prompts on the terminal
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&self, prompt: &str, default: &str) -> BoxResult<String> {
        Ok(dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .default(default.to_string())
            .allow_empty(true)
            .interact_text()?)
    }

    fn select(&self, prompt: &str, items: &[&str], default: usize) -> BoxResult<usize> {
        Ok(dialoguer::Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()?)
    }

    fn confirm(&self, prompt: &str, default: bool) -> BoxResult<bool> {
        Ok(dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }
}

/// Answers every prompt with its default
pub struct DefaultPrompter;

impl Prompter for DefaultPrompter {
    fn input(&self, _prompt: &str, default: &str) -> BoxResult<String> {
        Ok(default.to_string())
    }

    fn select(&self, _prompt: &str, _items: &[&str], default: usize) -> BoxResult<usize> {
        Ok(default)
    }

    fn confirm(&self, _prompt: &str, default: bool) -> BoxResult<bool> {
        Ok(default)
    }
}

/// Initializes the project at a root folder
pub struct Initializer {
    root: PathBuf,
    options: InitOptions,
}

impl Initializer {
    pub fn new(root: impl AsRef<Path>, options: InitOptions) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options,
        }
    }

    /// Resolve and write the settings, prompting on the terminal unless quiet
    pub fn initialize(&self) -> BoxResult<InitSettings> {
        if self.options.quiet {
            self.initialize_with(&DefaultPrompter)
        } else {
            self.initialize_with(&TerminalPrompter)
        }
    }

    /// Resolve and write the settings with the given prompter
    pub fn initialize_with(&self, prompter: &dyn Prompter) -> BoxResult<InitSettings> {
        let manifest = ProjectManifest::from_dir(&self.root)?;
        let settings = self.resolve(&manifest, prompter)?;
        self.write(&settings)?;
        Ok(settings)
    }

    /// Work out every setting from flags, the manifest and the prompter
    pub fn resolve(
        &self,
        manifest: &ProjectManifest,
        prompter: &dyn Prompter,
    ) -> BoxResult<InitSettings> {
        let opts = &self.options;

        let builder = match &opts.builder {
            Some(b) if BUILDERS.contains(&b.as_str()) => b.clone(),
            Some(b) => {
                return Err(BoxError::Config(format!(
                    "Unknown builder '{}'. Valid builders are: {}",
                    b,
                    BUILDERS.join(", ")
                )))
            }
            None => {
                let detected = manifest.detected_builder().unwrap_or(DEFAULT_BUILDER);
                let default = BUILDERS.iter().position(|b| *b == detected).unwrap_or(0);
                let idx =
                    prompter.select("Choose a builder tool for the project", BUILDERS, default)?;
                BUILDERS.get(idx).copied().unwrap_or(DEFAULT_BUILDER).to_string()
            }
        };

        let build_command = if builder == "custom" {
            let command = match &opts.build_command {
                Some(c) => c.clone(),
                None => {
                    prompter.input("Enter the command to build the source distribution", "")?
                }
            };
            if command.trim().is_empty() {
                return Err(BoxError::Config(
                    "The `custom` builder requires a build command.".to_string(),
                ));
            }
            Some(command)
        } else {
            None
        };

        let optional_deps = match &opts.optional_deps {
            Some(d) => d.clone(),
            None => prompter.input(
                "Provide any optional dependencies for the project (leave empty for none)",
                "",
            )?,
        };

        let is_gui = match opts.gui {
            Some(g) => g,
            None => prompter.confirm("Is this a GUI project?", false)?,
        };

        let app_entry = match &opts.app_entry {
            Some(e) => e.clone(),
            None => {
                let default = default_app_entry(manifest, is_gui);
                prompter.input("Provide the app entry point for the project", &default)?
            }
        };

        let entry_type = match opts.entry_type {
            Some(t) => t,
            None => {
                let names: Vec<&str> = EntryType::ALL.iter().map(|t| t.as_str()).collect();
                let idx = prompter.select("Choose an entry type for the project", &names, 0)?;
                EntryType::ALL.get(idx).copied().unwrap_or_default()
            }
        };

        let python_version = match &opts.python_version {
            Some(v) if PYTHON_VERSIONS.contains(&v.as_str()) => v.clone(),
            Some(v) => {
                return Err(BoxError::Config(format!(
                    "Unsupported Python version '{}'. Valid versions are: {}",
                    v,
                    PYTHON_VERSIONS.join(", ")
                )))
            }
            None => {
                let default = PYTHON_VERSIONS.len() - 1;
                let idx = prompter.select(
                    "Choose a Python version for the project",
                    PYTHON_VERSIONS,
                    default,
                )?;
                PYTHON_VERSIONS
                    .get(idx)
                    .copied()
                    .unwrap_or(default_python_version())
                    .to_string()
            }
        };

        let env_vars = match &opts.opt_pyapp_vars {
            Some(vars) => parse_pyapp_vars(vars)?,
            None => {
                let vars = prompter.input(
                    "Enter optional PyApp variables as `KEY VALUE` pairs (leave empty for none)",
                    "",
                )?;
                parse_pyapp_vars(&vars)?
            }
        };

        Ok(InitSettings {
            builder,
            build_command,
            optional_deps,
            is_gui,
            app_entry,
            entry_type,
            python_version,
            env_vars,
        })
    }

    /// Write the settings into `[tool.box]`
    pub fn write(&self, settings: &InitSettings) -> BoxResult<()> {
        let writer = ManifestWriter::new(&self.root);
        writer.set("builder", settings.builder.as_str())?;
        if let Some(command) = &settings.build_command {
            writer.set("build_command", command.as_str())?;
        }
        writer.set("optional_deps", settings.optional_deps.as_str())?;
        writer.set("is_gui", settings.is_gui)?;
        writer.set("app_entry", settings.app_entry.as_str())?;
        writer.set("entry_type", settings.entry_type.as_str())?;
        writer.set("python_version", settings.python_version.as_str())?;
        for (key, value) in &settings.env_vars {
            writer.set_in(ENV_VARS_TABLE, key, value.as_str())?;
        }
        tracing::info!(root = %self.root.display(), "Project initialized");
        Ok(())
    }
}

/// First gui-script for GUI projects, then first script, else `<pkg>:run`
pub fn default_app_entry(manifest: &ProjectManifest, is_gui: bool) -> String {
    let entries = manifest.possible_app_entries();
    let preferred = if is_gui {
        entries.iter().find(|e| e.group == "gui-scripts")
    } else {
        entries.iter().find(|e| e.group == "scripts")
    };
    preferred
        .or_else(|| entries.first())
        .map(|e| e.value.clone())
        .unwrap_or_else(|| format!("{}:run", manifest.name_pkg()))
}

/// Parse `KEY VALUE [KEY VALUE ...]`
pub fn parse_pyapp_vars(vars: &str) -> BoxResult<Vec<(String, String)>> {
    let parts: Vec<&str> = vars.split_whitespace().collect();
    if parts.len() % 2 != 0 {
        return Err(BoxError::Config(
            "Optional PyApp variables must be given as `KEY VALUE` pairs separated by spaces."
                .to_string(),
        ));
    }
    Ok(parts
        .chunks(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect())
}
