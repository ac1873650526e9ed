//! Tests for project initialization

use box_packager::{BoxResult, EntryType, InitOptions, Initializer, ProjectManifest, Prompter};
use std::cell::RefCell;
use std::fs;
use tempfile::TempDir;

/// Answers prompts from a script and records the questions
struct ScriptedPrompter {
    inputs: RefCell<Vec<String>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: RefCell::new(inputs.iter().rev().map(|s| s.to_string()).collect()),
            asked: RefCell::new(Vec::new()),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, prompt: &str, default: &str) -> BoxResult<String> {
        self.asked.borrow_mut().push(prompt.to_string());
        Ok(self
            .inputs
            .borrow_mut()
            .pop()
            .unwrap_or_else(|| default.to_string()))
    }

    fn select(&self, prompt: &str, _items: &[&str], default: usize) -> BoxResult<usize> {
        self.asked.borrow_mut().push(prompt.to_string());
        Ok(default)
    }

    fn confirm(&self, prompt: &str, _default: bool) -> BoxResult<bool> {
        self.asked.borrow_mut().push(prompt.to_string());
        Ok(true)
    }
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("pyproject.toml"),
        r#"[project]
name = "my-app"
version = "0.3.0"

[project.gui-scripts]
my-app = "my_app.gui:main"

[tool.pdm]
"#,
    )
    .unwrap();
    temp
}

#[test]
fn test_quiet_init_writes_defaults() {
    let temp = project();
    let options = InitOptions {
        quiet: true,
        ..Default::default()
    };

    let settings = Initializer::new(temp.path(), options).initialize().unwrap();
    assert_eq!(settings.builder, "pdm");

    let manifest = ProjectManifest::from_dir(temp.path()).unwrap();
    assert!(manifest.is_box_project());
    assert_eq!(manifest.builder().unwrap(), "pdm");
    assert_eq!(manifest.app_entry().unwrap(), "my_app.gui:main");
    assert_eq!(manifest.entry_type(), EntryType::Spec);
    assert_eq!(manifest.python_version(), Some("3.13"));
    assert!(!manifest.is_gui());
    assert!(manifest.env_vars().is_empty());
}

#[test]
fn test_flags_skip_prompts() {
    let temp = project();
    let options = InitOptions {
        builder: Some("build".to_string()),
        optional_deps: Some(String::new()),
        gui: Some(true),
        app_entry: Some("my_app:start".to_string()),
        entry_type: Some(EntryType::Module),
        python_version: Some("3.11".to_string()),
        opt_pyapp_vars: Some("PYAPP_FULL_ISOLATION 1".to_string()),
        ..Default::default()
    };
    let prompter = ScriptedPrompter::new(&[]);

    Initializer::new(temp.path(), options)
        .initialize_with(&prompter)
        .unwrap();
    assert!(prompter.asked.borrow().is_empty());

    let manifest = ProjectManifest::from_dir(temp.path()).unwrap();
    assert!(manifest.is_gui());
    assert_eq!(manifest.entry_type(), EntryType::Module);
    assert_eq!(manifest.python_version(), Some("3.11"));
    assert_eq!(manifest.env_vars()["PYAPP_FULL_ISOLATION"], "1");
}

#[test]
fn test_interactive_answers_are_written() {
    let temp = project();
    let prompter = ScriptedPrompter::new(&["gui", "my_app.gui:main", "PYAPP_UV_ENABLED 1"]);

    Initializer::new(temp.path(), InitOptions::default())
        .initialize_with(&prompter)
        .unwrap();

    let manifest = ProjectManifest::from_dir(temp.path()).unwrap();
    assert_eq!(manifest.optional_dependencies(), Some("gui"));
    assert!(manifest.is_gui());
    assert_eq!(manifest.env_vars()["PYAPP_UV_ENABLED"], "1");
}

#[test]
fn test_unknown_builder_rejected() {
    let temp = project();
    let options = InitOptions {
        quiet: true,
        builder: Some("poetry".to_string()),
        ..Default::default()
    };

    let err = Initializer::new(temp.path(), options).initialize().unwrap_err();
    assert!(err.to_string().contains("poetry"));
    assert!(!ProjectManifest::from_dir(temp.path())
        .unwrap()
        .is_box_project());
}

#[test]
fn test_custom_builder_keeps_command() {
    let temp = project();
    let options = InitOptions {
        quiet: true,
        builder: Some("custom".to_string()),
        build_command: Some("make sdist".to_string()),
        ..Default::default()
    };

    Initializer::new(temp.path(), options).initialize().unwrap();
    let manifest = ProjectManifest::from_dir(temp.path()).unwrap();
    assert_eq!(manifest.build_command(), Some("make sdist"));
}
