//! Tests for pyproject.toml reading and writing

use box_packager::{EntryType, ManifestWriter, ProjectManifest, ENV_VARS_TABLE};
use std::fs;
use tempfile::TempDir;

const FULL: &str = r#"
# project comment
[project]
name = "qt-demo"
version = "1.2.0"
authors = [{ name = "Jane Doe", email = "jane@example.com" }]

[project.scripts]
qt-demo-cli = "qt_demo.cli:main"

[project.gui-scripts]
qt-demo = "qt_demo.app:run"

[tool.rye]
managed = true

[tool.box]
builder = "rye"
app_entry = "qt_demo.app:run"
entry_type = "spec"
python_version = "3.12"
optional_deps = "gui"
is_gui = true
"#;

#[test]
fn test_parse_full_manifest() {
    let manifest = ProjectManifest::parse(FULL).unwrap();

    assert_eq!(manifest.name(), "qt-demo");
    assert_eq!(manifest.name_pkg(), "qt_demo");
    assert_eq!(manifest.version(), "1.2.0");
    assert_eq!(manifest.author(), "Jane Doe");
    assert!(manifest.is_box_project());
    assert_eq!(manifest.builder().unwrap(), "rye");
    assert_eq!(manifest.app_entry().unwrap(), "qt_demo.app:run");
    assert_eq!(manifest.entry_type(), EntryType::Spec);
    assert_eq!(manifest.python_version(), Some("3.12"));
    assert_eq!(manifest.optional_dependencies(), Some("gui"));
    assert!(manifest.is_gui());
    assert_eq!(manifest.detected_builder(), Some("rye"));
}

#[test]
fn test_possible_entries_gui_first() {
    let manifest = ProjectManifest::parse(FULL).unwrap();
    let entries = manifest.possible_app_entries();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].group, "gui-scripts");
    assert_eq!(entries[0].value, "qt_demo.app:run");
    assert_eq!(entries[1].name, "qt-demo-cli");
}

#[test]
fn test_missing_file() {
    let temp = TempDir::new().unwrap();
    let err = ProjectManifest::from_dir(temp.path()).unwrap_err();
    assert!(err.to_string().contains("pyproject.toml"));
}

#[test]
fn test_non_box_project() {
    let manifest = ProjectManifest::parse("[project]\nname = \"a\"\nversion = \"1\"\n").unwrap();
    let err = manifest.ensure_box_project().unwrap_err();
    assert!(err.to_string().contains("not a box project"));
    assert!(manifest.builder().is_err());
}

#[test]
fn test_writer_preserves_formatting() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pyproject.toml");
    fs::write(&path, "# keep me\n[project]\nname = \"demo\"\nversion = \"0.1.0\"\n").unwrap();

    let writer = ManifestWriter::new(temp.path());
    writer.set("builder", "hatch").unwrap();
    writer.set("is_gui", false).unwrap();
    writer.set_in(ENV_VARS_TABLE, "PYAPP_UV_ENABLED", true).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# keep me\n"));
    assert!(!content.contains('\r'));

    let manifest = ProjectManifest::from_dir(temp.path()).unwrap();
    assert_eq!(manifest.builder().unwrap(), "hatch");
    assert_eq!(manifest.env_vars()["PYAPP_UV_ENABLED"], "true");
}

#[test]
fn test_unset_and_uninitialize() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("pyproject.toml"), FULL).unwrap();
    let writer = ManifestWriter::new(temp.path());

    writer.set_in(ENV_VARS_TABLE, "A", "1").unwrap();
    assert!(writer.unset_in(ENV_VARS_TABLE, "A").unwrap());
    assert!(!writer.unset_in(ENV_VARS_TABLE, "A").unwrap());

    writer.uninitialize().unwrap();
    let manifest = ProjectManifest::from_dir(temp.path()).unwrap();
    assert!(!manifest.is_box_project());
    assert_eq!(manifest.detected_builder(), Some("rye"));
}
