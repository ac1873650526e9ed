//! Tests for the `env` sub-commands

use box_packager::env_vars::{get_variable, list_variables, set_variable, unset_variable};
use box_packager::{ProjectManifest, VariableType};
use std::fs;
use tempfile::TempDir;

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("pyproject.toml"),
        "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n\n[tool.box]\nbuilder = \"build\"\n",
    )
    .unwrap();
    temp
}

#[test]
fn test_typed_values_are_stored() {
    let temp = project();

    let msg = set_variable(temp.path(), "PYAPP_UV_ENABLED=TRUE", VariableType::Bool).unwrap();
    assert_eq!(
        msg,
        "Variable PYAPP_UV_ENABLED successfully set to true (type bool)."
    );
    set_variable(temp.path(), "PYAPP_PIP_VERSION=24", VariableType::Int).unwrap();
    set_variable(temp.path(), "PYAPP_DISTRIBUTION_SOURCE=https://x", VariableType::String)
        .unwrap();

    let content = fs::read_to_string(temp.path().join("pyproject.toml")).unwrap();
    assert!(content.contains("PYAPP_UV_ENABLED = true"));
    assert!(content.contains("PYAPP_PIP_VERSION = 24"));

    let manifest = ProjectManifest::from_dir(temp.path()).unwrap();
    assert_eq!(
        get_variable(&manifest, "PYAPP_PIP_VERSION").as_deref(),
        Some("24")
    );
    let keys: Vec<String> = list_variables(&manifest).into_keys().collect();
    assert_eq!(
        keys,
        ["PYAPP_DISTRIBUTION_SOURCE", "PYAPP_PIP_VERSION", "PYAPP_UV_ENABLED"]
    );
}

#[test]
fn test_invalid_key_value() {
    let temp = project();
    let err = set_variable(temp.path(), "NO_VALUE", VariableType::String).unwrap_err();
    assert!(err
        .to_string()
        .contains("Variables to set must be a key-value pair"));
}

#[test]
fn test_unset() {
    let temp = project();
    set_variable(temp.path(), "A=1", VariableType::String).unwrap();

    assert!(unset_variable(temp.path(), "A").unwrap());
    assert!(!unset_variable(temp.path(), "A").unwrap());
    let manifest = ProjectManifest::from_dir(temp.path()).unwrap();
    assert!(get_variable(&manifest, "A").is_none());
}
