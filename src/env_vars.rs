//! `box env`: manage the `[tool.box.env-vars]` table
//!
//! Variables are stored typed (string, integer or boolean) in
//! `pyproject.toml` and stringified when handed to PyApp.

use crate::error::{BoxError, BoxResult};
use crate::manifest::{ManifestWriter, ProjectManifest, ENV_VARS_TABLE};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Storage type of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    String,
    Int,
    Bool,
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
        })
    }
}

/// Split `KEY=VALUE`
pub fn parse_key_value(key_val: &str) -> BoxResult<(&str, &str)> {
    let parts: Vec<&str> = key_val.split('=').collect();
    match parts.as_slice() {
        [key, value] => Ok((*key, *value)),
        _ => Err(BoxError::Config(
            "Variables to set must be a key-value pair".to_string(),
        )),
    }
}

/// `1`/`true` and `0`/`false`, case-insensitive
pub fn parse_bool(value: &str) -> BoxResult<bool> {
    if value == "1" || value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value == "0" || value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(BoxError::Config(format!(
            "Cannot convert {} to a boolean.",
            value
        )))
    }
}

/// Store `KEY=VALUE` with the given type, returns the success message
pub fn set_variable(root: &Path, key_val: &str, typ: VariableType) -> BoxResult<String> {
    let (key, raw) = parse_key_value(key_val)?;
    let writer = ManifestWriter::new(root);

    let shown = match typ {
        VariableType::String => {
            writer.set_in(ENV_VARS_TABLE, key, raw)?;
            raw.to_string()
        }
        VariableType::Int => {
            let value: i64 = raw.parse().map_err(|_| {
                BoxError::Config(format!("Problem converting {} to an integer", raw))
            })?;
            writer.set_in(ENV_VARS_TABLE, key, value)?;
            value.to_string()
        }
        VariableType::Bool => {
            let value = parse_bool(raw)?;
            writer.set_in(ENV_VARS_TABLE, key, value)?;
            value.to_string()
        }
    };

    Ok(format!(
        "Variable {} successfully set to {} (type {}).",
        key, shown, typ
    ))
}

/// Value of one variable
pub fn get_variable(manifest: &ProjectManifest, name: &str) -> Option<String> {
    manifest.env_vars().remove(name)
}

/// All variables, sorted by name
pub fn list_variables(manifest: &ProjectManifest) -> BTreeMap<String, String> {
    manifest.env_vars()
}

/// Remove a variable, returns whether it existed
pub fn unset_variable(root: &Path, name: &str) -> BoxResult<bool> {
    ManifestWriter::new(root).unset_in(ENV_VARS_TABLE, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("A=1").unwrap(), ("A", "1"));
        assert!(parse_key_value("A").is_err());
        assert!(parse_key_value("A=1=2").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(parse_bool("1").unwrap());
        assert!(!parse_bool("False").unwrap());
        let err = parse_bool("yes").unwrap_err();
        assert!(err.to_string().contains("Cannot convert yes"));
    }

    #[test]
    fn test_set_int_rejects_text() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();

        let err = set_variable(temp.path(), "N=abc", VariableType::Int).unwrap_err();
        assert!(err.to_string().contains("Problem converting abc"));
    }
}
