//! Windows installers built with NSIS
//!
//! A Modern UI script is generated next to the release binary, compiled with
//! `makensis` from inside `target/release/` and removed afterwards.

use crate::error::{BoxError, BoxResult};
use handlebars::Handlebars;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Name of the temporary script written into the release folder
pub const SCRIPT_NAME: &str = "make_installer.nsi";

const NSI_TEMPLATE: &str = include_str!("templates/installer.nsi");

/// Inputs of an NSIS installer script
#[derive(Debug, Clone)]
pub struct NsisProject {
    /// Project name, used for folders, registry keys and shortcuts
    pub name: String,
    /// File name of the installer NSIS produces
    pub installer_name: String,
    /// Publisher shown in "Apps & features"
    pub author: String,
    /// Project version
    pub version: String,
    /// File name of the release binary inside the release folder
    pub binary_name: String,
    /// Icon for GUI installers; `None` builds a CLI installer
    pub icon: Option<PathBuf>,
}

impl NsisProject {
    /// Render the installer script
    ///
    /// GUI installers (with an icon) also get start menu shortcuts. CLI
    /// installers end with a page reminding the user to update `PATH`.
    pub fn script(&self) -> BoxResult<String> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);

        let mut data = BTreeMap::new();
        data.insert("name", escape_nsis(&self.name));
        data.insert("installer_name", escape_nsis(&self.installer_name));
        data.insert("author", escape_nsis(&self.author));
        data.insert("version", escape_nsis(&self.version));
        data.insert("binary_name", escape_nsis(&self.binary_name));
        if let Some(icon) = &self.icon {
            data.insert("icon", escape_nsis(&icon.to_string_lossy()));
        }

        handlebars
            .register_template_string("installer.nsi", NSI_TEMPLATE)
            .map_err(|e| BoxError::Template(format!("failed to register NSI template: {}", e)))?;

        handlebars
            .render("installer.nsi", &data)
            .map_err(|e| BoxError::Template(format!("failed to render NSI template: {}", e)))
    }
}

/// Escape a value placed inside a double-quoted NSIS string
pub fn escape_nsis(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '$' => escaped.push_str("$$"),
            '"' => escaped.push_str("$\\\""),
            '\n' => escaped.push_str("$\\n"),
            '\r' => escaped.push_str("$\\r"),
            '\t' => escaped.push_str("$\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Check `makensis` is installed, returns its version
pub fn check_makensis() -> BoxResult<String> {
    let output = Command::new("makensis")
        .arg("-VERSION")
        .output()
        .map_err(|_| {
            BoxError::Toolchain(
                "NSIS is not installed or not available on the PATH. \
                 Please install NSIS and try again. \
                 For more info, go to https://nsis.sourceforge.io"
                    .to_string(),
            )
        })?;

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Write the script into `release_dir`, compile it and remove it again
///
/// Returns the path of the produced installer.
pub fn build_installer(
    project: &NsisProject,
    release_dir: &Path,
    verbose: bool,
) -> BoxResult<PathBuf> {
    let version = check_makensis()?;
    tracing::info!(nsis = %version, "Running makensis");

    // UTF-8 with BOM so makensis does not read it in the ANSI codepage
    let script = release_dir.join(SCRIPT_NAME);
    fs::write(&script, format!("\u{feff}{}", project.script()?))?;

    let mut cmd = Command::new("makensis");
    cmd.arg(SCRIPT_NAME).current_dir(release_dir);
    if !verbose {
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
    }
    let status = cmd.status();

    fs::remove_file(&script)?;

    let status =
        status.map_err(|e| BoxError::Toolchain(format!("Failed to run makensis: {}", e)))?;

    let installer = release_dir.join(&project.installer_name);
    if !installer.is_file() {
        return Err(BoxError::Installer(format!(
            "makensis did not produce {} (status: {}). Run `box installer -v` to see its output.",
            project.installer_name, status
        )));
    }

    Ok(installer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(icon: Option<PathBuf>) -> NsisProject {
        NsisProject {
            name: "demo".to_string(),
            installer_name: "demo-v0.1.0-win.exe".to_string(),
            author: "Jane Doe".to_string(),
            version: "0.1.0".to_string(),
            binary_name: "demo.exe".to_string(),
            icon,
        }
    }

    #[test]
    fn test_cli_script() {
        let script = project(None).script().unwrap();
        assert!(script.contains("!define PRODUCT_NAME \"demo\""));
        assert!(script.contains("OutFile \"demo-v0.1.0-win.exe\""));
        assert!(script.contains("!define BINARY \"demo.exe\""));
        assert!(script.contains("File \"${BINARY}\""));
        assert!(script.contains("!define PUBLISHER \"Jane Doe\""));
        assert!(script.contains("${LANG_ENGLISH}"));
        assert!(script.contains("MUI_PAGE_FINISH"));
        assert!(!script.contains("MUI_ICON"));
        assert!(!script.contains("StartMenuFolder"));
        assert!(!script.contains("{{"));
    }

    #[test]
    fn test_gui_script_has_icon_and_shortcuts() {
        let script = project(Some(PathBuf::from("C:\\proj\\assets\\icon.ico")))
            .script()
            .unwrap();
        assert!(script.contains("!define ICON \"C:\\proj\\assets\\icon.ico\""));
        assert!(script.contains("!define MUI_ICON \"${ICON}\""));
        assert!(script.contains("$SMPROGRAMS\\$StartMenuFolder\\${PRODUCT_NAME}.lnk"));
        assert!(script.contains("\"DisplayIcon\""));
        assert!(script.contains("!define PRODUCT_VERSION \"0.1.0\""));
        assert!(!script.contains("MUI_PAGE_FINISH"));
    }

    #[test]
    fn test_both_scripts_share_install_and_uninstall_sections() {
        let cli = project(None).script().unwrap();
        let gui = project(Some(PathBuf::from("icon.ico"))).script().unwrap();
        for script in [&cli, &gui] {
            assert!(script.contains("WriteUninstaller \"$INSTDIR\\${UNINSTALLER}\""));
            assert!(script.contains("RMDir /r \"$LOCALAPPDATA\\pyapp\\data\\${PRODUCT_NAME}\""));
            assert!(script.contains("DeleteRegKey HKCU \"${UNINSTALL_KEY}\""));
        }
    }

    #[test]
    fn test_quotes_in_metadata_are_escaped() {
        let mut project = project(Some(PathBuf::from("C:\\My \"Apps\"\\icon.ico")));
        project.author = "Jane \"JD\" Doe".to_string();
        project.name = "demo $PROFILE".to_string();
        let script = project.script().unwrap();

        assert!(script.contains("!define PUBLISHER \"Jane $\\\"JD$\\\" Doe\""));
        assert!(script.contains("!define PRODUCT_NAME \"demo $$PROFILE\""));
        assert!(script.contains("!define ICON \"C:\\My $\\\"Apps$\\\"\\icon.ico\""));
        assert!(!script.contains("Jane \"JD"));
    }

    #[test]
    fn test_escape_nsis() {
        assert_eq!(escape_nsis("plain"), "plain");
        assert_eq!(escape_nsis("a\"b"), "a$\\\"b");
        assert_eq!(escape_nsis("$x"), "$$x");
        assert_eq!(escape_nsis("one\ntwo"), "one$\\ntwo");
    }
}
