//! macOS installers
//!
//! CLI projects become a flat `.pkg` that installs the binary into
//! `/usr/local/bin`. GUI projects are wrapped into an `.app` bundle which is
//! then shipped in a drag-to-install `.dmg` built with `hdiutil`:
//!
//! 1. stage the `.app` and an `Applications` symlink in a temp folder
//! 2. create a read-write (UDRW) image from the staging folder
//! 3. mount it and lay out the Finder window with AppleScript
//! 4. detach and convert to a compressed read-only (UDZO) image

use crate::error::{BoxError, BoxResult};
use crate::source::copy_dir;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

/// Reverse-DNS prefix of every bundle and package identifier
pub const IDENTIFIER_PREFIX: &str = "com.box-package";

/// Longest `CFBundleName` macOS displays without truncation
const BUNDLE_NAME_MAX: usize = 16;

/// Install location of CLI binaries
const CLI_INSTALL_DIR: &str = "usr/local/bin";

fn identifier(name: &str) -> String {
    format!("{}.{}", IDENTIFIER_PREFIX, name)
}

/// Run a tool, capturing stderr for the error message
fn run(cmd: &mut Command, tool: &str, verbose: bool) -> BoxResult<()> {
    if verbose {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    } else {
        cmd.stdout(Stdio::null()).stderr(Stdio::piped());
    }
    let output = cmd
        .output()
        .map_err(|e| BoxError::Toolchain(format!("Failed to run {}: {}", tool, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BoxError::Installer(format!(
            "{} failed: {}",
            tool,
            stderr.trim()
        )));
    }
    Ok(())
}

// ============================================================================
// CLI: .pkg
// ============================================================================

/// Build a `.pkg` installing `binary` as `/usr/local/bin/<file name>`
pub fn build_pkg(
    binary: &Path,
    name: &str,
    version: &str,
    out: &Path,
    verbose: bool,
) -> BoxResult<()> {
    let file_name = binary.file_name().ok_or_else(|| {
        BoxError::Installer(format!("Invalid binary path {}", binary.display()))
    })?;

    let staging = tempfile::tempdir()?;
    let bin_dir = staging.path().join(CLI_INSTALL_DIR);
    fs::create_dir_all(&bin_dir)?;
    fs::copy(binary, bin_dir.join(file_name))?;

    if out.exists() {
        fs::remove_file(out)?;
    }

    tracing::info!(pkg = %out.display(), "Running pkgbuild");
    let mut cmd = Command::new("pkgbuild");
    cmd.arg("--root")
        .arg(staging.path())
        .args(["--identifier", &identifier(name)])
        .args(["--version", version])
        .args(["--install-location", "/"])
        .arg(out);
    run(&mut cmd, "pkgbuild", verbose)
}

// ============================================================================
// GUI: .app
// ============================================================================

/// `Info.plist` content of an app bundle
pub fn info_plist(
    name: &str,
    author: &str,
    version: &str,
    icon_name: &str,
) -> plist::Dictionary {
    let short_name: String = name.chars().take(BUNDLE_NAME_MAX).collect();

    let entries = [
        ("CFBundleInfoDictionaryVersion", "6.0".to_string()),
        ("CFBundleDevelopmentRegion", "en".to_string()),
        ("CFBundlePackageType", "APPL".to_string()),
        ("CFBundleIdentifier", identifier(name)),
        ("CFBundleExecutable", name.to_string()),
        ("CFBundleIconFile", icon_name.to_string()),
        ("CFBundleDisplayName", name.to_string()),
        ("CFBundleName", short_name),
        ("CFBundleVersion", version.to_string()),
        ("CFBundleShortVersionString", version.to_string()),
        ("NSHumanReadableCopyright", author.to_string()),
        ("CFBundleSignature", "????".to_string()),
    ];

    let mut dict = plist::Dictionary::new();
    for (key, value) in entries {
        dict.insert(key.to_string(), plist::Value::String(value));
    }
    dict
}

/// Create `<release_dir>/<name>.app` from the release binary and icon
pub fn make_app(
    release_dir: &Path,
    name: &str,
    author: &str,
    version: &str,
    icon: &Path,
) -> BoxResult<PathBuf> {
    let app = release_dir.join(format!("{}.app", name));
    if app.exists() {
        fs::remove_dir_all(&app)?;
    }

    let icon_name = icon
        .file_name()
        .ok_or_else(|| BoxError::Installer(format!("Invalid icon path {}", icon.display())))?;

    let resources = app.join("Contents/Resources");
    fs::create_dir_all(&resources)?;
    fs::copy(icon, resources.join(icon_name))?;

    let macos = app.join("Contents/MacOS");
    fs::create_dir_all(&macos)?;
    fs::copy(release_dir.join(name), macos.join(name))?;

    let plist = info_plist(name, author, version, &icon_name.to_string_lossy());
    plist::Value::Dictionary(plist).to_file_xml(app.join("Contents/Info.plist"))?;

    tracing::debug!(app = %app.display(), "Created app bundle");
    Ok(app)
}

// ============================================================================
// GUI: .dmg
// ============================================================================

/// Optional disk image background, looked up next to the app icon
pub const DMG_BACKGROUND_FILE: &str = "dmg-background.png";

/// Folder of the volume holding the background picture, hidden by Finder
const DMG_BACKGROUND_DIR: &str = ".background";

/// Finder window background of the disk image
#[derive(Debug, Clone, PartialEq)]
pub enum DmgBackground {
    /// Solid colour, 16-bit RGB channels as Finder expects
    Color(u16, u16, u16),
    /// Picture copied into the image
    Image(PathBuf),
}

impl Default for DmgBackground {
    fn default() -> Self {
        Self::Color(65535, 65535, 65535)
    }
}

impl DmgBackground {
    /// [`DMG_BACKGROUND_FILE`] in the icon's folder if present, white otherwise
    pub fn for_icon(icon: &Path) -> Self {
        icon.parent()
            .map(|dir| dir.join(DMG_BACKGROUND_FILE))
            .filter(|p| p.is_file())
            .map(Self::Image)
            .unwrap_or_default()
    }

    fn applescript(&self) -> String {
        match self {
            Self::Color(r, g, b) => format!(
                "    set background color of viewOptions to {{{}, {}, {}}}\n",
                r, g, b
            ),
            Self::Image(path) => format!(
                "    set background picture of viewOptions to file \"{}:{}\"\n",
                DMG_BACKGROUND_DIR,
                escape_applescript(&file_name_of(path))
            ),
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Layout of the disk image window
#[derive(Debug, Clone, PartialEq)]
pub struct DmgSettings {
    /// Bundles copied into the image
    pub files: Vec<PathBuf>,
    /// Symlinks created in the image, name to target
    pub symlinks: BTreeMap<String, String>,
    /// Icon positions in the Finder window
    pub icon_locations: BTreeMap<String, (u32, u32)>,
    /// Finder window background
    pub background: DmgBackground,
}

impl DmgSettings {
    /// Drag-to-install layout for `<name>.app`
    pub fn new(release_dir: &Path, name: &str) -> Self {
        let app_name = format!("{}.app", name);
        let app = std::path::absolute(release_dir.join(&app_name))
            .unwrap_or_else(|_| release_dir.join(&app_name));

        Self {
            files: vec![app],
            symlinks: BTreeMap::from([(
                "Applications".to_string(),
                "/Applications".to_string(),
            )]),
            icon_locations: BTreeMap::from([
                (app_name, (140, 120)),
                ("Applications".to_string(), (500, 120)),
            ]),
            background: DmgBackground::default(),
        }
    }

    /// Replace the window background
    pub fn with_background(mut self, background: DmgBackground) -> Self {
        self.background = background;
        self
    }

    /// AppleScript placing the icons in the mounted volume
    pub fn applescript(&self, volume_name: &str) -> String {
        let mut script = String::new();
        script.push_str("tell application \"Finder\"\n");
        script.push_str(&format!(
            "  tell disk \"{}\"\n",
            escape_applescript(volume_name)
        ));
        script.push_str("    open\n");
        script.push_str("    set current view of container window to icon view\n");
        script.push_str("    set toolbar visible of container window to false\n");
        script.push_str("    set statusbar visible of container window to false\n");
        script.push_str("    set the bounds of container window to {100, 100, 740, 500}\n");
        script.push_str("    set viewOptions to the icon view options of container window\n");
        script.push_str("    set arrangement of viewOptions to not arranged\n");
        script.push_str("    set icon size of viewOptions to 128\n");
        script.push_str(&self.background.applescript());
        for (item, (x, y)) in &self.icon_locations {
            script.push_str(&format!(
                "    set position of item \"{}\" of container window to {{{}, {}}}\n",
                escape_applescript(item),
                x,
                y
            ));
        }
        script.push_str("    close\n");
        script.push_str("  end tell\n");
        script.push_str("end tell\n");
        script
    }
}

/// Escape a string for an AppleScript literal
fn escape_applescript(s: &str) -> String {
    s.replace('\\', r"\\").replace('"', r#"\""#)
}

/// Build `dmg_path` from the settings
pub fn build_dmg(
    settings: &DmgSettings,
    dmg_path: &Path,
    volume_name: &str,
    verbose: bool,
) -> BoxResult<()> {
    let staging = tempfile::tempdir()?;
    for file in &settings.files {
        let name = file.file_name().ok_or_else(|| {
            BoxError::Installer(format!("Invalid bundle path {}", file.display()))
        })?;
        copy_dir(file, &staging.path().join(name))?;
    }
    stage_symlinks(staging.path(), &settings.symlinks)?;
    if let DmgBackground::Image(picture) = &settings.background {
        let dir = staging.path().join(DMG_BACKGROUND_DIR);
        fs::create_dir_all(&dir)?;
        fs::copy(picture, dir.join(file_name_of(picture)))?;
    }

    if dmg_path.exists() {
        fs::remove_file(dmg_path)?;
    }
    let rw_path = dmg_path.with_extension("rw.dmg");
    if rw_path.exists() {
        fs::remove_file(&rw_path)?;
    }

    tracing::info!(dmg = %dmg_path.display(), "Creating disk image");
    let mut create = Command::new("hdiutil");
    create
        .args(["create", "-volname", volume_name, "-srcfolder"])
        .arg(staging.path())
        .args(["-ov", "-format", "UDRW"])
        .arg(&rw_path);
    run(&mut create, "hdiutil create", verbose)?;

    if let Err(e) = customize(settings, &rw_path, volume_name, verbose) {
        tracing::warn!(error = %e, "Could not lay out disk image window");
    }

    let mut convert = Command::new("hdiutil");
    convert
        .arg("convert")
        .arg(&rw_path)
        .args(["-format", "UDZO", "-o"])
        .arg(dmg_path);
    let converted = run(&mut convert, "hdiutil convert", verbose);
    fs::remove_file(&rw_path)?;
    converted
}

#[cfg(unix)]
fn stage_symlinks(staging: &Path, symlinks: &BTreeMap<String, String>) -> BoxResult<()> {
    for (name, target) in symlinks {
        std::os::unix::fs::symlink(target, staging.join(name))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn stage_symlinks(_staging: &Path, _symlinks: &BTreeMap<String, String>) -> BoxResult<()> {
    Ok(())
}

/// Mount the read-write image, run the layout script and detach
fn customize(
    settings: &DmgSettings,
    rw_path: &Path,
    volume_name: &str,
    verbose: bool,
) -> BoxResult<()> {
    let mut attach = Command::new("hdiutil");
    attach
        .arg("attach")
        .arg(rw_path)
        .args(["-readwrite", "-noverify", "-nobrowse"]);
    run(&mut attach, "hdiutil attach", verbose)?;

    let mount_point = PathBuf::from("/Volumes").join(volume_name);
    for _ in 0..10 {
        if mount_point.exists() {
            break;
        }
        std::thread::sleep(Duration::from_millis(500));
    }

    let mut osascript = Command::new("osascript");
    osascript.args(["-e", &settings.applescript(volume_name)]);
    let laid_out = run(&mut osascript, "osascript", verbose);

    let mut detach = Command::new("hdiutil");
    detach.arg("detach").arg(&mount_point).arg("-quiet");
    run(&mut detach, "hdiutil detach", verbose)?;

    laid_out
}
