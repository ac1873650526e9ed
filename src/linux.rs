//! Self-extracting bash installers for Linux
//!
//! An installer is a bash preamble followed by the raw program binary. The
//! preamble ends with a `#__PROGRAM_BINARY__` marker line; at install time it
//! copies everything after that line to the chosen location. GUI installers
//! append a second `#__ICON_BINARY__` block with the icon and write a desktop
//! entry and an uninstaller on the target machine.

use crate::error::BoxResult;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Line separating the preamble from the program binary
pub const PROGRAM_MARKER: &str = "#__PROGRAM_BINARY__";

/// Line separating the program binary from the icon
pub const ICON_MARKER: &str = "#__ICON_BINARY__";

/// Quote a value as a single bash word
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Flatten a value for a `#` comment line
fn comment_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Preamble for a CLI installer
pub fn cli_script(name: &str, version: &str) -> String {
    let title = comment_safe(name);
    let title_version = comment_safe(version);
    let name = shell_quote(name);

    format!(
        r#"#!/bin/bash
# This is a generated installer for {title} v{title_version}

# Default installation name and folder
INSTALL_NAME={name}
INSTALL_DIR=/usr/local/bin

# Check if user has a better path:
read -p "Enter the installation path (default: $INSTALL_DIR): " USER_INSTALL_DIR
if [ ! -z "$USER_INSTALL_DIR" ]; then
    INSTALL_DIR=$USER_INSTALL_DIR
fi

# Check if installation folder exists
if [ ! -d "$INSTALL_DIR" ]; then
    echo "Error: Installation folder does not exist."
    exit 1
fi

# Check if installation folder requires root access
if [ ! -w "$INSTALL_DIR" ]; then
    echo "Error: Installation folder requires root access. Please run with sudo."
    exit 1
fi

INSTALL_FILE="$INSTALL_DIR/$INSTALL_NAME"

# check if installation file already exist and if it does, ask if overwrite is ok
if [ -f "$INSTALL_FILE" ]; then
    read -p "File already exists. Overwrite? (y/n): " OVERWRITE
    if [ "$OVERWRITE" != "y" ]; then
        echo "Installation aborted."
        exit 1
    fi
fi

if ! [[ ":$PATH:" == *":$INSTALL_DIR:"* ]]; then
  echo "$INSTALL_DIR is not on your PATH. Please add it."
fi


sed -e '1,/^{PROGRAM_MARKER}$/d' "$0" > "$INSTALL_FILE"
chmod +x "$INSTALL_FILE"

echo "Successfully installed $INSTALL_NAME to $INSTALL_DIR"
exit 0
{PROGRAM_MARKER}
"#
    )
}

/// Preamble for a GUI installer
pub fn gui_script(name: &str, version: &str, icon_name: &str) -> String {
    let title = comment_safe(name);
    let title_version = comment_safe(version);
    let name = shell_quote(name);
    let icon_name = shell_quote(icon_name);

    format!(
        r##"#!/bin/bash
#
# This script is used to install {title}, {title_version}.

# Program specific variables
INSTALL_NAME={name}
ICON_NAME={icon_name}

# Default installation name and folder
INSTALL_DIR="$HOME/.local/share/$INSTALL_NAME"
DESKTOP_DIR="$HOME/.local/share/applications"

# Check if user has a better path:
read -p "Enter the installation path (absolute path) or press enter for using the default: $INSTALL_DIR): " USER_INSTALL_DIR
if [ ! -z "$USER_INSTALL_DIR" ]; then
    INSTALL_DIR=$USER_INSTALL_DIR
fi

# Check if user has a better Desktop path:
read -p "Enter the path for the desktop file or press enter for using the default: $DESKTOP_DIR): " USER_DESKTOP_DIR
if [ ! -z "$USER_DESKTOP_DIR" ]; then
    DESKTOP_DIR=$USER_DESKTOP_DIR
fi

# Check if installation folder exists
if [ -d "$INSTALL_DIR" ]; then
    # ask if installation folder should be used even though it exists
    read -p "Installation folder already exists. Continue? (y/n): " CONTINUE
    if [ "$CONTINUE" != "y" ]; then
        echo "Installation aborted."
        exit 1
    fi
else
    # create folder
    mkdir -p "$INSTALL_DIR"
fi

# Check if desktop file folder exists, if not throw an error
if [ ! -d "$DESKTOP_DIR" ]; then
    echo "Error: Desktop file folder does not exist. Please create it first or provide a valid path."
    exit 1
fi

# Check if installation folder requires root access
if [ ! -w "$INSTALL_DIR" ]; then
    echo "Error: Installation folder requires root access. Please run with sudo."
    exit 1
fi

# Check if desktop file folder requires root access
if [ ! -w "$DESKTOP_DIR" ]; then
    echo "Error: Desktop file folder requires root access. Please run with sudo."
    exit 1
fi

INSTALL_FILE="$INSTALL_DIR/$INSTALL_NAME"
ICON_FILE="$INSTALL_DIR/$ICON_NAME"
DESKTOP_FILE="$DESKTOP_DIR/$INSTALL_NAME.desktop"

# check if installation file already exist and if it does, ask if overwrite is ok
if [ -f "$INSTALL_FILE" ]; then
    read -p "File already exists. Overwrite? (y/n): " OVERWRITE
    if [ "$OVERWRITE" != "y" ]; then
        echo "Installation aborted."
        exit 1
    fi
fi

# check if icon file already exist and if it does, ask if overwrite is ok
if [ -f "$ICON_FILE" ]; then
    read -p "Icon file already exists. Overwrite? (y/n): " OVERWRITE
    if [ "$OVERWRITE" != "y" ]; then
        echo "Installation aborted."
        exit 1
    fi
fi

# check if desktop file already exist and if it does, ask if overwrite is ok
if [ -f "$DESKTOP_FILE" ]; then
    read -p "Desktop file already exists. Overwrite? (y/n): " OVERWRITE
    if [ "$OVERWRITE" != "y" ]; then
        echo "Installation aborted."
        exit 1
    fi
fi

# do the copying
sed -n '/^{PROGRAM_MARKER}$/,/^{ICON_MARKER}$/p' < "$0" | sed '1d;$d' > "$INSTALL_FILE"
sed -e '1,/^{ICON_MARKER}$/d' "$0" > "$ICON_FILE"

# make the installation file executable
chmod +x "$INSTALL_FILE"

# Create the desktop file
cat > "$DESKTOP_FILE" <<DESKTOP_ENTRY
[Desktop Entry]
Type=Application
Name=$INSTALL_NAME
Exec="$INSTALL_FILE"
Icon=$ICON_FILE
DESKTOP_ENTRY
chmod +x "$DESKTOP_FILE"

# Finally, let's create a bash uninstaller script and make it executable
UNINSTALL_FILE="$INSTALL_DIR/uninstall_$INSTALL_NAME.sh"
{{
    echo "#!/bin/bash"
    echo ""
    printf 'read -p %q CONTINUE\n' "This will delete the program folder, program data, and desktop integration file for $INSTALL_NAME. Continue? (y/n): "
    echo 'if [ "$CONTINUE" != "y" ]; then'
    echo '    echo "Uninstaller aborted."'
    echo '    exit 1'
    echo 'fi'
    echo ""
    printf 'rm -f %q\n' "$INSTALL_FILE" "$ICON_FILE" "$UNINSTALL_FILE"
    printf 'rmdir %q\n' "$INSTALL_DIR"
    printf 'rm -f %q\n' "$DESKTOP_FILE"
    printf 'rm -rf %q\n' "$HOME/.local/share/pyapp/$INSTALL_NAME"
    echo ""
    printf 'echo %q\n' "Successfully uninstalled $INSTALL_NAME."
    echo "exit 0"
}} > "$UNINSTALL_FILE"
chmod +x "$UNINSTALL_FILE"

# Notify user of successful installation
echo "Successfully installed $INSTALL_NAME to $INSTALL_DIR"
exit 0
{PROGRAM_MARKER}
"##
    )
}

/// Write a CLI installer to `out`
pub fn write_cli_installer(
    out: &Path,
    binary: &Path,
    name: &str,
    version: &str,
) -> BoxResult<()> {
    let mut writer = BufWriter::new(File::create(out)?);
    writer.write_all(cli_script(name, version).as_bytes())?;
    writer.write_all(&fs::read(binary)?)?;
    writer.flush()?;
    drop(writer);

    make_executable(out)
}

/// Write a GUI installer with the icon block to `out`
pub fn write_gui_installer(
    out: &Path,
    binary: &Path,
    icon: &Path,
    name: &str,
    version: &str,
) -> BoxResult<()> {
    let icon_name = icon
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut writer = BufWriter::new(File::create(out)?);
    writer.write_all(gui_script(name, version, &icon_name).as_bytes())?;
    writer.write_all(&fs::read(binary)?)?;
    writer.write_all(format!("\n{}\n", ICON_MARKER).as_bytes())?;
    writer.write_all(&fs::read(icon)?)?;
    writer.flush()?;
    drop(writer);

    make_executable(out)
}

/// Copy every read bit to the matching execute bit
#[cfg(unix)]
pub fn make_executable(path: &Path) -> BoxResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    let mode = perms.mode();
    perms.set_mode(mode | ((mode & 0o444) >> 2));
    fs::set_permissions(path, perms)?;
    Ok(())
}

/// Copy every read bit to the matching execute bit
#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> BoxResult<()> {
    Ok(())
}
