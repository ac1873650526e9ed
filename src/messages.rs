//! User-facing notices
//!
//! Every command reports through these helpers so the output has a uniform
//! `Info:` / `Success:` / `Warning:` prefix.

use console::style;

/// Print an informational message
pub fn info(msg: impl AsRef<str>) {
    println!("{} {}", style("Info:").blue(), msg.as_ref());
}

/// Print a success message
pub fn success(msg: impl AsRef<str>) {
    println!("{} {}", style("Success:").green(), msg.as_ref());
}

/// Print a warning message
pub fn warning(msg: impl AsRef<str>) {
    println!("{} {}", style("Warning:").yellow(), msg.as_ref());
}

/// Print an error message on stderr
pub fn error(msg: impl AsRef<str>) {
    eprintln!("{} {}", style("Error:").red().bold(), msg.as_ref());
}
