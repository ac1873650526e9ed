//! End-to-end tests for the packaging pipeline
//!
//! The Rust toolchain is replaced with a small shell script that writes the
//! PyApp variables it receives into the "binary", so the whole pipeline runs
//! offline without compiling anything.

#![cfg(unix)]

use box_packager::{Compiler, Downloader, Packager, ProjectLayout, SourceOrigin};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FAKE_CARGO: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "cargo 1.90.0 (fake)"
    exit 0
fi
mkdir -p target/release
echo "$PYAPP_PROJECT_NAME $PYAPP_PROJECT_VERSION $PYAPP_EXEC_SPEC" > target/release/pyapp
"#;

fn write_project(root: &Path) {
    fs::write(
        root.join("pyproject.toml"),
        r#"[project]
name = "my-app"
version = "0.1.0"

[tool.box]
builder = "build"
app_entry = "my_app.cli:main"
"#,
    )
    .unwrap();
    fs::create_dir_all(root.join("dist")).unwrap();
    fs::write(root.join("dist/my_app-0.1.0.tar.gz"), b"sdist").unwrap();
}

fn fake_cargo(dir: &Path) -> PathBuf {
    let path = dir.join("fake-cargo");
    fs::write(&path, FAKE_CARGO).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn local_pyapp(dir: &Path) -> PathBuf {
    let src = dir.join("pyapp-src");
    fs::create_dir_all(src.join("src")).unwrap();
    fs::write(src.join("Cargo.toml"), "[package]\nname = \"pyapp\"\n").unwrap();
    fs::write(src.join("src/main.rs"), "fn main() {}").unwrap();
    src
}

fn packager(project: &Path, tools: &Path) -> Packager {
    Packager::from_layout(ProjectLayout::new(project))
        .unwrap()
        .source(SourceOrigin::LocalDir(local_pyapp(tools)))
        .downloader(Downloader::new().offline(true))
        .compiler(Compiler::new().program(fake_cargo(tools)))
        .build_sdist(false)
}

#[test]
fn test_package_local_source_end_to_end() {
    let project = TempDir::new().unwrap();
    let tools = TempDir::new().unwrap();
    write_project(project.path());

    let output = packager(project.path(), tools.path()).package().unwrap();

    assert_eq!(
        output.binary,
        project.path().join("target/release/my-app")
    );
    assert_eq!(output.tree.name(), "pyapp-local");
    assert_eq!(
        output.tree.path,
        project.path().join("build/pyapp-local")
    );
    assert!(output
        .environment
        .get("PYAPP_PROJECT_PATH")
        .unwrap()
        .ends_with("my_app-0.1.0.tar.gz"));

    // the compiler saw the composed environment
    let contents = fs::read_to_string(&output.binary).unwrap();
    assert_eq!(contents.trim(), "my_app 0.1.0 my_app.cli:main");
    assert_eq!(output.size, contents.len() as u64);

    // the built binary was moved out of the tree
    assert!(!output.tree.path.join("target/release/pyapp").exists());
}

#[test]
fn test_package_twice_reuses_tree() {
    let project = TempDir::new().unwrap();
    let tools = TempDir::new().unwrap();
    write_project(project.path());

    let first = packager(project.path(), tools.path()).package().unwrap();
    let marker = first.tree.path.join("patched.txt");
    fs::write(&marker, "kept").unwrap();

    let second = packager(project.path(), tools.path()).package().unwrap();
    assert_eq!(second.tree.path, first.tree.path);
    assert_eq!(fs::read_to_string(&marker).unwrap(), "kept");
    assert!(second.binary.is_file());
}

#[test]
fn test_package_without_binary_fails() {
    let project = TempDir::new().unwrap();
    let tools = TempDir::new().unwrap();
    write_project(project.path());

    let err = packager(project.path(), tools.path())
        .compiler(Compiler::new().program("true"))
        .package()
        .unwrap_err();

    assert!(err.to_string().contains("No PyApp binary found"));
    assert!(!project.path().join("target/release/my-app").exists());
}
