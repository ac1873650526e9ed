//! Tests for project cleaning

use box_packager::{CleanOptions, Cleaner, ProjectLayout};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn populate(root: &Path) {
    for dir in ["dist", "build/pyapp-v0.22.0", "build/pyapp-local", "target/release"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    fs::write(root.join("build/pyapp-source.tar.gz"), "").unwrap();
    fs::write(root.join("build/pyapp-source-v0.21.0.tar.gz"), "").unwrap();
    fs::write(root.join("build/notes.txt"), "").unwrap();
}

#[test]
fn test_clean_whole_project() {
    let temp = TempDir::new().unwrap();
    populate(temp.path());

    let report = Cleaner::new(ProjectLayout::new(temp.path()), CleanOptions::default())
        .clean()
        .unwrap();

    assert_eq!(report.summary(), "The whole project was cleaned.");
    for dir in ["dist", "build", "target"] {
        assert!(!temp.path().join(dir).exists());
    }
}

#[test]
fn test_clean_source_and_trees_only() {
    let temp = TempDir::new().unwrap();
    populate(temp.path());
    let options = CleanOptions {
        build: true,
        source_pyapp: true,
        pyapp_folder: true,
        ..Default::default()
    };

    let report = Cleaner::new(ProjectLayout::new(temp.path()), options)
        .clean()
        .unwrap();

    let build = temp.path().join("build");
    assert!(build.join("notes.txt").is_file());
    assert!(!build.join("pyapp-source.tar.gz").exists());
    assert!(!build.join("pyapp-source-v0.21.0.tar.gz").exists());
    assert!(!build.join("pyapp-local").exists());
    assert_eq!(report.archives.len(), 2);
    assert_eq!(report.trees, 2);
    assert!(temp.path().join("dist").is_dir());
}

#[test]
fn test_nothing_to_clean() {
    let temp = TempDir::new().unwrap();
    let options = CleanOptions {
        dist: true,
        ..Default::default()
    };

    let report = Cleaner::new(ProjectLayout::new(temp.path()), options)
        .clean()
        .unwrap();
    assert_eq!(report.summary(), "Nothing to clean.");
}
