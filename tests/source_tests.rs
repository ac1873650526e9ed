//! Tests for PyApp source acquisition and tree selection

use box_packager::{Downloader, PyAppVersion, SourceCache, SourceOrigin};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_source_archive(path: &Path, root: &str) {
    let file = fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    append_source_files(&mut builder, root);
    builder.into_inner().unwrap().finish().unwrap();
}

/// Same layout as a GitHub release `source.tar.gz`, which starts with a
/// `pax_global_header` entry
fn write_github_source_archive(path: &Path, root: &str) {
    let file = fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let record = b"52 comment=0123456789abcdef0123456789abcdef01234567\n";
    let mut header = tar::Header::new_ustar();
    header.set_entry_type(tar::EntryType::XGlobalHeader);
    header.set_size(record.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "pax_global_header", &record[..])
        .unwrap();
    append_source_files(&mut builder, root);
    builder.into_inner().unwrap().finish().unwrap();
}

fn append_source_files<W: std::io::Write>(builder: &mut tar::Builder<W>, root: &str) {
    let data = b"[package]\nname = \"pyapp\"\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, format!("{}/Cargo.toml", root), &data[..])
        .unwrap();
}

fn offline_cache(build_dir: &Path) -> SourceCache {
    SourceCache::new(build_dir).with_downloader(Downloader::new().offline(true))
}

#[test]
fn test_local_archive_extracts_once() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("pyapp.tar.gz");
    write_source_archive(&archive, "pyapp-v0.22.0");
    let build = temp.path().join("build");
    let origin = SourceOrigin::LocalArchive(archive);

    let tree = offline_cache(&build).acquire(&origin).unwrap();
    assert_eq!(tree.name(), "pyapp-v0.22.0");
    assert!(build.join("pyapp-source.tar.gz").is_file());

    // edits to the extracted tree survive the next run
    let manifest = build.join("pyapp-v0.22.0/Cargo.toml");
    fs::write(&manifest, "patched").unwrap();

    let again = offline_cache(&build).acquire(&origin).unwrap();
    assert_eq!(again.path, tree.path);
    assert_eq!(fs::read_to_string(&manifest).unwrap(), "patched");
}

#[test]
fn test_github_archive_extracts_once() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("source.tar.gz");
    write_github_source_archive(&archive, "pyapp-v0.22.0");
    let build = temp.path().join("build");
    let origin = SourceOrigin::LocalArchive(archive);

    let tree = offline_cache(&build).acquire(&origin).unwrap();
    assert_eq!(tree.name(), "pyapp-v0.22.0");

    let manifest = build.join("pyapp-v0.22.0/Cargo.toml");
    fs::write(&manifest, "patched").unwrap();

    let again = offline_cache(&build).acquire(&origin).unwrap();
    assert_eq!(again.path, tree.path);
    assert_eq!(fs::read_to_string(&manifest).unwrap(), "patched");
    assert!(!build.join("pax_global_header").exists());
}

#[test]
fn test_greatest_version_wins() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("pyapp-v1.2.3")).unwrap();
    fs::create_dir(temp.path().join("pyapp-v2.2.3")).unwrap();

    let tree = SourceCache::new(temp.path()).select().unwrap();
    assert_eq!(tree.name(), "pyapp-v2.2.3");
    assert_eq!(tree.ignored.len(), 1);

    let warning = tree.ambiguity_warning().unwrap();
    assert!(warning.contains("pyapp-v2.2.3"));
    assert!(warning.contains("box clean"));
}

#[test]
fn test_offline_cache_miss() {
    let temp = TempDir::new().unwrap();
    let err = offline_cache(temp.path())
        .acquire(&SourceOrigin::Remote(PyAppVersion::Latest))
        .unwrap_err();

    assert!(err.to_string().contains("no pyapp source code found"));
    assert!(!temp.path().join("pyapp-source.tar.gz").exists());
}

#[test]
fn test_cached_pinned_archive_used_offline() {
    let temp = TempDir::new().unwrap();
    let version = PyAppVersion::parse("0.21.1");
    write_source_archive(&temp.path().join(version.archive_name()), "pyapp-v0.21.1");

    let tree = offline_cache(temp.path())
        .acquire(&SourceOrigin::Remote(version))
        .unwrap();
    assert_eq!(tree.name(), "pyapp-v0.21.1");
}

#[test]
fn test_remote_reuses_local_tree() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("pyapp-local")).unwrap();

    let tree = offline_cache(temp.path())
        .acquire(&SourceOrigin::Remote(PyAppVersion::Latest))
        .unwrap();
    assert_eq!(tree.name(), "pyapp-local");
}

#[test]
fn test_local_dir_copied_once() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("pyapp-src");
    fs::create_dir_all(src.join("src")).unwrap();
    fs::write(src.join("Cargo.toml"), "original").unwrap();
    fs::write(src.join("src/main.rs"), "fn main() {}").unwrap();
    let build = temp.path().join("build");

    let origin = SourceOrigin::from_local(&src).unwrap();
    let tree = offline_cache(&build).acquire(&origin).unwrap();
    assert_eq!(tree.name(), "pyapp-local");
    assert!(build.join("pyapp-local/src/main.rs").is_file());

    fs::write(src.join("Cargo.toml"), "changed").unwrap();
    offline_cache(&build).acquire(&origin).unwrap();
    assert_eq!(
        fs::read_to_string(build.join("pyapp-local/Cargo.toml")).unwrap(),
        "original"
    );
}

#[test]
fn test_version_urls() {
    assert_eq!(
        PyAppVersion::Latest.source_url(),
        "https://github.com/ofek/pyapp/releases/latest/download/source.tar.gz"
    );
    assert_eq!(
        PyAppVersion::parse("0.22.0").source_url(),
        "https://github.com/ofek/pyapp/releases/download/v0.22.0/source.tar.gz"
    );
    assert_eq!(PyAppVersion::parse("LATEST"), PyAppVersion::Latest);
}
