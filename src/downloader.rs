//! Download and extraction of PyApp source archives
//!
//! This module provides:
//! - HTTPS downloads with connect/read timeouts
//! - Atomic writes (`.part` file renamed on success)
//! - Offline mode (`BOX_OFFLINE=1`) that forbids network access
//! - `.tar.gz` inspection and extraction

use crate::error::{BoxError, BoxResult};
use crate::progress;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable that switches the downloader to offline mode
pub const OFFLINE_ENV: &str = "BOX_OFFLINE";

/// Downloader for release archives
#[derive(Debug, Clone)]
pub struct Downloader {
    /// Allow plain HTTP URLs
    allow_insecure: bool,
    /// Never touch the network
    offline: bool,
    /// Show a byte progress bar while downloading
    show_progress: bool,
    /// Connect timeout
    connect_timeout: Duration,
    /// Read timeout
    read_timeout: Duration,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader {
    /// Create a new downloader, honouring `BOX_OFFLINE`
    pub fn new() -> Self {
        Self {
            allow_insecure: false,
            offline: std::env::var(OFFLINE_ENV)
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(false),
            show_progress: true,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(300),
        }
    }

    /// Set insecure mode
    pub fn allow_insecure(mut self, allow: bool) -> Self {
        self.allow_insecure = allow;
        self
    }

    /// Set offline mode
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Enable or disable the progress bar
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Whether network access is forbidden
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Download `url` to `dest`
    ///
    /// The body is streamed into `<dest>.part` which is renamed once complete,
    /// so an interrupted download never leaves a truncated archive at `dest`.
    pub fn download_to(&self, url: &str, dest: &Path) -> BoxResult<()> {
        info!(url = %url, dest = %dest.display(), offline = self.offline, "Starting download");

        if self.offline {
            return Err(BoxError::Download(format!(
                "Offline mode: refusing to download {}",
                url
            )));
        }

        self.validate_url(url)?;

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(self.connect_timeout)
            .timeout_read(self.read_timeout)
            .build();

        let response = agent
            .get(url)
            .call()
            .map_err(|e| BoxError::Download(format!("Failed to download {}: {}", url, e)))?;

        let total = response
            .header("Content-Length")
            .and_then(|v| v.parse::<u64>().ok());

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let part = dest.with_extension("part");
        let mut file = File::create(&part)?;

        let copied = match (self.show_progress, total) {
            (true, Some(total)) => {
                let pb = progress::download_bar(total, "Downloading PyApp source");
                let result = io::copy(&mut pb.wrap_read(response.into_reader()), &mut file);
                pb.finish_and_clear();
                result
            }
            _ => io::copy(&mut response.into_reader(), &mut file),
        };

        let bytes = match copied {
            Ok(bytes) => bytes,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&part);
                return Err(BoxError::Download(format!(
                    "Failed to read response from {}: {}",
                    url, e
                )));
            }
        };
        drop(file);

        fs::rename(&part, dest)?;
        debug!("Downloaded {} bytes from {}", bytes, url);
        Ok(())
    }

    /// Validate URL against security rules
    fn validate_url(&self, url: &str) -> BoxResult<()> {
        let parsed = url::Url::parse(url)
            .map_err(|e| BoxError::Config(format!("Invalid URL {}: {}", url, e)))?;

        if !self.allow_insecure && parsed.scheme() != "https" {
            warn!(url = %url, scheme = %parsed.scheme(), "Insecure protocol blocked");
            return Err(BoxError::Config(format!(
                "Insecure URL scheme ({}), HTTPS required",
                parsed.scheme()
            )));
        }

        Ok(())
    }
}

/// Name of the first path component of the first file entry in a `.tar.gz`
///
/// Pax global headers are skipped. Returns `None` for an empty archive.
pub fn archive_root(archive_path: &Path) -> BoxResult<Option<String>> {
    let file = File::open(archive_path)?;
    let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
    let mut archive = tar::Archive::new(decoder);

    // GitHub source archives lead with a pax global header (`pax_global_header`)
    for entry in archive.entries()? {
        let entry = entry?;
        if entry.header().entry_type().is_pax_global_extensions() {
            continue;
        }
        let path = entry.path()?;
        let root = path.components().find_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        });
        if root.is_some() {
            return Ok(root);
        }
    }

    Ok(None)
}

/// Extract a `.tar.gz` archive into `dest_dir`
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> BoxResult<()> {
    info!(
        "Extracting {} to {}",
        archive_path.display(),
        dest_dir.display()
    );

    fs::create_dir_all(dest_dir)?;

    let file = File::open(archive_path)?;
    let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
    let mut archive = tar::Archive::new(decoder);
    archive.unpack(dest_dir)?;

    Ok(())
}
