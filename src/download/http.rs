//! HTTP downloader: fetches an installer over HTTPS into a local directory,
//! optionally verifying a SHA-256 digest.
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::DownloadError;

use super::Downloader;

/// Argument schema for the `http` downloader.
///
/// The manifest carries this as an opaque JSON string.
#[derive(Debug, Deserialize)]
struct HttpArgs {
    /// URL to fetch.
    url: String,
    /// Local file name; defaults to the last URL path segment.
    file_name: Option<String>,
    /// Expected SHA-256 digest (lowercase hex) of the downloaded bytes.
    sha256: Option<String>,
}

/// Downloads assets over HTTP(S) into a destination directory.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    dest_dir: PathBuf,
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDownloader {
    /// Downloader writing into the system temp directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dest_dir: std::env::temp_dir(),
        }
    }

    /// Downloader writing into an explicit directory.
    #[must_use]
    pub fn with_dest_dir(dest_dir: PathBuf) -> Self {
        Self { dest_dir }
    }

    fn fetch(url: &str) -> Result<Vec<u8>, DownloadError> {
        let mut response = ureq::get(url).call().map_err(|e| DownloadError::Fetch {
            url: url.to_string(),
            source: Box::new(e),
        })?;
        response
            .body_mut()
            .read_to_vec()
            .map_err(|e| DownloadError::Fetch {
                url: url.to_string(),
                source: Box::new(e),
            })
    }
}

fn file_name_from_url(url: &str) -> Option<String> {
    url.split('?')
        .next()?
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .map(String::from)
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn verify_digest(path: &Path, bytes: &[u8], expected: &str) -> Result<(), DownloadError> {
    let actual = sha256_hex(bytes);
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(());
    }
    // Never leave a file that failed verification on disk.
    let _ = std::fs::remove_file(path);
    Err(DownloadError::ChecksumMismatch {
        path: path.display().to_string(),
        expected: expected.to_ascii_lowercase(),
        actual,
    })
}

impl Downloader for HttpDownloader {
    fn download(&self, args: &str) -> Result<PathBuf, DownloadError> {
        let args: HttpArgs =
            serde_json::from_str(args).map_err(|e| DownloadError::InvalidArgs(e.to_string()))?;

        let file_name = match args.file_name {
            Some(name) => name,
            None => file_name_from_url(&args.url).ok_or_else(|| {
                DownloadError::InvalidArgs(format!(
                    "no file name given and none derivable from '{}'",
                    args.url
                ))
            })?,
        };

        let bytes = Self::fetch(&args.url)?;
        let path = self.dest_dir.join(file_name);
        std::fs::write(&path, &bytes).map_err(|e| DownloadError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        if let Some(expected) = &args.sha256 {
            verify_digest(&path, &bytes, expected)?;
        }
        Ok(path)
    }
}
