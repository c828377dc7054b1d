//! Installer asset downloading: the [`Downloader`] seam plus the factory
//! that resolves manifest downloader names to implementations.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::DownloadError;

pub mod http;

pub use http::HttpDownloader;

/// Fetches an installer asset described by an opaque argument blob.
///
/// Each implementation defines its own argument schema; the engine treats
/// the blob as a string and only cares about the returned local path.
pub trait Downloader: Send + Sync {
    /// Fetch the asset and return the local path of the downloaded file.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] when the arguments are invalid, the
    /// transfer fails, or the fetched bytes fail verification.
    fn download(&self, args: &str) -> Result<PathBuf, DownloadError>;
}

/// Registry resolving manifest downloader names to implementations.
#[derive(Default)]
pub struct DownloaderFactory {
    downloaders: HashMap<String, Arc<dyn Downloader>>,
}

impl std::fmt::Debug for DownloaderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloaderFactory")
            .field("names", &self.downloaders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DownloaderFactory {
    /// An empty factory; use [`DownloaderFactory::register`] to populate it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The factory with every built-in downloader registered.
    #[must_use]
    pub fn standard() -> Self {
        let mut factory = Self::new();
        factory.register("http", Arc::new(HttpDownloader::new()));
        factory
    }

    /// Register a downloader under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, downloader: Arc<dyn Downloader>) {
        self.downloaders.insert(name.to_string(), downloader);
    }

    /// Resolve a downloader by name.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::UnknownDownloader`] when nothing is
    /// registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Downloader>, DownloadError> {
        self.downloaders
            .get(name)
            .cloned()
            .ok_or_else(|| DownloadError::UnknownDownloader(name.to_string()))
    }
}
