//! Application descriptors consumed by the installer.
use std::path::PathBuf;

/// Placeholder in action scripts replaced by the downloaded file path.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// One installable application, reduced to the capability set the installer
/// needs.
///
/// Manifest variants (package-manager templates, custom scripts,
/// download-backed installers) differ only in how these fields are produced;
/// the installer never branches on the originating variant except through
/// the optional [`Download`] capability.
#[derive(Debug, Clone)]
pub struct App {
    /// Stable identifier, used for logging and filtering.
    pub id: String,
    /// Script that installs the app for the first time.
    pub install_script: String,
    /// Script that reports whether the app is currently installed, as a
    /// boolean output line. Absent means the app cannot be verified and is
    /// conventionally treated as not installed.
    pub verify_script: Option<String>,
    /// Script that brings an already-installed app to the latest version.
    pub upgrade_script: Option<String>,
    /// Suppress the upgrade path even when an upgrade script exists.
    pub prevent_upgrade: bool,
    /// Run action scripts elevated.
    pub run_as_admin: bool,
    /// Run this app's scripts under the forced-legacy interpreter.
    pub use_legacy_shell: bool,
    /// Download capability, for apps whose installer must be fetched first.
    pub download: Option<Download>,
    /// Opaque app-level configuration carried through from the manifest;
    /// applied by collaborators outside this engine.
    pub configuration: Option<toml::value::Table>,
}

/// The download capability: a named downloader plus its opaque arguments.
#[derive(Debug, Clone)]
pub struct Download {
    /// Name the downloader factory resolves.
    pub downloader: String,
    /// Opaque structured-data blob passed through to the downloader.
    pub args: String,
    /// Local path of the fetched installer; set by the download step.
    pub downloaded_file: Option<PathBuf>,
}

impl App {
    /// Resolve the [`FILE_PLACEHOLDER`] in an action script against the
    /// downloaded file path, if one has been set.
    #[must_use]
    pub fn resolve_script(&self, script: &str) -> String {
        match self
            .download
            .as_ref()
            .and_then(|d| d.downloaded_file.as_ref())
        {
            Some(path) => script.replace(FILE_PLACEHOLDER, &path.display().to_string()),
            None => script.to_string(),
        }
    }
}
