//! Desktop shortcut repository: snapshot and delete desktop entries so the
//! installer can clean up shortcuts littered by third-party installers.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File extensions that count as desktop entries.
const SHORTCUT_EXTENSIONS: &[&str] = &["lnk", "url", "desktop"];

/// Repository of desktop shortcut entries.
///
/// Used only for shortcut cleanup; both operations must be safe to call with
/// an empty set.
pub trait DesktopEntries: Send + Sync {
    /// Snapshot every desktop entry currently present.
    ///
    /// # Errors
    ///
    /// Returns an error if a desktop directory exists but cannot be read.
    fn load_system_entries(&self) -> Result<BTreeSet<PathBuf>>;

    /// Delete the given entries. Paths that no longer exist are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing entry cannot be removed.
    fn delete_paths(&self, paths: &[PathBuf]) -> Result<()>;
}

/// [`DesktopEntries`] over the real user (and, on Windows, public) desktop
/// directories.
#[derive(Debug, Clone)]
pub struct SystemDesktopEntries {
    dirs: Vec<PathBuf>,
}

impl SystemDesktopEntries {
    /// Detect the platform's desktop directories from the environment.
    ///
    /// Directories that do not exist are simply skipped at load time.
    #[must_use]
    pub fn detect() -> Self {
        let mut dirs = Vec::new();
        if cfg!(windows) {
            if let Ok(profile) = std::env::var("USERPROFILE") {
                dirs.push(PathBuf::from(profile).join("Desktop"));
            }
            if let Ok(public) = std::env::var("PUBLIC") {
                dirs.push(PathBuf::from(public).join("Desktop"));
            }
        } else if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Desktop"));
        }
        Self { dirs }
    }

    /// Use explicit directories (tests, non-standard setups).
    #[must_use]
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

fn is_shortcut(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SHORTCUT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

impl DesktopEntries for SystemDesktopEntries {
    fn load_system_entries(&self) -> Result<BTreeSet<PathBuf>> {
        let mut entries = BTreeSet::new();
        for dir in &self.dirs {
            if !dir.is_dir() {
                continue;
            }
            let listing = std::fs::read_dir(dir)
                .with_context(|| format!("reading desktop directory {}", dir.display()))?;
            for entry in listing {
                let path = entry
                    .with_context(|| format!("reading desktop directory {}", dir.display()))?
                    .path();
                if path.is_file() && is_shortcut(&path) {
                    entries.insert(path);
                }
            }
        }
        Ok(entries)
    }

    fn delete_paths(&self, paths: &[PathBuf]) -> Result<()> {
        for path in paths {
            if path.exists() {
                std::fs::remove_file(path)
                    .with_context(|| format!("removing desktop entry {}", path.display()))?;
            }
        }
        Ok(())
    }
}
