pub mod install;
pub mod status;

use std::path::PathBuf;

use anyhow::Result;

use crate::apps::App;
use crate::cli::GlobalOpts;
use crate::config::Manifest;

/// Default manifest file name, looked up in the current directory.
const DEFAULT_MANIFEST: &str = "machina.toml";

/// Resolve the manifest path from CLI arguments, environment, or the
/// current directory.
///
/// # Errors
///
/// Returns an error when no manifest can be located.
pub fn resolve_manifest(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(ref path) = global.manifest {
        return Ok(path.clone());
    }

    if let Ok(path) = std::env::var("MACHINA_MANIFEST") {
        return Ok(PathBuf::from(path));
    }

    let local = std::env::current_dir()?.join(DEFAULT_MANIFEST);
    if local.exists() {
        return Ok(local);
    }

    anyhow::bail!("cannot locate a manifest. Use --manifest or set MACHINA_MANIFEST env var");
}

/// Locate, load, and convert the manifest into installer-ready apps.
///
/// # Errors
///
/// Returns an error when the manifest cannot be located, read, or parsed.
pub fn load_apps(global: &GlobalOpts) -> Result<Vec<App>> {
    let path = resolve_manifest(global)?;
    Manifest::load(&path)?.into_apps()
}

/// Apply `--only` / `--skip` filters to the app list.
///
/// `--only` wins when both are given; matching is case-insensitive on id
/// substrings.
#[must_use]
pub fn filter_apps(apps: Vec<App>, only: &[String], skip: &[String]) -> Vec<App> {
    apps.into_iter()
        .filter(|app| {
            let id = app.id.to_lowercase();
            if !only.is_empty() {
                return only.iter().any(|o| id.contains(&o.to_lowercase()));
            }
            if !skip.is_empty() {
                return !skip.iter().any(|s| id.contains(&s.to_lowercase()));
            }
            true
        })
        .collect()
}
