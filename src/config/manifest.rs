//! TOML manifest parsing and conversion into installer-ready [`App`]s.
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::apps::{App, Download};

/// The root manifest document.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// Desired applications, in install order.
    #[serde(default)]
    pub apps: Vec<ManifestApp>,
}

/// One manifest app entry.
///
/// The `kind` tag selects how the entry's scripts are produced; every kind
/// collapses into the same [`App`] capability set.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ManifestApp {
    /// A winget package, installed through templated winget command lines.
    Winget {
        /// Winget package ID (e.g. `Git.Git`).
        id: String,
        /// Extra arguments appended to the install command line.
        #[serde(default)]
        install_args: Option<String>,
        /// Keep the installed version even when an upgrade is available.
        #[serde(default)]
        prevent_upgrade: bool,
        /// Opaque app-level configuration.
        #[serde(default)]
        configuration: Option<toml::value::Table>,
    },
    /// An app managed by custom interpreter scripts.
    Script {
        /// Stable identifier for logging and filtering.
        id: String,
        /// Install script.
        install: String,
        /// Verification script emitting `true`/`false`.
        #[serde(default)]
        verify: Option<String>,
        /// Upgrade script.
        #[serde(default)]
        upgrade: Option<String>,
        #[serde(default)]
        prevent_upgrade: bool,
        /// Run action scripts elevated.
        #[serde(default)]
        run_as_admin: bool,
        /// Force the legacy Windows PowerShell interpreter.
        #[serde(default)]
        legacy_shell: bool,
        #[serde(default)]
        configuration: Option<toml::value::Table>,
    },
    /// A script-managed app whose installer must be downloaded first.
    ///
    /// Scripts may reference the downloaded file as `{file}`.
    Download {
        id: String,
        /// Downloader name resolved through the factory (e.g. `http`).
        downloader: String,
        /// Downloader arguments, passed through as an opaque blob.
        downloader_args: toml::Value,
        install: String,
        #[serde(default)]
        verify: Option<String>,
        #[serde(default)]
        upgrade: Option<String>,
        #[serde(default)]
        prevent_upgrade: bool,
        #[serde(default)]
        run_as_admin: bool,
        #[serde(default)]
        legacy_shell: bool,
        #[serde(default)]
        configuration: Option<toml::value::Table>,
    },
}

const WINGET_COMMON_FLAGS: &str =
    "--exact --source winget --accept-source-agreements --accept-package-agreements";

fn winget_install_script(id: &str, install_args: Option<&str>) -> String {
    let mut script = format!("winget install --id '{id}' {WINGET_COMMON_FLAGS}");
    if let Some(extra) = install_args {
        script.push(' ');
        script.push_str(extra);
    }
    script
}

fn winget_verify_script(id: &str) -> String {
    // `winget list` exits non-zero when nothing matches, so the match test
    // must swallow the exit code and emit an explicit boolean.
    format!(
        "if (winget list --id '{id}' --exact --accept-source-agreements | \
         Select-String -SimpleMatch -Quiet '{id}') {{ 'true' }} else {{ 'false' }}; exit 0"
    )
}

fn winget_upgrade_script(id: &str) -> String {
    format!("winget upgrade --id '{id}' {WINGET_COMMON_FLAGS}")
}

impl Manifest {
    /// Load and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing manifest: {}", path.display()))
    }

    /// Convert every manifest entry into an installer-ready [`App`].
    ///
    /// # Errors
    ///
    /// Returns an error when a download entry's arguments cannot be encoded.
    pub fn into_apps(self) -> Result<Vec<App>> {
        self.apps.into_iter().map(ManifestApp::into_app).collect()
    }
}

impl ManifestApp {
    /// The entry's stable identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Winget { id, .. } | Self::Script { id, .. } | Self::Download { id, .. } => id,
        }
    }

    fn into_app(self) -> Result<App> {
        match self {
            Self::Winget {
                id,
                install_args,
                prevent_upgrade,
                configuration,
            } => Ok(App {
                install_script: winget_install_script(&id, install_args.as_deref()),
                verify_script: Some(winget_verify_script(&id)),
                upgrade_script: Some(winget_upgrade_script(&id)),
                id,
                prevent_upgrade,
                run_as_admin: false,
                use_legacy_shell: false,
                download: None,
                configuration,
            }),
            Self::Script {
                id,
                install,
                verify,
                upgrade,
                prevent_upgrade,
                run_as_admin,
                legacy_shell,
                configuration,
            } => Ok(App {
                id,
                install_script: install,
                verify_script: verify,
                upgrade_script: upgrade,
                prevent_upgrade,
                run_as_admin,
                use_legacy_shell: legacy_shell,
                download: None,
                configuration,
            }),
            Self::Download {
                id,
                downloader,
                downloader_args,
                install,
                verify,
                upgrade,
                prevent_upgrade,
                run_as_admin,
                legacy_shell,
                configuration,
            } => {
                let args = serde_json::to_string(&downloader_args)
                    .with_context(|| format!("encoding downloader arguments for '{id}'"))?;
                Ok(App {
                    id,
                    install_script: install,
                    verify_script: verify,
                    upgrade_script: upgrade,
                    prevent_upgrade,
                    run_as_admin,
                    use_legacy_shell: legacy_shell,
                    download: Some(Download {
                        downloader,
                        args,
                        downloaded_file: None,
                    }),
                    configuration,
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn write_manifest(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("machina.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn empty_manifest_has_no_apps() {
        let (_dir, path) = write_manifest("");
        let manifest = Manifest::load(&path).unwrap();
        assert!(manifest.into_apps().unwrap().is_empty());
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("reading manifest"));
    }

    #[test]
    fn winget_entry_produces_templated_scripts() {
        let (_dir, path) = write_manifest(
            r#"
            [[apps]]
            kind = "winget"
            id = "Git.Git"
            "#,
        );
        let apps = Manifest::load(&path).unwrap().into_apps().unwrap();
        assert_eq!(apps.len(), 1);
        let app = &apps[0];
        assert_eq!(app.id, "Git.Git");
        assert!(app.install_script.starts_with("winget install --id 'Git.Git'"));
        assert!(app.install_script.contains("--accept-package-agreements"));
        assert!(app.verify_script.as_ref().unwrap().contains("'true'"));
        assert!(
            app.upgrade_script
                .as_ref()
                .unwrap()
                .starts_with("winget upgrade --id 'Git.Git'")
        );
        assert!(!app.prevent_upgrade);
    }

    #[test]
    fn winget_install_args_are_appended() {
        let (_dir, path) = write_manifest(
            r#"
            [[apps]]
            kind = "winget"
            id = "Docker.DockerDesktop"
            install_args = "--scope machine"
            prevent_upgrade = true
            "#,
        );
        let apps = Manifest::load(&path).unwrap().into_apps().unwrap();
        assert!(apps[0].install_script.ends_with("--scope machine"));
        assert!(apps[0].prevent_upgrade);
    }

    #[test]
    fn script_entry_maps_fields_directly() {
        let (_dir, path) = write_manifest(
            r#"
            [[apps]]
            kind = "script"
            id = "rustup"
            install = "irm https://sh.rustup.rs | iex"
            verify = "if (Get-Command rustup -ErrorAction SilentlyContinue) { 'true' } else { 'false' }"
            upgrade = "rustup update"
            run_as_admin = true
            legacy_shell = true
            "#,
        );
        let apps = Manifest::load(&path).unwrap().into_apps().unwrap();
        let app = &apps[0];
        assert_eq!(app.id, "rustup");
        assert!(app.run_as_admin);
        assert!(app.use_legacy_shell);
        assert_eq!(app.upgrade_script.as_deref(), Some("rustup update"));
        assert!(app.download.is_none());
    }

    #[test]
    fn download_entry_encodes_args_as_json() {
        let (_dir, path) = write_manifest(
            r#"
            [[apps]]
            kind = "download"
            id = "some-tool"
            downloader = "http"
            install = "& '{file}' /S"

            [apps.downloader_args]
            url = "https://example.com/setup.exe"
            sha256 = "aa"
            "#,
        );
        let apps = Manifest::load(&path).unwrap().into_apps().unwrap();
        let download = apps[0].download.as_ref().unwrap();
        assert_eq!(download.downloader, "http");
        let parsed: serde_json::Value = serde_json::from_str(&download.args).unwrap();
        assert_eq!(parsed["url"], "https://example.com/setup.exe");
        assert_eq!(parsed["sha256"], "aa");
        assert!(download.downloaded_file.is_none());
    }

    #[test]
    fn configuration_table_is_carried_opaquely() {
        let (_dir, path) = write_manifest(
            r#"
            [[apps]]
            kind = "winget"
            id = "Git.Git"

            [apps.configuration]
            theme = "dark"
            "#,
        );
        let apps = Manifest::load(&path).unwrap().into_apps().unwrap();
        let configuration = apps[0].configuration.as_ref().unwrap();
        assert_eq!(
            configuration.get("theme").and_then(toml::Value::as_str),
            Some("dark")
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let (_dir, path) = write_manifest(
            r#"
            [[apps]]
            kind = "winget"
            id = "Git.Git"
            tpyo = true
            "#,
        );
        assert!(Manifest::load(&path).is_err());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let (_dir, path) = write_manifest(
            r#"
            [[apps]]
            kind = "chocolatey"
            id = "git"
            "#,
        );
        assert!(Manifest::load(&path).is_err());
    }

    #[test]
    fn apps_preserve_manifest_order() {
        let (_dir, path) = write_manifest(
            r#"
            [[apps]]
            kind = "winget"
            id = "first"

            [[apps]]
            kind = "script"
            id = "second"
            install = "x"
            "#,
        );
        let apps = Manifest::load(&path).unwrap().into_apps().unwrap();
        let ids: Vec<&str> = apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
