//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return typed errors ([`ScriptError`], [`DownloadError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
use thiserror::Error;

/// Errors raised by the script-execution layer.
///
/// This is the principal propagation point for child-process failure: any
/// non-zero exit anywhere downstream surfaces here as [`ScriptError::NonZeroExit`],
/// never as a silently-returned code.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The script interpreter exited with a non-zero code.
    #[error("script exited with code {code}")]
    NonZeroExit {
        /// Exit code reported by the interpreter process.
        code: i32,
    },

    /// A verification script produced output that is not a boolean.
    #[error("script output '{output}' is not a boolean")]
    BadBoolOutput {
        /// The offending last output line.
        output: String,
    },

    /// The interpreter process could not be launched at all.
    #[error(transparent)]
    Launch(#[from] anyhow::Error),
}

/// Errors raised while fetching installer assets.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The manifest names a downloader that is not registered.
    #[error("no downloader registered under '{0}'")]
    UnknownDownloader(String),

    /// The opaque downloader argument blob could not be interpreted.
    #[error("invalid downloader arguments: {0}")]
    InvalidArgs(String),

    /// The transfer itself failed.
    #[error("download of {url} failed: {source}")]
    Fetch {
        /// URL that was being fetched.
        url: String,
        /// Underlying transport error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The downloaded bytes do not match the expected digest.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Path of the rejected (and removed) file.
        path: String,
        /// Expected lowercase hex SHA-256 digest.
        expected: String,
        /// Actual digest of the downloaded bytes.
        actual: String,
    },

    /// The downloaded file could not be written to disk.
    #[error("could not write downloaded file {path}: {source}")]
    Io {
        /// Destination path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_exit_display_contains_code() {
        let e = ScriptError::NonZeroExit { code: 1 };
        assert_eq!(e.to_string(), "script exited with code 1");
    }

    #[test]
    fn bad_bool_output_display() {
        let e = ScriptError::BadBoolOutput {
            output: "maybe".to_string(),
        };
        assert_eq!(e.to_string(), "script output 'maybe' is not a boolean");
    }

    #[test]
    fn launch_error_is_transparent() {
        let e: ScriptError = anyhow::anyhow!("failed to launch: pwsh").into();
        assert_eq!(e.to_string(), "failed to launch: pwsh");
    }

    #[test]
    fn unknown_downloader_names_the_downloader() {
        let e = DownloadError::UnknownDownloader("ftp".to_string());
        assert_eq!(e.to_string(), "no downloader registered under 'ftp'");
    }

    #[test]
    fn checksum_mismatch_display() {
        let e = DownloadError::ChecksumMismatch {
            path: "/tmp/setup.exe".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert!(e.to_string().contains("expected aa"));
        assert!(e.to_string().contains("got bb"));
    }

    #[test]
    fn io_error_has_source() {
        use std::error::Error as _;
        let e = DownloadError::Io {
            path: "/tmp/x".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_types_are_send_sync() {
        assert_send_sync::<ScriptError>();
        assert_send_sync::<DownloadError>();
    }

    #[test]
    fn script_error_converts_to_anyhow() {
        let e = ScriptError::NonZeroExit { code: 7 };
        let any: anyhow::Error = e.into();
        assert!(any.to_string().contains('7'));
    }
}
