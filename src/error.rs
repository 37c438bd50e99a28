//! use certshell::error::CertShellError;

use std::path::PathBuf;

use thiserror::Error;

use crate::verify::CertificateKeyStatus;

pub type Result<T> = std::result::Result<T, CertShellError>;

/// Represents errors that can occur in the CertShell library.
///
/// This enum provides detailed error messages for various failure scenarios.
#[derive(Debug, Error)]
pub enum CertShellError {
    /// A temporary file could not be created, written, read or removed.
    #[error("Filesystem error at {}: {source}", path.display())]
    FilesystemError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external tool could not be started.
    #[error("Failed to spawn {program}: {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool exited with a non-zero status.
    #[error("`{command}` failed with exit code {code:?}: {stderr}")]
    ToolError {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool could not load the certificate it was given.
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    /// The tool could not load the key, or the passphrase did not match.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Tool output did not contain the expected line.
    #[error("Failed to parse tool output: {0}")]
    ParseError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CertShellError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CertShellError::FilesystemError {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a combined certificate and key verification.
///
/// Carries the statuses gathered before the failing step so callers can still
/// report what was checked.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct VerifyCertificateKeyError {
    pub partial: CertificateKeyStatus,
    #[source]
    pub source: CertShellError,
}
