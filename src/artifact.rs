//! Temporary files produced by a pipeline run.
//!
//! A [`Scratch`] owns every temporary file created during one issuance. When it
//! is dropped, on success and on failure alike, the files it still owns are
//! removed, or persisted when the run asked to keep its files. Files handed
//! back to the caller are moved out as [`Artifact`]s first.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, warn};

use crate::error::{CertShellError, Result};

const DEFAULT_PREFIX: &str = "cert";

/// Strips everything but ASCII word characters from a file name prefix.
///
/// Falls back to `cert` when nothing is left.
pub fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if cleaned.is_empty() {
        DEFAULT_PREFIX.to_string()
    } else {
        cleaned
    }
}

/// Set of temporary files owned by one pipeline invocation.
#[derive(Debug)]
pub struct Scratch {
    prefix: String,
    dir: Option<PathBuf>,
    keep: bool,
    files: Vec<TempPath>,
}

impl Scratch {
    /// Creates an empty scratch set. `prefix` is sanitized with [`sanitize_prefix`].
    pub fn new(prefix: &str, keep: bool) -> Self {
        Self {
            prefix: sanitize_prefix(prefix),
            dir: None,
            keep,
            files: Vec::new(),
        }
    }

    /// Creates files in `dir` instead of the system temp directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn keeps_files(&self) -> bool {
        self.keep
    }

    /// Creates an empty, uniquely named file `<prefix>-<label><random><suffix>`.
    ///
    /// An empty `label` yields `<prefix>-<random><suffix>`.
    pub fn create(&mut self, label: &str, suffix: &str) -> Result<PathBuf> {
        let name_prefix = if label.is_empty() {
            format!("{}-", self.prefix)
        } else {
            format!("{}-{}-", self.prefix, label)
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(&name_prefix).suffix(suffix);
        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| {
            let dir = self.dir.clone().unwrap_or_else(std::env::temp_dir);
            CertShellError::filesystem(dir, e)
        })?;

        let temp = file.into_temp_path();
        let path = temp.to_path_buf();
        debug!(path = %path.display(), "created temporary file");
        self.files.push(temp);
        Ok(path)
    }

    /// Paths still owned by this scratch set, in creation order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|temp| &**temp)
    }

    /// Moves `path` out of the scratch set so it survives the pipeline.
    pub fn release(&mut self, path: &Path) -> Result<Artifact> {
        let index = self
            .files
            .iter()
            .position(|temp| &**temp == path)
            .ok_or_else(|| {
                CertShellError::InvalidInput(format!(
                    "{} is not owned by this pipeline",
                    path.display()
                ))
            })?;
        let temp = self.files.remove(index);
        Artifact::from_temp(temp, self.keep)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let keep = self.keep;
        for temp in self.files.drain(..) {
            if keep {
                match temp.keep() {
                    Ok(path) => debug!(path = %path.display(), "keeping temporary file"),
                    Err(e) => warn!(path = %e.path.display(), error = %e.error, "failed to keep temporary file"),
                }
            } else {
                let path = temp.to_path_buf();
                if let Err(e) = temp.close() {
                    warn!(path = %path.display(), error = %e, "failed to remove temporary file");
                }
            }
        }
    }
}

/// A pipeline output handed to the caller.
///
/// Unless it was kept, the file is removed when the artifact is dropped.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    temp: Option<TempPath>,
}

impl Artifact {
    fn from_temp(temp: TempPath, keep: bool) -> Result<Self> {
        if keep {
            let path = temp
                .keep()
                .map_err(|e| CertShellError::filesystem(e.path.to_path_buf(), e.error))?;
            Ok(Self { path, temp: None })
        } else {
            Ok(Self {
                path: temp.to_path_buf(),
                temp: Some(temp),
            })
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file outlives this value.
    pub fn is_kept(&self) -> bool {
        self.temp.is_none()
    }

    /// Persists the file and returns its path.
    pub fn keep(self) -> Result<PathBuf> {
        match self.temp {
            Some(temp) => temp
                .keep()
                .map_err(|e| CertShellError::filesystem(e.path.to_path_buf(), e.error)),
            None => Ok(self.path),
        }
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| CertShellError::filesystem(&self.path, e))
    }

    /// Removes the file now unless it was kept.
    pub(crate) fn discard(self) {
        if let Some(temp) = self.temp {
            if let Err(e) = temp.close() {
                warn!(path = %self.path.display(), error = %e, "failed to remove temporary file");
            }
        }
    }
}
