//! Invocation of the external `openssl` binary.
//!
//! Every operation in this crate funnels through [`OpenSsl::run`]: spawn the
//! program with a list of arguments, optionally write bytes to its standard
//! input, and collect standard output and error once it exits.

use std::ffi::{OsStr, OsString};
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{CertShellError, Result};

/// Environment variable naming the openssl binary used by [`OpenSsl::from_env`].
pub const PROGRAM_ENV: &str = "CERTSHELL_OPENSSL";

const DEFAULT_PROGRAM: &str = "openssl";

/// Handle on the openssl command-line tool.
#[derive(Debug, Clone)]
pub struct OpenSsl {
    program: OsString,
}

impl Default for OpenSsl {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenSsl {
    /// Uses `openssl` from `PATH`.
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Uses the given executable instead of `openssl`.
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Reads the executable from `CERTSHELL_OPENSSL`, falling back to `openssl`.
    pub fn from_env() -> Self {
        match std::env::var_os(PROGRAM_ENV) {
            Some(program) if !program.is_empty() => Self::with_program(program),
            _ => Self::new(),
        }
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Runs the tool to completion and returns its output whatever the exit status.
    ///
    /// When `input` is given it is written to the child's stdin while output is
    /// being collected, then stdin is closed. A child that exits before
    /// reading all of its input is not an error here; callers classify the
    /// output instead.
    pub async fn run<S: AsRef<OsStr>>(&self, args: &[S], input: Option<&[u8]>) -> Result<ToolOutput> {
        let command = self.describe(args);
        debug!(command = %command, stdin_bytes = ?input.map(<[u8]>::len), "running openssl");

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CertShellError::SpawnError {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;

        let stdin = child.stdin.take();
        let write = async move {
            if let (Some(mut stdin), Some(bytes)) = (stdin, input) {
                let result = stdin.write_all(bytes).await;
                drop(stdin);
                result
            } else {
                Ok(())
            }
        };
        let (write_result, output) = tokio::join!(write, child.wait_with_output());

        let output = output.map_err(|source| CertShellError::SpawnError {
            program: self.program.to_string_lossy().into_owned(),
            source,
        })?;
        if let Err(e) = write_result {
            debug!(command = %command, error = %e, "openssl closed stdin early");
        }

        let output = ToolOutput {
            command,
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %output.command, code = ?output.status.code(), "openssl exited");
        Ok(output)
    }

    /// Like [`OpenSsl::run`], but a non-zero exit becomes [`CertShellError::ToolError`].
    pub async fn run_checked<S: AsRef<OsStr>>(
        &self,
        args: &[S],
        input: Option<&[u8]>,
    ) -> Result<ToolOutput> {
        let output = self.run(args, input).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(output.into_error())
        }
    }

    fn describe<S: AsRef<OsStr>>(&self, args: &[S]) -> String {
        let mut command = self.program.to_string_lossy().into_owned();
        for arg in args {
            command.push(' ');
            command.push_str(&arg.as_ref().to_string_lossy());
        }
        command
    }
}

/// Captured result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// The command line, for error messages and logs.
    pub command: String,
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        text.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') && !self.stderr.is_empty() {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }

    pub fn into_error(self) -> CertShellError {
        CertShellError::ToolError {
            command: self.command,
            code: self.status.code(),
            stderr: self.stderr.trim().to_string(),
        }
    }
}
