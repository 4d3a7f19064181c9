//! Process Runner for sage-helper
//!
//! The single place where external commands are executed. Every share query,
//! share mutation and identity translation goes through a [`ProcessRunner`],
//! which lets tests substitute a recording fake.
//!
//! A non-zero return code is a normal outcome and is returned as data. Only a
//! failure to launch the process at all becomes an [`Error::Launch`].

use std::process::{Command, Stdio};

use tracing::info;

use crate::error::{Error, Result};

/// Captured outcome of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code (`-1` when the process was terminated without one)
    pub returncode: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ProcessOutput {
    /// Build an output value directly (mostly useful for fakes)
    pub fn new(returncode: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            returncode,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command reported success
    pub fn success(&self) -> bool {
        self.returncode == 0
    }
}

/// Executes an external command synchronously and captures its output
pub trait ProcessRunner {
    /// Run `command[0]` with the remaining elements as arguments
    fn run(&self, command: &[String]) -> Result<ProcessOutput>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, command: &[String]) -> Result<ProcessOutput> {
        (**self).run(command)
    }
}

/// [`ProcessRunner`] backed by `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        SystemProcessRunner
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &[String]) -> Result<ProcessOutput> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::InvalidArgument("empty command".to_string()))?;

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::launch(command.join(" "), e))?;

        Ok(ProcessOutput {
            returncode: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Run a command and write the process details to the audit log
pub fn run_logged<R: ProcessRunner + ?Sized>(
    runner: &R,
    action: &str,
    command: &[String],
) -> Result<ProcessOutput> {
    let output = runner.run(command)?;
    info!(
        "{} | cmd={} | rc={} | stdout={} | stderr={}",
        action,
        command.join(" "),
        output.returncode,
        output.stdout.trim(),
        output.stderr.trim()
    );
    Ok(output)
}

/// Build an owned command vector from string slices
pub fn command_line(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

/// Check if a command is available on the system
pub fn is_command_available(command: &str) -> bool {
    let check_cmd = if cfg!(windows) { "where" } else { "which" };
    Command::new(check_cmd)
        .arg(command)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_output_success() {
        assert!(ProcessOutput::new(0, "ok", "").success());
        assert!(!ProcessOutput::new(2, "", "failed").success());
    }

    #[test]
    fn test_command_line() {
        let cmd = command_line(&["net", "share", "SystemAG$"]);
        assert_eq!(cmd, vec!["net", "share", "SystemAG$"]);
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let result = SystemProcessRunner::new().run(&[]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_binary_is_launch_error() {
        let cmd = command_line(&["sage-helper-definitely-missing-binary"]);
        let err = SystemProcessRunner::new().run(&cmd).unwrap_err();
        assert!(err.is_launch_error());
    }

    #[test]
    fn test_is_command_available() {
        assert!(!is_command_available("sage-helper-definitely-missing-binary"));
    }
}
