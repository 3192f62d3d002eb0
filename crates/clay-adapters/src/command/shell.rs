//! Runs `runCommand` steps through the platform shell.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use clay_core::{
    application::{ApplicationError, ports::{CommandOutcome, CommandRunner}},
    error::ClayResult,
};

/// Runs commands with `sh -c` (`cmd /C` on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &str, cwd: &Path, stream_output: bool) -> ClayResult<CommandOutcome> {
        debug!(command, cwd = %cwd.display(), stream_output, "spawning");

        let mut cmd = shell(command);
        cmd.current_dir(cwd).stdin(Stdio::null());

        let spawn_failed = |e: std::io::Error| ApplicationError::CommandFailed {
            command: command.to_string(),
            reason: e.to_string(),
        };

        if stream_output {
            let status = cmd
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(spawn_failed)?;
            return Ok(CommandOutcome {
                success: status.success(),
                code: status.code(),
                ..CommandOutcome::default()
            });
        }

        let output = cmd.output().map_err(spawn_failed)?;
        Ok(CommandOutcome {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_output_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = ShellCommandRunner::new()
            .run("echo hello; echo oops >&2; exit 3", dir.path(), false)
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.code, Some(3));
        assert_eq!(outcome.stdout.trim(), "hello");
        assert_eq!(outcome.stderr.trim(), "oops");
    }

    #[test]
    fn runs_in_the_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let outcome = ShellCommandRunner::new()
            .run("ls", dir.path(), false)
            .unwrap();
        assert!(outcome.success);
        assert!(outcome.stdout.contains("marker.txt"));
    }
}
