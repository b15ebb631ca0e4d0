//! Subprocess execution seam.
//!
//! The facade never spawns processes directly; it hands a resolved
//! executable and an argument list to a [`CommandRunner`] and interprets
//! the raw output itself. Swapping the runner out makes every facade
//! operation testable from fixture byte streams.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

/// Raw result of one external command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, if the process exited normally.
    pub status_code: Option<i32>,
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Executes backend commands and reports what the process did.
///
/// Implementations stay policy free: error classification, output
/// decoding and the empty-listing normalization all live in the facade.
pub trait CommandRunner: Send + Sync {
    /// Locate the backend executable. The default searches `PATH`.
    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        which::which(name).map_err(|err| io::Error::new(io::ErrorKind::NotFound, err))
    }

    /// Run `program` with `args`, capturing both output streams. A `None`
    /// working directory inherits the caller's.
    fn run(
        &self,
        program: &Path,
        args: &[String],
        cwd: Option<&Path>,
    ) -> io::Result<CommandOutput>;
}

/// Default runner backed by `std::process::Command`.
///
/// Credential prompts are disabled so an unreachable remote fails
/// immediately instead of waiting on hidden terminal input.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        cwd: Option<&Path>,
    ) -> io::Result<CommandOutput> {
        debug!(
            program = %program.display(),
            args = ?args,
            cwd = ?cwd,
            "running VCS command"
        );
        let mut cmd = Command::new(program);
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_ASKPASS", "echo")
            .env("SSH_ASKPASS", "echo")
            .stdin(Stdio::null());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        let output = cmd.output()?;
        Ok(CommandOutput {
            status_code: output.status.code(),
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
