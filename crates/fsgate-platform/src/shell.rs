use std::io;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

/// A command line to hand to the host interpreter
#[derive(Debug, Clone)]
pub struct ShellCommand {
    /// Interpreted by the shell as-is (pipes, redirection, quoting)
    pub command: String,
    pub cwd: PathBuf,
    /// When false, the child's stdout/stderr are discarded
    pub capture_output: bool,
    pub timeout: Duration,
}

/// Output of a child that ran to completion
#[derive(Debug, Clone, Default)]
pub struct ShellOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code; signal-terminated children report the negated signal number
    pub code: i32,
}

#[derive(Debug)]
pub enum ShellOutcome {
    Completed(ShellOutput),
    /// The deadline passed; the child and its descendants have been killed
    /// and reaped.
    TimedOut,
}

#[async_trait]
pub trait Shell: Send + Sync {
    /// Run a command line to completion or until its timeout.
    ///
    /// `Err` means the process could not be launched or waited on.
    async fn run(&self, cmd: &ShellCommand) -> io::Result<ShellOutcome>;
}
