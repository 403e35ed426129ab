use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use fsgate_platform::shell::{Shell, ShellCommand, ShellOutcome, ShellOutput};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

const DEFAULT_SHELL: &str = "/bin/sh";

/// Runs command lines through a POSIX shell (`<shell> -c <command>`).
///
/// Each child leads its own process group so that a timeout can take down
/// everything the command spawned, not just the shell.
pub struct UnixShell {
    shell: String,
}

impl UnixShell {
    pub fn new(shell: Option<&str>) -> Self {
        Self {
            shell: shell
                .filter(|s| !s.trim().is_empty())
                .map(String::from)
                .unwrap_or_else(|| DEFAULT_SHELL.to_string()),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for UnixShell {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Shell for UnixShell {
    async fn run(&self, cmd: &ShellCommand) -> io::Result<ShellOutcome> {
        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(&cmd.command)
            .current_dir(&cmd.cwd)
            .stdin(Stdio::null())
            .process_group(0)
            .kill_on_drop(true);

        if cmd.capture_output {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let mut child = command.spawn()?;
        let pid = child.id();
        debug!("spawned {} -c (pid={:?}, cwd={})", self.shell, pid, cmd.cwd.display());

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // The deadline covers draining the pipes as well as the exit, since a
        // backgrounded descendant can hold them open after the shell is gone.
        let run = async {
            let (status, stdout, stderr) =
                tokio::try_join!(child.wait(), drain(stdout), drain(stderr))?;
            Ok::<_, io::Error>(ShellOutput {
                stdout,
                stderr,
                code: exit_code(status),
            })
        };
        let finished = tokio::time::timeout(cmd.timeout, run).await;

        match finished {
            Ok(result) => result.map(ShellOutcome::Completed),
            Err(_) => {
                warn!(
                    "command exceeded {}s, killing process group {:?}",
                    cmd.timeout.as_secs(),
                    pid
                );
                if let Some(pid) = pid {
                    kill_group(pid);
                }
                // Reap the shell itself; the rest of the group is reparented
                if let Err(e) = child.wait().await {
                    warn!("failed to reap timed out child: {}", e);
                }
                Ok(ShellOutcome::TimedOut)
            }
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

fn kill_group(pid: u32) {
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => info!("killed process group {}", pid),
        Err(e) => debug!("killpg({}) failed: {}", pid, e),
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| -sig))
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn command(line: &str, timeout_secs: u64) -> ShellCommand {
        ShellCommand {
            command: line.to_string(),
            cwd: std::env::temp_dir(),
            capture_output: true,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn completed(outcome: ShellOutcome) -> ShellOutput {
        match outcome {
            ShellOutcome::Completed(out) => out,
            ShellOutcome::TimedOut => panic!("command unexpectedly timed out"),
        }
    }

    #[test]
    fn test_default_shell() {
        assert_eq!(UnixShell::new(None).shell(), "/bin/sh");
        assert_eq!(UnixShell::new(Some("  ")).shell(), "/bin/sh");
        assert_eq!(UnixShell::new(Some("/bin/bash")).shell(), "/bin/bash");
    }

    #[tokio::test]
    async fn test_pipes_and_redirection_are_interpreted() {
        let out = completed(
            UnixShell::default()
                .run(&command("printf 'a\\nb\\n' | wc -l; echo oops 1>&2", 10))
                .await
                .unwrap(),
        );
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "2");
        assert_eq!(String::from_utf8_lossy(&out.stderr), "oops\n");
        assert_eq!(out.code, 0);
    }

    #[tokio::test]
    async fn test_exit_code_passthrough() {
        let out = completed(UnixShell::default().run(&command("exit 7", 10)).await.unwrap());
        assert_eq!(out.code, 7);
    }

    #[tokio::test]
    async fn test_signal_reports_negative_code() {
        let out = completed(
            UnixShell::default()
                .run(&command("kill -TERM $$", 10))
                .await
                .unwrap(),
        );
        assert_eq!(out.code, -15);
    }

    #[tokio::test]
    async fn test_runs_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let mut cmd = command("pwd", 10);
        cmd.cwd = dir.path().to_path_buf();
        let out = completed(UnixShell::default().run(&cmd).await.unwrap());
        let reported = PathBuf::from(String::from_utf8_lossy(&out.stdout).trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_uncaptured_output_is_discarded() {
        let mut cmd = command("echo hidden", 10);
        cmd.capture_output = false;
        let out = completed(UnixShell::default().run(&cmd).await.unwrap());
        assert!(out.stdout.is_empty());
        assert_eq!(out.code, 0);
    }

    #[tokio::test]
    async fn test_timeout_kills_whole_group() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("survivor");
        // The backgrounded subshell would create the marker if it outlived the kill
        let line = format!("(sleep 2; touch '{}') & sleep 5", marker.display());

        let start = Instant::now();
        let outcome = UnixShell::default().run(&command(&line, 1)).await.unwrap();
        let elapsed = start.elapsed();

        assert!(matches!(outcome, ShellOutcome::TimedOut));
        assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!marker.exists(), "background child survived the timeout");
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_launch_error() {
        let shell = UnixShell::new(Some("/definitely/not/a/shell"));
        let err = shell.run(&command("true", 5)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
