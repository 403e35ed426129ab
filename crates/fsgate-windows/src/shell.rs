use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use fsgate_platform::shell::{Shell, ShellCommand, ShellOutcome, ShellOutput};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};
use windows::Win32::System::Threading::CREATE_NO_WINDOW;

/// Runs command lines through `cmd.exe /C`.
pub struct WindowsShell {
    shell: String,
}

impl WindowsShell {
    pub fn new(shell: Option<&str>) -> Self {
        Self {
            shell: shell
                .filter(|s| !s.trim().is_empty())
                .map(String::from)
                .unwrap_or_else(Self::detect_shell),
        }
    }

    fn detect_shell() -> String {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    }
}

impl Default for WindowsShell {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Shell for WindowsShell {
    async fn run(&self, cmd: &ShellCommand) -> io::Result<ShellOutcome> {
        let mut command = Command::new(&self.shell);
        // cmd.exe does its own parsing of the remainder of the line, so the
        // command text must reach it unquoted
        command
            .arg("/C")
            .raw_arg(&cmd.command)
            .current_dir(&cmd.cwd)
            .stdin(Stdio::null())
            .creation_flags(CREATE_NO_WINDOW.0)
            .kill_on_drop(true);

        if cmd.capture_output {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let mut child = command.spawn()?;
        let pid = child.id();
        debug!("spawned {} /C (pid={:?})", self.shell, pid);

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let run = async {
            let (status, stdout, stderr) =
                tokio::try_join!(child.wait(), drain(stdout), drain(stderr))?;
            Ok::<_, io::Error>(ShellOutput {
                stdout,
                stderr,
                code: status.code().unwrap_or(-1),
            })
        };
        let finished = tokio::time::timeout(cmd.timeout, run).await;

        match finished {
            Ok(result) => result.map(ShellOutcome::Completed),
            Err(_) => {
                warn!("command exceeded {}s, killing tree {:?}", cmd.timeout.as_secs(), pid);
                if let Some(pid) = pid {
                    kill_tree(pid).await;
                }
                if let Err(e) = child.kill().await {
                    warn!("failed to kill timed out child: {}", e);
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

async fn kill_tree(pid: u32) {
    let status = Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .creation_flags(CREATE_NO_WINDOW.0)
        .status()
        .await;
    if let Err(e) = status {
        warn!("taskkill for pid {} failed: {}", pid, e);
    }
}
