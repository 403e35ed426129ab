use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fsgate_platform::filesystem::FileSystem;
use fsgate_platform::shell::{Shell, ShellCommand, ShellOutcome};
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::files::check_range;
use crate::protocol::{CommandResult, ExecRequest};
use crate::resolver::PathResolver;

pub const TIMEOUT_SECS_RANGE: RangeInclusive<u64> = 1..=300;

/// Runs command lines through the host shell
pub struct ExecHandler {
    shell: Box<dyn Shell>,
    fs: Arc<dyn FileSystem>,
    resolver: PathResolver,
    config: GatewayConfig,
}

impl ExecHandler {
    pub fn new(
        shell: Box<dyn Shell>,
        fs: Arc<dyn FileSystem>,
        resolver: PathResolver,
        config: GatewayConfig,
    ) -> Self {
        Self {
            shell,
            fs,
            resolver,
            config,
        }
    }

    pub async fn exec(&self, req: &ExecRequest) -> Result<CommandResult, GatewayError> {
        let timeout_secs = req.timeout_secs.unwrap_or(self.config.default_timeout_secs);
        check_range("timeout_secs", timeout_secs, &TIMEOUT_SECS_RANGE)?;

        let cwd = self.working_directory(req.cwd.as_deref())?;
        info!("exec in {} (timeout {}s): {}", cwd.display(), timeout_secs, req.command);

        let cmd = ShellCommand {
            command: req.command.clone(),
            cwd,
            capture_output: req.capture_output,
            timeout: Duration::from_secs(timeout_secs),
        };

        let outcome = self.shell.run(&cmd).await.map_err(|e| {
            warn!("failed to launch shell: {}", e);
            GatewayError::Unhandled {
                message: e.to_string(),
            }
        })?;

        match outcome {
            ShellOutcome::Completed(output) => Ok(CommandResult {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                return_code: output.code,
            }),
            ShellOutcome::TimedOut => Err(GatewayError::Timeout { secs: timeout_secs }),
        }
    }

    /// Blank or unset means the caller's home
    fn working_directory(&self, raw: Option<&str>) -> Result<PathBuf, GatewayError> {
        let raw = match raw.map(str::trim) {
            Some(dir) if !dir.is_empty() => dir,
            _ => "~",
        };

        let invalid = || GatewayError::InvalidWorkingDirectory {
            path: raw.to_string(),
        };

        let path = match self.resolver.resolve(self.fs.as_ref(), raw) {
            Ok(p) => p,
            Err(GatewayError::Malformed { .. }) => return Err(invalid()),
            Err(e) => return Err(e),
        };

        match self.fs.stat(&path) {
            Ok(Some(stat)) if stat.is_dir => Ok(path),
            Ok(_) => Err(invalid()),
            Err(e) => Err(GatewayError::from_io(e, &path)),
        }
    }
}
