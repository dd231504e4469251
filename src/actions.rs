//! Local actions run before the code engine upload.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{error, info, warn};

use crate::error::HookError;

/// How a single action finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    /// Non-zero exit; `None` when terminated by a signal.
    Failed(Option<i32>),
    TimedOut,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success)
    }
}

/// Runs one configured action to completion.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    async fn run(&self, command: &str, cwd: &Path) -> Result<ActionOutcome, HookError>;
}

/// Runs actions through `sh -c` with inherited stdio.
#[derive(Debug, Clone, Default)]
pub struct ShellActionRunner {
    timeout: Option<Duration>,
}

impl ShellActionRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ActionRunner for ShellActionRunner {
    async fn run(&self, command: &str, cwd: &Path) -> Result<ActionOutcome, HookError> {
        info!("Running (cwd = '{}'): {}", cwd.display(), command);
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).current_dir(cwd).stdin(Stdio::null());
        // own process group, so a timeout reaches every process the shell started
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| {
            error!("Action '{}' failed to start: {}", command, e);
            HookError::ActionFailed(format!("'{}' failed to start: {}", command, e))
        })?;

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    error!("Action '{}' timed out after {:?}", command, limit);
                    terminate(&mut child).await?;
                    return Ok(ActionOutcome::TimedOut);
                }
            },
            None => child.wait().await?,
        };

        if status.success() {
            Ok(ActionOutcome::Success)
        } else {
            Ok(ActionOutcome::Failed(status.code()))
        }
    }
}

/// Kills the action and everything in its process group, then reaps it.
async fn terminate(child: &mut Child) -> io::Result<()> {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            warn!("Failed to signal process group {}: {}", pid, e);
        }
    }
    child.kill().await
}
