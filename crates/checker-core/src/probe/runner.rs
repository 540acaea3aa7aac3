use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::warn;

use super::ProbeCommand;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command failed: {command}\n{stderr}")]
    Exited {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("Failed reading output of {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command timed out after {}ms: {command}", timeout.as_millis())]
    TimedOut { command: String, timeout: Duration },
}

impl ProbeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Trait for executing a probe command and returning its stdout.
///
/// Implementations must enforce `timeout` and leave no child process behind
/// on any exit path.
#[async_trait]
pub trait ProbeRunner: Send + Sync {
    async fn run(&self, command: &ProbeCommand, timeout: Duration) -> Result<String, ProbeError>;
}

/// Runs the probe as a child process via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl ProbeRunner for ProcessRunner {
    async fn run(&self, command: &ProbeCommand, timeout: Duration) -> Result<String, ProbeError> {
        let mut child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::Spawn {
                program: command.program().to_string(),
                source,
            })?;

        let result = tokio::time::timeout(timeout, collect_output(&mut child)).await;
        match result {
            Ok(Ok((status, stdout, _))) if status.success() => {
                Ok(String::from_utf8_lossy(&stdout).into_owned())
            }
            Ok(Ok((status, _, stderr))) => Err(ProbeError::Exited {
                command: command.to_command_line(),
                code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            }),
            Ok(Err(source)) => {
                reap(&mut child, command).await;
                Err(ProbeError::Io {
                    command: command.to_command_line(),
                    source,
                })
            }
            Err(_) => {
                reap(&mut child, command).await;
                Err(ProbeError::TimedOut {
                    command: command.to_command_line(),
                    timeout,
                })
            }
        }
    }
}

async fn collect_output(child: &mut Child) -> std::io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let (status, out, err) = tokio::join!(
        child.wait(),
        read_pipe(stdout_pipe.as_mut(), &mut stdout),
        read_pipe(stderr_pipe.as_mut(), &mut stderr),
    );
    out?;
    err?;
    Ok((status?, stdout, stderr))
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> std::io::Result<()> {
    if let Some(pipe) = pipe {
        pipe.read_to_end(buf).await?;
    }
    Ok(())
}

/// Kill the child and wait for it so no zombie is left behind.
async fn reap(child: &mut Child, command: &ProbeCommand) {
    if let Err(e) = child.kill().await {
        warn!(program = command.program(), url = command.url(), error = %e, "Failed to kill probe process");
    }
}
