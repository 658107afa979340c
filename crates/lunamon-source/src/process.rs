use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{ChunkSource, CommandConfig, SourceError};

/// Streams stdout of a spawned monitor command.
///
/// Stderr is forwarded to the log line by line. The child is killed when
/// the source is dropped.
pub struct ProcessSource {
    label: String,
    child: Child,
    stdout: ChildStdout,
    stderr_task: Option<JoinHandle<()>>,
    buf: Vec<u8>,
    exit_status: Option<ExitStatus>,
}

impl ProcessSource {
    pub fn spawn(config: &CommandConfig) -> Result<Self, SourceError> {
        let (program, args) = config
            .command
            .split_first()
            .ok_or(SourceError::EmptyCommand)?;
        let label = config.command.join(" ");

        debug!(program = %program, args = ?args, "Spawning monitor process");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &config.env_vars {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(SourceError::SpawnFailed)?;

        let stdout = child.stdout.take().ok_or(SourceError::NotCaptured("stdout"))?;
        let stderr = child.stderr.take().ok_or(SourceError::NotCaptured("stderr"))?;

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => warn!(line = %line, "Monitor stderr"),
                    Ok(None) => break,
                    Err(e) => {
                        debug!(error = %e, "Failed to read monitor stderr");
                        break;
                    }
                }
            }
        });

        info!(command = %label, pid = ?child.id(), "Monitor process started");

        Ok(Self {
            label,
            child,
            stdout,
            stderr_task: Some(stderr_task),
            buf: vec![0; config.chunk_size.max(1)],
            exit_status: None,
        })
    }

    /// Exit status, once the stream has terminated.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    async fn finish(&mut self) -> Result<(), SourceError> {
        if let Some(task) = self.stderr_task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Monitor stderr forwarder failed");
            }
        }
        let status = self.child.wait().await.map_err(SourceError::ReadFailed)?;
        info!(exit_code = status.code().unwrap_or(-1), "Monitor process exited");
        self.exit_status = Some(status);
        Ok(())
    }
}

#[async_trait]
impl ChunkSource for ProcessSource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        if self.exit_status.is_some() {
            return Ok(None);
        }

        let n = self
            .stdout
            .read(&mut self.buf)
            .await
            .map_err(SourceError::ReadFailed)?;

        if n == 0 {
            self.finish().await?;
            return Ok(None);
        }

        Ok(Some(self.buf[..n].to_vec()))
    }
}
