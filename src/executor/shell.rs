//! Shell executor — runs a stage as a child process.
//!
//! The command line is split on whitespace and spawned directly (no
//! `sh -c`). Input goes in on stdin, output comes back from stdout up to the
//! capture limit; the rest is drained and thrown away so the child can exit.
//! stderr is discarded and the exit status is only logged.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tracing::{debug, warn};

use super::staging::StagingFile;
use super::{ExecutionError, StageExecutor};
use crate::buffer::Buffer;
use crate::stage::Stage;

/// How stage input reaches the child.
#[derive(Debug)]
enum InputChannel {
    Pipe,
    File(StagingFile),
}

/// Runs stages as real processes.
#[derive(Debug)]
pub struct ShellExecutor {
    capture_limit: usize,
    input: InputChannel,
}

impl ShellExecutor {
    /// Feed input through a stdin pipe.
    pub fn new(capture_limit: usize) -> Self {
        Self {
            capture_limit,
            input: InputChannel::Pipe,
        }
    }

    /// Feed input through a staging file at `path` instead of a pipe.
    pub fn with_staging_file(capture_limit: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            capture_limit,
            input: InputChannel::File(StagingFile::new(path)),
        }
    }

    pub fn staging_file(&self) -> Option<&std::path::Path> {
        match &self.input {
            InputChannel::File(f) => Some(f.path()),
            InputChannel::Pipe => None,
        }
    }
}

#[async_trait]
impl StageExecutor for ShellExecutor {
    async fn execute(&mut self, stage: &Stage, input: Buffer) -> Result<Buffer, ExecutionError> {
        let argv = stage.argv();
        let Some((program, args)) = argv.split_first() else {
            warn!(stage = %stage.label, "stage has an empty command");
            return Err(ExecutionError::Spawn);
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // Pipe mode keeps the buffer to write after spawn; file mode stages it now.
        let pending = match &self.input {
            InputChannel::Pipe => {
                command.stdin(Stdio::piped());
                Some(input)
            }
            InputChannel::File(staging) => {
                staging.write(&input).map_err(|e| {
                    warn!(stage = %stage.label, error = %e, "failed to write staging file");
                    ExecutionError::StagingWrite
                })?;
                // Written but unopenable: the channel failed, not the write.
                let file = staging.open().map_err(|e| {
                    warn!(stage = %stage.label, error = %e, "failed to open staging file");
                    ExecutionError::Spawn
                })?;
                command.stdin(Stdio::from(file));
                None
            }
        };

        let mut child = command.spawn().map_err(|e| {
            warn!(stage = %stage.label, program = %program, error = %e, "failed to spawn stage");
            ExecutionError::Spawn
        })?;

        let stdout = child.stdout.take().ok_or(ExecutionError::Spawn)?;
        let stdin = child.stdin.take();

        let (fed, captured) = tokio::join!(
            feed(stdin, pending),
            capture(stdout, Buffer::max_len(self.capture_limit))
        );
        fed?;
        let captured = captured.map_err(|e| {
            warn!(stage = %stage.label, error = %e, "failed to read stage output");
            ExecutionError::Spawn
        })?;

        match child.wait().await {
            Ok(status) => debug!(stage = %stage.label, %status, "stage exited"),
            Err(e) => warn!(stage = %stage.label, error = %e, "failed to reap stage"),
        }

        Ok(Buffer::from_capture(captured, self.capture_limit))
    }
}

/// Write the pending input to the child's stdin, then close it.
async fn feed(stdin: Option<ChildStdin>, input: Option<Buffer>) -> Result<(), ExecutionError> {
    let (Some(mut stdin), Some(input)) = (stdin, input) else {
        return Ok(());
    };
    match stdin.write_all(input.as_bytes()).await {
        Ok(()) => Ok(()),
        // The child does not read its input. Not our problem.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("stage closed stdin before reading all input");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "failed to write stage input");
            Err(ExecutionError::StagingWrite)
        }
    }
}

/// Keep the first `keep` bytes of `reader`, drain the rest.
async fn capture<R: AsyncRead + Unpin>(mut reader: R, keep: usize) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    (&mut reader).take(keep as u64).read_to_end(&mut bytes).await?;
    let discarded = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    if discarded > 0 {
        debug!(kept = bytes.len(), discarded, "stage output truncated at capture limit");
    }
    Ok(bytes)
}
