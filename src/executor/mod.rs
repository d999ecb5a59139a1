//! Stage executors — run one stage against an input buffer.
//!
//! The controller only sees [`StageExecutor`]. How the input reaches the
//! process (stdin pipe, staging file, something else) is the executor's
//! business.

pub mod shell;
pub mod staging;

use async_trait::async_trait;

use crate::buffer::Buffer;
use crate::stage::Stage;

pub use shell::ShellExecutor;

/// Why a stage produced no buffer.
///
/// Messages are fixed text; the underlying OS error goes to the log only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The process or its I/O channel could not be created.
    #[error("Error executing command")]
    Spawn,

    /// The input could not be handed over to the stage.
    #[error("Error writing stage input")]
    StagingWrite,
}

/// Runs a single stage. Called strictly one stage at a time.
#[async_trait]
pub trait StageExecutor: Send {
    /// Execute `stage` with `input` as its standard input and return its
    /// captured standard output.
    async fn execute(&mut self, stage: &Stage, input: Buffer) -> Result<Buffer, ExecutionError>;
}
