//! ViewPort — what the controller needs from a display.
//!
//! Rendering and waiting are separate calls so the controller's state
//! machine never touches the terminal directly. The terminal implementation
//! lives in [`crate::tui`].

use async_trait::async_trait;

use crate::lines::LineSet;

/// The display failed (terminal I/O).
#[derive(Debug, thiserror::Error)]
#[error("terminal error: {0}")]
pub struct ViewError(#[from] pub std::io::Error);

#[async_trait]
pub trait ViewPort: Send {
    /// Announce the stage about to run. `step` is 1-based.
    fn show_stage(
        &mut self,
        step: usize,
        total: usize,
        label: &str,
        command: &str,
    ) -> Result<(), ViewError>;

    /// Show the lines a stage produced.
    fn show_output(&mut self, step: usize, lines: &LineSet) -> Result<(), ViewError>;

    /// Show a message that ends the run.
    fn show_error(&mut self, message: &str) -> Result<(), ViewError>;

    /// Block until the user presses a key. Which key is irrelevant.
    async fn await_ack(&mut self) -> Result<(), ViewError>;
}
