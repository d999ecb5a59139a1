//! pipeview — step through a text pipeline one stage at a time.
//!
//! A fixed list of stages (external commands) runs in order. Each stage's
//! stdout becomes the next stage's stdin. The run pauses before and after
//! every stage so the intermediate output can be read in the terminal.
//!
//! - [`buffer`]: bounded stage payload
//! - [`lines`]: output → display lines
//! - [`executor`]: runs one stage as a child process
//! - [`pipeline`]: the controller state machine
//! - [`view`] / [`tui`]: the display seam and its ratatui implementation

pub mod buffer;
pub mod executor;
pub mod lines;
pub mod pipeline;
pub mod stage;
pub mod tui;
pub mod view;

pub use pipeview_config as config;
