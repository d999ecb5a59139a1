//! Screen model — what the two panels currently show.
//!
//! The view mutates this, then the layout renders it from scratch. Nothing
//! here touches the terminal.

use crate::lines::LineSet;

/// Top panel: the stage being stepped through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStatus {
    pub step: usize,
    pub total: usize,
    pub label: String,
    pub command: String,
    /// Output for this stage is on screen.
    pub ran: bool,
}

/// Bottom panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Preview {
    #[default]
    Empty,
    Output {
        step: usize,
        lines: Vec<String>,
    },
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub status: Option<StageStatus>,
    pub preview: Preview,
}

impl Screen {
    pub fn begin_stage(&mut self, step: usize, total: usize, label: &str, command: &str) {
        self.status = Some(StageStatus {
            step,
            total,
            label: label.to_string(),
            command: command.to_string(),
            ran: false,
        });
    }

    pub fn show_output(&mut self, step: usize, lines: &LineSet) {
        if let Some(status) = self.status.as_mut() {
            status.ran = true;
        }
        self.preview = Preview::Output {
            step,
            lines: lines.into_iter().cloned().collect(),
        };
    }

    pub fn show_error(&mut self, message: &str) {
        self.preview = Preview::Error(message.to_string());
    }

    /// Prompt line for the status panel.
    pub fn status_hint(&self) -> &'static str {
        match (&self.status, &self.preview) {
            (_, Preview::Error(_)) => "Pipeline halted.",
            (None, _) => "Waiting for the pipeline to start...",
            (Some(s), _) if !s.ran => "Press any key to simulate this stage...",
            (Some(s), _) if s.step == s.total => "Last stage done.",
            (Some(_), _) => "Stage done.",
        }
    }

    /// Bottom line of the preview panel, if the run is waiting on a key.
    pub fn preview_footer(&self) -> Option<&'static str> {
        match &self.preview {
            Preview::Empty => None,
            Preview::Output { .. } => Some("Press any key to continue..."),
            Preview::Error(_) => Some("Press any key to exit..."),
        }
    }
}
