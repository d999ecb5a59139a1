//! Terminal view — ratatui presentation of a pipeline run.
//!
//! Model (`Screen`) + View (`layout::draw`). Every `show_*` call updates
//! the model and repaints the whole frame; `await_ack` only reads input.

pub mod app;
pub mod layout;
pub mod session;
pub mod text;

use std::io;

use async_trait::async_trait;
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures_util::{Stream, StreamExt};
use tracing::debug;

use crate::lines::LineSet;
use crate::view::{ViewError, ViewPort};

use app::Screen;
use session::TerminalSession;

/// [`ViewPort`] backed by the real terminal.
pub struct TuiView {
    session: TerminalSession,
    events: EventStream,
    screen: Screen,
}

impl TuiView {
    /// Take over the terminal and draw the empty panels.
    pub fn enter() -> Result<Self, ViewError> {
        let mut view = Self {
            session: TerminalSession::enter()?,
            events: EventStream::new(),
            screen: Screen::default(),
        };
        view.render()?;
        Ok(view)
    }

    fn render(&mut self) -> Result<(), ViewError> {
        render(&mut self.session, &self.screen)
    }
}

fn render(session: &mut TerminalSession, screen: &Screen) -> Result<(), ViewError> {
    session.terminal.draw(|f| layout::draw(f, screen))?;
    Ok(())
}

/// Consume `events` until a key press. Resizes call `on_resize`; everything
/// else is skipped. A closed stream is an error, not an acknowledgment.
pub(crate) async fn wait_for_press<S, R>(events: &mut S, mut on_resize: R) -> Result<(), ViewError>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
    R: FnMut() -> Result<(), ViewError>,
{
    while let Some(event) = events.next().await {
        match event? {
            // Release/repeat events would double-advance on some platforms.
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                debug!(code = ?key.code, "acknowledged");
                return Ok(());
            }
            Event::Resize(..) => on_resize()?,
            _ => {}
        }
    }
    Err(ViewError(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "terminal input closed",
    )))
}

#[async_trait]
impl ViewPort for TuiView {
    fn show_stage(
        &mut self,
        step: usize,
        total: usize,
        label: &str,
        command: &str,
    ) -> Result<(), ViewError> {
        self.screen.begin_stage(step, total, label, command);
        self.render()
    }

    fn show_output(&mut self, step: usize, lines: &LineSet) -> Result<(), ViewError> {
        self.screen.show_output(step, lines);
        self.render()
    }

    fn show_error(&mut self, message: &str) -> Result<(), ViewError> {
        self.screen.show_error(message);
        self.render()
    }

    async fn await_ack(&mut self) -> Result<(), ViewError> {
        let Self {
            session,
            events,
            screen,
        } = self;
        wait_for_press(events, || render(session, screen)).await
    }
}
