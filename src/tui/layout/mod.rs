//! Two-panel layout.
//!
//! ```text
//! ┌─ Pipeline ──────────────────────────────────────┐
//! │ Stage 2 of 4  Keep errors                        │
//! │ Command: grep error                              │
//! │                                                  │
//! │ Press any key to simulate this stage...          │
//! └──────────────────────────────────────────────────┘
//! ┌─ Output after stage 1 ──────────────────────────┐
//! │                                                  │
//! │ info: everything is working                      │
//! │ ...                                              │
//! │ Press any key to continue...                     │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Both panels are cleared and redrawn from the [`Screen`] model on every
//! frame. The preview does not scroll: lines below the last row are not
//! drawn.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};
use ratatui::Frame;

use super::app::{Preview, Screen};
use super::text::{clip, sanitize};

/// Height of the status panel, borders included.
pub const STATUS_HEIGHT: u16 = 7;

/// Draw the full screen.
pub fn draw(f: &mut Frame, screen: &Screen) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(STATUS_HEIGHT), // pipeline status
            Constraint::Min(3),                // output preview
        ])
        .split(f.area());

    draw_status(f, screen, outer[0]);
    draw_preview(f, screen, outer[1]);
}

fn panel(title: String, color: Color) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .padding(Padding::horizontal(1))
}

fn draw_status(f: &mut Frame, screen: &Screen, area: Rect) {
    f.render_widget(Clear, area);
    let block = panel(" Pipeline ".into(), Color::Cyan);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = inner.width as usize;
    let mut lines: Vec<Line> = Vec::new();
    if let Some(status) = &screen.status {
        let heading = format!("Stage {} of {}", status.step, status.total);
        let label_room = width.saturating_sub(heading.len() + 2);
        lines.push(Line::from(vec![
            Span::styled(heading, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                clip(&sanitize(&status.label), label_room),
                Style::default().fg(Color::Cyan),
            ),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Command: ", Style::default().fg(Color::DarkGray)),
            Span::raw(clip(&sanitize(&status.command), width.saturating_sub(9))),
        ]));
    } else {
        lines.push(Line::from(""));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled(
        screen.status_hint(),
        Style::default().fg(Color::Yellow),
    ));

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_preview(f: &mut Frame, screen: &Screen, area: Rect) {
    f.render_widget(Clear, area);

    let (title, color) = match &screen.preview {
        Preview::Empty => (" Output ".to_string(), Color::DarkGray),
        Preview::Output { step, .. } => (format!(" Output after stage {step} "), Color::Green),
        Preview::Error(_) => (" Error ".to_string(), Color::Red),
    };
    let block = panel(title, color);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // gap under the border
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(inner);
    let body = rows[1];
    let width = body.width as usize;

    let body_lines: Vec<Line> = match &screen.preview {
        Preview::Empty => Vec::new(),
        Preview::Output { lines, .. } if lines.is_empty() => vec![Line::styled(
            "(no output)",
            Style::default().fg(Color::DarkGray),
        )],
        Preview::Output { lines, .. } => lines
            .iter()
            .take(body.height as usize)
            .map(|l| Line::from(clip(&sanitize(l), width)))
            .collect(),
        Preview::Error(message) => vec![Line::styled(
            clip(&sanitize(message), width),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )],
    };
    f.render_widget(Paragraph::new(body_lines), body);

    if let Some(footer) = screen.preview_footer() {
        f.render_widget(
            Paragraph::new(Span::styled(footer, Style::default().fg(Color::Yellow))),
            rows[2],
        );
    }
}
