use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::state::AppState;

/// Right-aligned indicator shown while not following output.
pub const JUMP_LABEL: &str = " ↓ latest (End) ";

pub fn render_status_line(app: &AppState, frame: &mut Frame, area: Rect) {
    let muted = Style::default().fg(Color::DarkGray);
    let (dot, connection) = if app.connection.is_online() {
        (Span::styled("● ", Style::default().fg(Color::Green)), "online")
    } else {
        (Span::styled("○ ", Style::default().fg(Color::Red)), "offline")
    };
    let mode = if app.mode.is_story() { "story" } else { "terminal" };
    let typing = if app.animator.is_enabled() {
        "typing on"
    } else {
        "typing off"
    };

    let line = Line::from(vec![
        dot,
        Span::styled(connection, muted),
        Span::styled(" │ ", muted),
        Span::styled(mode, muted),
        Span::styled(" │ ", muted),
        Span::styled(format!("{typing} (F2)"), muted),
        Span::styled(" │ ^Q quit", muted),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    if !app.scrollback.scroll.is_following() {
        let jump = Line::styled(
            JUMP_LABEL,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(Paragraph::new(jump), jump_indicator_area(area));
    }
}

/// Where the jump indicator is drawn within the status row.
pub fn jump_indicator_area(status: Rect) -> Rect {
    let width = (JUMP_LABEL.width() as u16).min(status.width);
    Rect::new(status.x + status.width - width, status.y, width, 1.min(status.height))
}
