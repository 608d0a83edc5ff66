//! Input row view.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use super::line_editor::LineEditor;
use super::prompt::PromptInfo;
use crate::state::AppState;

/// Label in front of the story choice editor.
const STORY_LABEL: &str = "choice> ";

/// Renders the active input surface and places the cursor.
pub fn render_input(app: &AppState, frame: &mut Frame, area: Rect) {
    if !app.connection.is_online() {
        let line = Line::styled("offline - waiting for backend", dim());
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    if app.mode.is_story() {
        if app.story.awaiting_advance() {
            let line = Line::styled("press enter to continue", dim());
            frame.render_widget(Paragraph::new(line), area);
            return;
        }
        let label = Span::styled(STORY_LABEL, Style::default().fg(Color::Yellow));
        render_editor(frame, area, vec![label], &app.input.story_editor);
        return;
    }

    render_editor(
        frame,
        area,
        prompt_spans(&app.input.prompt),
        &app.input.editor,
    );
}

fn render_editor(frame: &mut Frame, area: Rect, mut spans: Vec<Span<'static>>, editor: &LineEditor) {
    let prefix_width: usize = spans.iter().map(|span| span.content.width()).sum();
    spans.push(Span::raw(editor.text().to_string()));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);

    let cursor_x = (prefix_width + editor.cursor_width()).min(usize::from(area.width.saturating_sub(1)));
    frame.set_cursor_position(Position::new(area.x + cursor_x as u16, area.y));
}

fn prompt_spans(prompt: &PromptInfo) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    if !prompt.user.is_empty() {
        spans.push(Span::styled(
            format!("{}@", prompt.user),
            Style::default().fg(Color::Green),
        ));
    }
    if !prompt.host.is_empty() {
        spans.push(Span::styled(
            prompt.host.clone(),
            Style::default().fg(Color::Green),
        ));
    }
    if !prompt.cwd.is_empty() {
        spans.push(Span::styled(
            format!(":{}", prompt.cwd),
            Style::default().fg(Color::Blue),
        ));
    }
    spans.push(Span::styled(
        format!("{} ", prompt.symbol),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    spans
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}
