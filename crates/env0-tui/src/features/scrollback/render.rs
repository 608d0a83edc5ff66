//! Scrollback rendering and hit-testing.

use env0_types::LineKind;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use super::state::Scrollback;

/// One wrapped display row.
struct Row {
    text: String,
    kind: LineKind,
    choice: Option<usize>,
}

/// Renders the visible part of the scrollback into `area`.
///
/// Content shorter than the viewport is bottom-aligned.
pub fn render_scrollback(scrollback: &Scrollback, frame: &mut Frame, area: Rect) {
    let lines: Vec<Line<'static>> = visible_rows(scrollback)
        .into_iter()
        .map(|row| match row {
            Some(row) => Line::styled(row.text, kind_style(row.kind)),
            None => Line::default(),
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

/// Returns the choice index of the line drawn at terminal row `row`, if any.
///
/// `area` must be the rect the scrollback was last rendered into.
pub fn choice_at(scrollback: &Scrollback, area: Rect, column: u16, row: u16) -> Option<usize> {
    if column < area.x
        || column >= area.x + area.width
        || row < area.y
        || row >= area.y + area.height
    {
        return None;
    }
    let idx = usize::from(row - area.y);
    visible_rows(scrollback)
        .into_iter()
        .nth(idx)
        .flatten()
        .and_then(|row| row.choice)
}

/// Rows filling the viewport top to bottom; `None` is top padding.
fn visible_rows(scrollback: &Scrollback) -> Vec<Option<Row>> {
    let viewport = scrollback.viewport;
    let all: Vec<Row> = scrollback
        .lines()
        .flat_map(|line| {
            line.rows(viewport.width).into_iter().map(|text| Row {
                text,
                kind: line.kind,
                choice: line.choice,
            })
        })
        .collect();

    let total = all.len();
    let offset = scrollback.scroll.get_offset(total, viewport.height);
    let padding = viewport.height.saturating_sub(total);

    let mut rows: Vec<Option<Row>> = Vec::with_capacity(viewport.height);
    rows.extend((0..padding).map(|_| None));
    rows.extend(all.into_iter().skip(offset).take(viewport.height).map(Some));
    rows
}

fn kind_style(kind: LineKind) -> Style {
    match kind {
        LineKind::Standard | LineKind::Spacer => Style::default(),
        LineKind::System => Style::default().fg(Color::Cyan),
        LineKind::Error => Style::default().fg(Color::Red),
        LineKind::Choice => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    }
}
