//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui `Frame`, and never
//! mutate state.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders};

use crate::features::{input, scrollback, statusline};
use crate::state::AppState;

/// Horizontal padding on each side of the scrollback.
pub const SCROLLBACK_MARGIN: u16 = 1;

/// Input row plus its top border.
const INPUT_HEIGHT: u16 = 2;

const STATUS_HEIGHT: u16 = 1;

/// Screen areas, computed from the terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppLayout {
    pub scrollback: Rect,
    /// Input block including its border.
    pub input: Rect,
    pub status: Rect,
}

/// Splits the terminal area.
pub fn layout(area: Rect) -> AppLayout {
    let [body, input, status] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(INPUT_HEIGHT),
        Constraint::Length(STATUS_HEIGHT),
    ])
    .areas(area);

    let margin = SCROLLBACK_MARGIN.min(body.width / 2);
    let scrollback = Rect::new(
        body.x + margin,
        body.y,
        body.width - margin * 2,
        body.height,
    );

    AppLayout {
        scrollback,
        input,
        status,
    }
}

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let areas = layout(frame.area());

    scrollback::render_scrollback(&app.scrollback, frame, areas.scrollback);

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    let input_inner = block.inner(areas.input);
    frame.render_widget(block, areas.input);
    input::render_input(app, frame, input_inner);

    statusline::render_status_line(app, frame, areas.status);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_stacks_areas() {
        let areas = layout(Rect::new(0, 0, 80, 24));
        assert_eq!(areas.scrollback, Rect::new(1, 0, 78, 21));
        assert_eq!(areas.input, Rect::new(0, 21, 80, 2));
        assert_eq!(areas.status, Rect::new(0, 23, 80, 1));
    }
}
