//! Scrollback update handlers.

use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};

use super::state::Scrollback;

/// Rows to scroll per mouse wheel tick.
const MOUSE_SCROLL_ROWS: usize = 3;

/// Handles PageUp/PageDown/End. Returns true if the key was consumed.
pub fn handle_scroll_key(scrollback: &mut Scrollback, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::PageUp => scrollback.page_up(),
        KeyCode::PageDown => scrollback.page_down(),
        KeyCode::End => scrollback.jump_to_latest(),
        _ => return false,
    }
    true
}

/// Handles mouse wheel events. Returns true if the event was consumed.
pub fn handle_mouse_scroll(scrollback: &mut Scrollback, mouse: &MouseEvent) -> bool {
    match mouse.kind {
        MouseEventKind::ScrollUp => scrollback.scroll_up(MOUSE_SCROLL_ROWS),
        MouseEventKind::ScrollDown => scrollback.scroll_down(MOUSE_SCROLL_ROWS),
        _ => return false,
    }
    true
}
