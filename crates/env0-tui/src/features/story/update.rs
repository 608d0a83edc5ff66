//! Story-mode input handling.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use super::state::{StoryInput, StoryState};
use crate::features::input::LineEditor;
use crate::features::scrollback::{Scrollback, choice_at};

/// Scenes with at most this many choices select on a single digit keypress.
const QUICK_SELECT_MAX: usize = 9;

/// Maps a story-mode key onto a state machine input.
///
/// Enter is the advance signal once the outcome is on screen; otherwise it
/// submits the typed number. Non-numeric submissions are dropped.
pub fn handle_story_key(
    story: &StoryState,
    editor: &mut LineEditor,
    key: &KeyEvent,
) -> Option<StoryInput> {
    if story.awaiting_advance() {
        return matches!(key.code, KeyCode::Enter).then_some(StoryInput::Advance);
    }

    match key.code {
        KeyCode::Enter => editor.take().trim().parse().ok().map(StoryInput::Select),
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            let quick = story
                .active_choices()
                .is_some_and(|choices| choices.len() <= QUICK_SELECT_MAX);
            match ch.to_digit(10) {
                Some(digit) if quick => {
                    editor.take();
                    Some(StoryInput::Select(digit as usize))
                }
                _ => {
                    editor.insert_char(ch);
                    None
                }
            }
        }
        _ => {
            editor.input(key);
            None
        }
    }
}

/// Maps a left click on a choice line onto a selection.
pub fn handle_story_click(
    story: &StoryState,
    scrollback: &Scrollback,
    area: Rect,
    mouse: &MouseEvent,
) -> Option<StoryInput> {
    if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
        return None;
    }
    story.active_choices()?;
    choice_at(scrollback, area, mouse.column, mouse.row).map(StoryInput::Select)
}
