//! Input feature reducer.
//!
//! Handles terminal-prompt keys and paste. Anything that touches the
//! scrollback or the backend is returned as a `PromptCommand` for the main
//! reducer to carry out.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::line_editor::LineEditor;
use super::state::InputState;
use crate::common::sanitize_for_display;

/// Requests produced by the terminal prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    /// Echo `echo` into the scrollback and send `text` upstream.
    Submit { echo: String, text: String },
    /// Clear the scrollback and ask the backend to clear.
    Clear,
    /// Show `^C` and ask the backend to interrupt.
    Interrupt,
}

/// Handles a key for the terminal prompt.
pub fn handle_terminal_key(input: &mut InputState, key: &KeyEvent) -> Option<PromptCommand> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => submit(input),
        KeyCode::Up => {
            input.navigate_up();
            None
        }
        KeyCode::Down => {
            input.navigate_down();
            None
        }
        KeyCode::Char('l' | 'L') if ctrl => Some(PromptCommand::Clear),
        KeyCode::Char('c' | 'C') if ctrl => Some(PromptCommand::Interrupt),
        _ => {
            input.editor.input(key);
            None
        }
    }
}

/// Inserts pasted text into `editor`.
pub fn handle_paste(editor: &mut LineEditor, text: &str) {
    editor.insert_str(&sanitize_for_display(text));
}

fn submit(input: &mut InputState) -> Option<PromptCommand> {
    if input.editor.text().trim().is_empty() {
        return None;
    }
    let text = input.editor.take();
    input.push_history(&text);
    Some(PromptCommand::Submit {
        echo: format!("{}{text}", input.prompt.render()),
        text,
    })
}
