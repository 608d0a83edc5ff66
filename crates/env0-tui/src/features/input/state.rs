//! User input state.
//!
//! Holds both editors, the prompt decoration and command history.

use super::line_editor::LineEditor;
use super::prompt::PromptInfo;

#[derive(Debug, Default)]
pub struct InputState {
    /// Terminal prompt editor.
    pub editor: LineEditor,
    /// Story choice editor.
    pub story_editor: LineEditor,
    pub prompt: PromptInfo,

    /// Submitted lines for ↑/↓ navigation, oldest first.
    pub history: Vec<String>,
    /// Current position in history (None = not navigating).
    pub history_index: Option<usize>,
    /// Draft text saved when navigation started.
    pub draft: Option<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a submitted line and resets navigation.
    pub fn push_history(&mut self, entry: &str) {
        self.history.push(entry.to_string());
        self.reset_navigation();
    }

    /// Resets history navigation state.
    pub fn reset_navigation(&mut self) {
        self.history_index = None;
        self.draft = None;
    }

    /// Navigates up in command history.
    pub fn navigate_up(&mut self) {
        if self.history.is_empty() {
            return;
        }

        if self.history_index.is_none() {
            self.draft = Some(self.editor.text().to_string());
            self.history_index = Some(self.history.len() - 1);
        } else if let Some(idx) = self.history_index
            && idx > 0
        {
            self.history_index = Some(idx - 1);
        }

        if let Some(idx) = self.history_index
            && let Some(entry) = self.history.get(idx)
        {
            self.editor.set_text(entry);
        }
    }

    /// Navigates down in command history, restoring the draft past the
    /// newest entry.
    pub fn navigate_down(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };

        if idx + 1 < self.history.len() {
            self.history_index = Some(idx + 1);
            if let Some(entry) = self.history.get(idx + 1) {
                self.editor.set_text(entry);
            }
        } else {
            let draft = self.draft.take().unwrap_or_default();
            self.history_index = None;
            self.editor.set_text(&draft);
        }
    }
}
