//! Input feature slice.
//!
//! The terminal prompt (line editor, command history, prompt decoration)
//! and the story choice input share this slice; which one is active follows
//! the current mode.

mod line_editor;
mod prompt;
mod render;
mod state;
mod update;

pub use line_editor::LineEditor;
pub use prompt::PromptInfo;
pub use render::render_input;
pub use state::InputState;
pub use update::{PromptCommand, handle_paste, handle_terminal_key};
