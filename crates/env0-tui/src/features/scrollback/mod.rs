//! Scrollback feature slice.
//!
//! Owns the bounded line buffer, its scroll position and rendering. Lines
//! reach the buffer either batched (`append`, committed on the next tick) or
//! immediately (`commit`, used by the typing animator).

mod render;
mod state;
mod update;

pub use render::{choice_at, render_scrollback};
pub use state::{
    LineId, LineRecord, NEAR_BOTTOM_ROWS, NewLine, ScrollMode, ScrollState, Scrollback,
};
pub use update::{handle_mouse_scroll, handle_scroll_key};
