//! Status line feature slice.
//!
//! One row under the input showing connection state, mode and the typing
//! toggle, plus the "jump to latest" indicator while the scrollback is not
//! following output.

mod render;

pub use render::{JUMP_LABEL, jump_indicator_area, render_status_line};
