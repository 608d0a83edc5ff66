//! Feature slices.
//!
//! Each slice owns its state, update handlers and rendering.

pub mod input;
pub mod scrollback;
pub mod statusline;
pub mod story;
pub mod typing;
