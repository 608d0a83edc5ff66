//! Shared helpers used across feature slices.

pub mod text;

pub use text::{sanitize_for_display, wrap_line};
