//! Typing animator feature.
//!
//! Reveals lines one grapheme at a time on top of the scrollback. Exactly one
//! task runs at a time; completions are reported as `RevealId`s in FIFO
//! order and drained by the reducer.

mod animator;

pub use animator::{Animator, RevealId};
