//! Wire types shared between the env0 client crates.
//!
//! - `line`: line kinds as rendered in the scrollback
//! - `protocol`: inbound/outbound message shapes and lenient decoding

pub mod line;
pub mod protocol;

pub use line::LineKind;
pub use protocol::{
    Choice, ClientMessage, ControlAction, Inbound, LinePayload, Mode, PromptPayload, Scene,
    ServerMessage,
};
