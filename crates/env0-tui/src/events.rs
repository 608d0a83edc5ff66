//! UI event types.
//!
//! Every external input (terminal, transport, clock) is converted to a
//! `UiEvent` before it reaches the reducer.

use std::time::Instant;

use crossterm::event::Event as CrosstermEvent;
use env0_core::transport::TransportEvent;

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Periodic tick. Advances the typing animator and flushes batched
    /// scrollback appends.
    Tick { now: Instant },
    /// Current terminal size, emitted before each batch of events.
    Frame { width: u16, height: u16 },
    /// Raw terminal input.
    Terminal(CrosstermEvent),
    /// Connection state change or inbound frame.
    Transport(TransportEvent),
}
