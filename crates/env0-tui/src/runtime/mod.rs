//! TUI runtime: owns the terminal, runs the event loop, executes effects.
//!
//! This is the side-effect boundary. The reducer in `update` produces
//! `UiEffect`s; only this module writes to the terminal or the transport.
//!
//! Transport events arrive on the handle's unbounded receiver, which acts as
//! the inbox: it is drained in arrival order once per loop iteration.

use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use env0_core::config::Config;
use env0_core::transport::TransportHandle;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Tick cadence while something is animating (~60fps).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll duration when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Full-screen TUI runtime.
///
/// Terminal state is restored on drop and on panic.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    transport: TransportHandle,
    /// Last time a Tick event was emitted.
    last_tick: Instant,
    /// Last terminal input, for fast ticking during interaction.
    last_terminal_event: Instant,
}

impl TuiRuntime {
    /// Sets up the terminal and the initial state.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be configured.
    pub fn new(config: &Config, transport: TransportHandle) -> Result<Self> {
        // Panic hook goes in before the alternate screen.
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let now = Instant::now();
        Ok(Self {
            terminal,
            state: AppState::new(config),
            transport,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs the main event loop until the user quits.
    ///
    /// # Errors
    /// Returns an error if terminal I/O fails.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;
        let result = self.event_loop();
        let _ = terminal::disable_input_features();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let mut events = self.collect_events()?;

            // Layout updates go first so hit-testing sees the current size.
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }
                // Only Tick renders; this caps the frame rate at tick cadence.
                if matches!(&event, UiEvent::Tick { .. }) {
                    dirty = true;
                }
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| render::render(&self.state, frame))?;
                dirty = false;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let tick_interval = if self.state.is_animating() || recent_terminal_activity {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        self.collect_transport_events(&mut events);

        // Block until the next tick is due unless there is already work.
        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            let now = Instant::now();
            events.push(UiEvent::Tick { now });
            self.last_tick = now;
        }

        Ok(events)
    }

    /// Drains pending transport events in arrival order.
    fn collect_transport_events(&mut self, events: &mut Vec<UiEvent>) {
        while let Ok(event) = self.transport.events.try_recv() {
            events.push(UiEvent::Transport(event));
        }
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            match effect {
                UiEffect::Quit => self.state.should_quit = true,
                UiEffect::Send(message) => {
                    if !self.transport.outbox.send(message) {
                        tracing::warn!("transport stopped, outbound message dropped");
                    }
                }
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}
