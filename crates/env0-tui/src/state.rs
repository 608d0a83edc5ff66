//! Application state.
//!
//! ```text
//! AppState
//! ├── mode: Mode                 (terminal or story input surface)
//! ├── connection: ConnectionStatus
//! ├── scrollback: Scrollback     (bounded lines, scroll position)
//! ├── animator: Animator         (typing reveal queue)
//! ├── story: StoryState          (scene/choice/outcome state machine)
//! ├── input: InputState          (editors, prompt, history)
//! └── layout: AppLayout          (areas from the last frame, for hit-testing)
//! ```

use env0_core::config::Config;
use env0_types::Mode;

use crate::features::input::InputState;
use crate::features::scrollback::Scrollback;
use crate::features::story::StoryState;
use crate::features::typing::Animator;
use crate::render::AppLayout;

/// Backend connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Offline,
    Online,
}

impl ConnectionStatus {
    pub fn is_online(self) -> bool {
        matches!(self, ConnectionStatus::Online)
    }
}

pub struct AppState {
    pub should_quit: bool,
    pub mode: Mode,
    pub connection: ConnectionStatus,
    pub scrollback: Scrollback,
    pub animator: Animator,
    pub story: StoryState,
    pub input: InputState,
    pub layout: AppLayout,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            should_quit: false,
            mode: Mode::default(),
            connection: ConnectionStatus::default(),
            scrollback: Scrollback::new(config.scrollback.max_lines),
            animator: Animator::new(config.typing.clone()),
            story: StoryState::default(),
            input: InputState::new(),
            layout: AppLayout::default(),
        }
    }

    /// Returns true while there is visual work pending (animation or
    /// batched appends), so the runtime should tick at full rate.
    pub fn is_animating(&self) -> bool {
        self.animator.is_busy() || self.scrollback.has_pending()
    }
}
