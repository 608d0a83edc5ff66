//! Story feature slice.
//!
//! `StoryState` is the scene/choice/outcome state machine; `view` renders
//! scenes and outcomes through the typing animator; `update` maps story-mode
//! keys and clicks onto state machine inputs.

mod state;
mod update;
mod view;

pub use state::{StoryAction, StoryInput, StoryState};
pub use update::{handle_story_click, handle_story_key};
pub use view::{ScenePresenter, StoryView, outcome_label};
