//! Scene and outcome presentation.

use env0_types::Scene;

use crate::features::scrollback::{NewLine, Scrollback};
use crate::features::typing::{Animator, RevealId};

/// Output side of the story state machine.
pub trait StoryView {
    /// Clears the view and queues every line of `scene`. Returns the ticket
    /// of the last line.
    fn present_scene(&mut self, scene: &Scene) -> RevealId;

    /// Queues the outcome line. Returns its ticket.
    fn present_outcome(&mut self, outcome: &str) -> RevealId;
}

/// Text of the outcome line for `outcome`.
pub fn outcome_label(outcome: &str) -> String {
    match outcome.trim() {
        "" => "(press enter)".to_string(),
        trimmed => format!("{trimmed} (press enter)"),
    }
}

/// `StoryView` backed by the animator and scrollback.
pub struct ScenePresenter<'a> {
    pub animator: &'a mut Animator,
    pub scrollback: &'a mut Scrollback,
}

impl StoryView for ScenePresenter<'_> {
    fn present_scene(&mut self, scene: &Scene) -> RevealId {
        self.scrollback.clear();

        let intro = self.animator.config().scene_intro_delay();
        let padding = self.animator.config().scene_padding_lines;
        if !intro.is_zero() {
            self.animator.pause(intro);
        }
        for _ in 0..padding {
            self.animator.reveal(self.scrollback, NewLine::spacer());
        }
        for text in scene.text_lines() {
            self.animator
                .reveal(self.scrollback, NewLine::standard(text));
        }
        let mut last = self.animator.reveal(self.scrollback, NewLine::spacer());
        for (idx, choice) in scene.choices.iter().enumerate() {
            let index = idx + 1;
            last = self.animator.reveal_instant(
                self.scrollback,
                NewLine::choice(index, Scene::choice_line(index, choice)),
            );
        }
        last
    }

    fn present_outcome(&mut self, outcome: &str) -> RevealId {
        self.animator.reveal(self.scrollback, NewLine::spacer());
        self.animator
            .reveal(self.scrollback, NewLine::system(outcome_label(outcome)))
    }
}
