//! Story state machine.
//!
//! ```text
//! Idle ──scene──▶ RenderingScene ──last line revealed──▶ AwaitingChoice
//!                       ▲                                      │ valid choice
//!                       │                                      ▼
//!   PendingAdvance ◀──outcome revealed── Advancing ◀───────────┘
//!      │ buffered scene + advance
//!      └──────────────────▶ RenderingScene
//! ```
//!
//! At most one scene is buffered; a newer one replaces it.
//!
//! A scene that arrives before any outcome line gets a blank stand-in
//! outcome. The stand-in is `synthetic`: the first real outcome line that
//! follows is still shown and takes over the advance gate.

use env0_types::{Choice, Scene};

use super::view::StoryView;
use crate::features::typing::RevealId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoryState {
    #[default]
    Idle,
    /// Scene lines are being revealed. `last` is the ticket of the final line.
    RenderingScene {
        choices: Vec<Choice>,
        last: RevealId,
        pending: Option<Scene>,
    },
    /// Choices are on screen and selectable.
    AwaitingChoice { choices: Vec<Choice> },
    /// A choice was sent. `outcome` is set once the outcome line is queued.
    Advancing {
        outcome: Option<RevealId>,
        synthetic: bool,
        pending: Option<Scene>,
    },
    /// Outcome shown; waiting for both the next scene and the advance signal.
    PendingAdvance {
        pending: Option<Scene>,
        advance_requested: bool,
        synthetic: bool,
    },
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryInput {
    Scene(Scene),
    /// 1-based choice selection.
    Select(usize),
    /// A system line received while an outcome is expected.
    Outcome(String),
    Revealed(RevealId),
    Advance,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryAction {
    SendChoice { index: usize },
}

impl StoryState {
    /// Applies `input` in place and returns the requested actions.
    pub fn apply(&mut self, input: StoryInput, view: &mut impl StoryView) -> Vec<StoryAction> {
        let (next, actions) = std::mem::take(self).transition(input, view);
        *self = next;
        actions
    }

    /// Computes the next state for `input`.
    ///
    /// Every (state, input) pair is handled here; inputs that do not apply
    /// to the current state leave it unchanged.
    pub fn transition(
        self,
        input: StoryInput,
        view: &mut impl StoryView,
    ) -> (Self, Vec<StoryAction>) {
        use StoryInput as In;

        match (self, input) {
            (Self::Idle, In::Scene(scene)) => (Self::render(scene, view), Vec::new()),
            (state @ Self::Idle, _) => (state, Vec::new()),

            (Self::RenderingScene { choices, last, .. }, In::Scene(scene)) => (
                Self::RenderingScene {
                    choices,
                    last,
                    pending: Some(scene),
                },
                Vec::new(),
            ),
            (
                Self::RenderingScene {
                    choices,
                    last,
                    pending,
                },
                In::Revealed(id),
            ) if id == last => {
                let awaiting = Self::AwaitingChoice { choices };
                match pending {
                    Some(scene) => awaiting.transition(In::Scene(scene), view),
                    None => (awaiting, Vec::new()),
                }
            }
            (state @ Self::RenderingScene { .. }, _) => (state, Vec::new()),

            (Self::AwaitingChoice { choices }, In::Select(index))
                if (1..=choices.len()).contains(&index) =>
            {
                (
                    Self::Advancing {
                        outcome: None,
                        synthetic: false,
                        pending: None,
                    },
                    vec![StoryAction::SendChoice { index }],
                )
            }
            // Scene before any choice: show a blank outcome and gate on advance.
            (Self::AwaitingChoice { .. }, In::Scene(scene)) => {
                (Self::stand_in(scene, view), Vec::new())
            }
            (state @ Self::AwaitingChoice { .. }, _) => (state, Vec::new()),

            (Self::Advancing { outcome: None, pending, .. }, In::Outcome(text))
            | (
                Self::Advancing {
                    synthetic: true,
                    pending,
                    ..
                },
                In::Outcome(text),
            )
            | (
                Self::PendingAdvance {
                    synthetic: true,
                    pending,
                    ..
                },
                In::Outcome(text),
            ) => (Self::outcome(&text, pending, view), Vec::new()),
            (Self::Advancing { outcome: None, .. }, In::Scene(scene)) => {
                (Self::stand_in(scene, view), Vec::new())
            }
            (
                Self::Advancing {
                    outcome: Some(outcome),
                    synthetic,
                    ..
                },
                In::Scene(scene),
            ) => (
                Self::Advancing {
                    outcome: Some(outcome),
                    synthetic,
                    pending: Some(scene),
                },
                Vec::new(),
            ),
            (
                Self::Advancing {
                    outcome: Some(outcome),
                    synthetic,
                    pending,
                },
                In::Revealed(id),
            ) if id == outcome => Self::PendingAdvance {
                pending,
                advance_requested: false,
                synthetic,
            }
            .resolve(view),
            (state @ Self::Advancing { .. }, _) => (state, Vec::new()),

            (
                Self::PendingAdvance {
                    advance_requested,
                    synthetic,
                    ..
                },
                In::Scene(scene),
            ) => Self::PendingAdvance {
                pending: Some(scene),
                advance_requested,
                synthetic,
            }
            .resolve(view),
            (
                Self::PendingAdvance {
                    pending, synthetic, ..
                },
                In::Advance,
            ) => Self::PendingAdvance {
                pending,
                advance_requested: true,
                synthetic,
            }
            .resolve(view),
            (state @ Self::PendingAdvance { .. }, _) => (state, Vec::new()),
        }
    }

    /// Renders the buffered scene once it and the advance signal are both
    /// present.
    fn resolve(self, view: &mut impl StoryView) -> (Self, Vec<StoryAction>) {
        match self {
            Self::PendingAdvance {
                pending: Some(scene),
                advance_requested: true,
                ..
            } => (Self::render(scene, view), Vec::new()),
            state => (state, Vec::new()),
        }
    }

    fn render(scene: Scene, view: &mut impl StoryView) -> Self {
        let last = view.present_scene(&scene);
        Self::RenderingScene {
            choices: scene.choices,
            last,
            pending: None,
        }
    }

    /// Shows a real outcome line and gates on its ticket.
    fn outcome(text: &str, pending: Option<Scene>, view: &mut impl StoryView) -> Self {
        Self::Advancing {
            outcome: Some(view.present_outcome(text)),
            synthetic: false,
            pending,
        }
    }

    /// Shows a blank outcome for a scene that arrived ahead of one.
    fn stand_in(pending: Scene, view: &mut impl StoryView) -> Self {
        Self::Advancing {
            outcome: Some(view.present_outcome("")),
            synthetic: true,
            pending: Some(pending),
        }
    }

    /// Choices that can currently be selected.
    pub fn active_choices(&self) -> Option<&[Choice]> {
        match self {
            Self::AwaitingChoice { choices } => Some(choices),
            _ => None,
        }
    }

    /// Returns true if the next system line is the outcome.
    pub fn expects_outcome(&self) -> bool {
        matches!(
            self,
            Self::Advancing { outcome: None, .. }
                | Self::Advancing {
                    synthetic: true,
                    ..
                }
                | Self::PendingAdvance {
                    synthetic: true,
                    ..
                }
        )
    }

    /// Returns true once an outcome is on screen. Enter is the advance
    /// signal and plain lines are dropped.
    pub fn awaiting_advance(&self) -> bool {
        matches!(
            self,
            Self::Advancing {
                outcome: Some(_),
                ..
            } | Self::PendingAdvance { .. }
        )
    }

    pub fn is_rendering(&self) -> bool {
        matches!(self, Self::RenderingScene { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeView {
        next: u64,
        calls: Vec<String>,
    }

    impl FakeView {
        fn ticket(&mut self) -> RevealId {
            self.next += 1;
            RevealId::new(self.next)
        }

        fn last_ticket(&self) -> RevealId {
            RevealId::new(self.next)
        }
    }

    impl StoryView for FakeView {
        fn present_scene(&mut self, scene: &Scene) -> RevealId {
            self.calls.push(format!("scene:{}", scene.text));
            self.ticket()
        }

        fn present_outcome(&mut self, outcome: &str) -> RevealId {
            self.calls.push(format!("outcome:{outcome}"));
            self.ticket()
        }
    }

    fn scene(text: &str, labels: &[&str]) -> Scene {
        Scene {
            text: text.to_string(),
            choices: labels
                .iter()
                .map(|label| Choice {
                    label: (*label).to_string(),
                })
                .collect(),
        }
    }

    /// Drives Idle to AwaitingChoice for a three-choice scene.
    fn awaiting(view: &mut FakeView) -> StoryState {
        let mut state = StoryState::default();
        state.apply(StoryInput::Scene(scene("one", &["A", "B", "C"])), view);
        state.apply(StoryInput::Revealed(view.last_ticket()), view);
        state
    }

    #[test]
    fn test_scene_then_reveal_awaits_choice() {
        let mut view = FakeView::default();
        let state = awaiting(&mut view);
        assert_eq!(state.active_choices().map(<[Choice]>::len), Some(3));
        assert_eq!(view.calls, vec!["scene:one"]);
    }

    #[test]
    fn test_unrelated_reveal_does_not_finish_rendering() {
        let mut view = FakeView::default();
        let mut state = StoryState::default();
        state.apply(StoryInput::Scene(scene("one", &["A"])), &mut view);
        state.apply(StoryInput::Revealed(RevealId::new(999)), &mut view);
        assert!(state.is_rendering());
    }

    #[test]
    fn test_valid_choice_sends_once_and_locks() {
        let mut view = FakeView::default();
        let mut state = awaiting(&mut view);

        let actions = state.apply(StoryInput::Select(2), &mut view);
        assert_eq!(actions, vec![StoryAction::SendChoice { index: 2 }]);
        assert!(state.active_choices().is_none());
        assert!(state.expects_outcome());

        let again = state.apply(StoryInput::Select(2), &mut view);
        assert!(again.is_empty());
    }

    #[test]
    fn test_invalid_choices_are_noops() {
        let mut view = FakeView::default();
        let mut state = awaiting(&mut view);
        let before = state.clone();

        for index in [0, 4, 100] {
            assert!(state.apply(StoryInput::Select(index), &mut view).is_empty());
        }
        assert_eq!(state, before);

        let mut idle = StoryState::default();
        assert!(idle.apply(StoryInput::Select(1), &mut view).is_empty());
        assert_eq!(idle, StoryState::Idle);
    }

    #[test]
    fn test_outcome_then_scene_then_advance() {
        let mut view = FakeView::default();
        let mut state = awaiting(&mut view);
        state.apply(StoryInput::Select(1), &mut view);

        state.apply(StoryInput::Outcome("It opens.".to_string()), &mut view);
        assert!(state.awaiting_advance());
        state.apply(StoryInput::Revealed(view.last_ticket()), &mut view);
        assert!(matches!(state, StoryState::PendingAdvance { .. }));

        state.apply(StoryInput::Scene(scene("two", &["D"])), &mut view);
        assert!(matches!(
            state,
            StoryState::PendingAdvance {
                pending: Some(_),
                advance_requested: false,
                ..
            }
        ));
        assert_eq!(view.calls, vec!["scene:one", "outcome:It opens."]);

        state.apply(StoryInput::Advance, &mut view);
        assert!(state.is_rendering());
        assert_eq!(
            view.calls,
            vec!["scene:one", "outcome:It opens.", "scene:two"]
        );
    }

    #[test]
    fn test_advance_before_scene_renders_on_arrival() {
        let mut view = FakeView::default();
        let mut state = awaiting(&mut view);
        state.apply(StoryInput::Select(3), &mut view);
        state.apply(StoryInput::Outcome(String::new()), &mut view);
        state.apply(StoryInput::Revealed(view.last_ticket()), &mut view);

        state.apply(StoryInput::Advance, &mut view);
        assert!(matches!(
            state,
            StoryState::PendingAdvance {
                pending: None,
                advance_requested: true,
                ..
            }
        ));

        state.apply(StoryInput::Scene(scene("two", &[])), &mut view);
        assert!(state.is_rendering());
        assert_eq!(view.calls.last().map(String::as_str), Some("scene:two"));
    }

    #[test]
    fn test_advance_while_outcome_reveals_is_ignored() {
        let mut view = FakeView::default();
        let mut state = awaiting(&mut view);
        state.apply(StoryInput::Select(1), &mut view);
        state.apply(StoryInput::Outcome("x".to_string()), &mut view);

        state.apply(StoryInput::Advance, &mut view);
        state.apply(StoryInput::Revealed(view.last_ticket()), &mut view);
        assert!(matches!(
            state,
            StoryState::PendingAdvance {
                advance_requested: false,
                ..
            }
        ));
    }

    #[test]
    fn test_scene_before_outcome_gets_blank_outcome() {
        let mut view = FakeView::default();
        let mut state = awaiting(&mut view);
        state.apply(StoryInput::Select(1), &mut view);

        state.apply(StoryInput::Scene(scene("two", &["X"])), &mut view);
        assert_eq!(view.calls.last().map(String::as_str), Some("outcome:"));
        assert!(state.awaiting_advance());

        state.apply(StoryInput::Revealed(view.last_ticket()), &mut view);
        state.apply(StoryInput::Advance, &mut view);
        assert_eq!(view.calls.last().map(String::as_str), Some("scene:two"));
    }

    #[test]
    fn test_late_outcome_replaces_blank_outcome() {
        let mut view = FakeView::default();
        let mut state = awaiting(&mut view);
        state.apply(StoryInput::Select(1), &mut view);
        state.apply(StoryInput::Scene(scene("two", &["X"])), &mut view);
        let blank = view.last_ticket();
        state.apply(StoryInput::Revealed(blank), &mut view);
        assert!(state.expects_outcome());

        state.apply(StoryInput::Outcome("The door creaks.".to_string()), &mut view);
        assert_eq!(
            view.calls,
            vec!["scene:one", "outcome:", "outcome:The door creaks."]
        );
        assert!(!state.expects_outcome());

        // Gated on the real outcome, not the blank one.
        state.apply(StoryInput::Advance, &mut view);
        assert!(!state.is_rendering());
        state.apply(StoryInput::Revealed(view.last_ticket()), &mut view);
        state.apply(StoryInput::Advance, &mut view);
        assert_eq!(view.calls.last().map(String::as_str), Some("scene:two"));

        // Only the first real outcome counts.
        let mut view = FakeView::default();
        let mut state = awaiting(&mut view);
        state.apply(StoryInput::Select(1), &mut view);
        state.apply(StoryInput::Outcome("first".to_string()), &mut view);
        assert!(!state.expects_outcome());
    }

    #[test]
    fn test_late_outcome_while_blank_still_reveals() {
        let mut view = FakeView::default();
        let mut state = awaiting(&mut view);
        state.apply(StoryInput::Select(2), &mut view);
        state.apply(StoryInput::Scene(scene("two", &[])), &mut view);
        let blank = view.last_ticket();

        state.apply(StoryInput::Outcome("late".to_string()), &mut view);
        state.apply(StoryInput::Revealed(blank), &mut view);
        assert!(matches!(state, StoryState::Advancing { .. }));

        state.apply(StoryInput::Revealed(view.last_ticket()), &mut view);
        assert!(matches!(
            state,
            StoryState::PendingAdvance {
                pending: Some(_),
                synthetic: false,
                ..
            }
        ));
    }

    #[test]
    fn test_scene_while_awaiting_choice_is_gated() {
        let mut view = FakeView::default();
        let mut state = awaiting(&mut view);

        state.apply(StoryInput::Scene(scene("two", &[])), &mut view);
        assert!(state.awaiting_advance());
        assert_eq!(view.calls.last().map(String::as_str), Some("outcome:"));
    }

    #[test]
    fn test_scene_during_render_is_handled_after_render() {
        let mut view = FakeView::default();
        let mut state = StoryState::default();
        state.apply(StoryInput::Scene(scene("one", &["A"])), &mut view);
        let last = view.last_ticket();

        state.apply(StoryInput::Scene(scene("two", &[])), &mut view);
        state.apply(StoryInput::Scene(scene("three", &[])), &mut view);
        assert_eq!(view.calls, vec!["scene:one"]);

        state.apply(StoryInput::Revealed(last), &mut view);
        assert_eq!(view.calls, vec!["scene:one", "outcome:"]);
        state.apply(StoryInput::Revealed(view.last_ticket()), &mut view);
        state.apply(StoryInput::Advance, &mut view);

        // Last writer wins.
        assert_eq!(view.calls.last().map(String::as_str), Some("scene:three"));
    }

    #[test]
    fn test_advance_outside_pending_is_ignored() {
        let mut view = FakeView::default();
        let mut state = awaiting(&mut view);
        let before = state.clone();
        state.apply(StoryInput::Advance, &mut view);
        assert_eq!(state, before);
    }
}
