//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use env0_core::transport::TransportEvent;
use env0_types::{ClientMessage, ControlAction, Inbound, LinePayload, Mode, ServerMessage};
use ratatui::layout::{Position, Rect};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::features::input::{self, PromptCommand, PromptInfo};
use crate::features::scrollback::{self, NewLine};
use crate::features::statusline;
use crate::features::story::{self, ScenePresenter, StoryAction, StoryInput};
use crate::render;
use crate::state::{AppState, ConnectionStatus};

pub const CONNECTED_LINE: &str = "connected to env0 backend";
pub const DISCONNECTED_LINE: &str = "disconnected - retrying shortly";
pub const CONNECTION_ERROR_LINE: &str = "connection error";
pub const MALFORMED_LINE: &str = "malformed message ignored";

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    let mut effects = match event {
        UiEvent::Tick { now } => {
            app.animator.tick(now, &mut app.scrollback);
            app.scrollback.flush();
            Vec::new()
        }
        UiEvent::Frame { width, height } => {
            handle_frame(app, width, height);
            Vec::new()
        }
        UiEvent::Terminal(event) => handle_terminal_event(app, event),
        UiEvent::Transport(event) => handle_transport_event(app, event),
    };
    effects.extend(drain_reveals(app));
    effects
}

fn handle_frame(app: &mut AppState, width: u16, height: u16) {
    app.layout = render::layout(Rect::new(0, 0, width, height));
    app.scrollback.set_viewport(
        usize::from(app.layout.scrollback.width),
        usize::from(app.layout.scrollback.height),
    );
}

/// Feeds finished reveals to the story state machine until none are left.
///
/// A transition may queue more lines, which complete at once when
/// animation is off, hence the loop.
fn drain_reveals(app: &mut AppState) -> Vec<UiEffect> {
    let mut effects = Vec::new();
    loop {
        let completed = app.animator.take_completed();
        if completed.is_empty() {
            return effects;
        }
        // Lines the story is waiting on must be on screen before it moves
        // on, or a choice could be taken before it is visible.
        if app.story.is_rendering() || app.story.awaiting_advance() {
            app.scrollback.flush();
        }
        for id in completed {
            effects.extend(apply_story(app, StoryInput::Revealed(id)));
        }
    }
}

fn apply_story(app: &mut AppState, input: StoryInput) -> Vec<UiEffect> {
    let was_rendering = app.story.is_rendering();
    let mut view = ScenePresenter {
        animator: &mut app.animator,
        scrollback: &mut app.scrollback,
    };
    let actions = app.story.apply(input, &mut view);
    if app.story.is_rendering() && !was_rendering {
        app.input.story_editor.take();
    }
    actions
        .into_iter()
        .map(|action| match action {
            StoryAction::SendChoice { index } => UiEffect::Send(ClientMessage::Choice { index }),
        })
        .collect()
}

/// Queues a line through the animator.
fn present(app: &mut AppState, line: NewLine) {
    app.animator.reveal(&mut app.scrollback, line);
}

// ============================================================================
// Transport Events
// ============================================================================

fn handle_transport_event(app: &mut AppState, event: TransportEvent) -> Vec<UiEffect> {
    match event {
        TransportEvent::Connected => {
            app.connection = ConnectionStatus::Online;
            present(app, NewLine::system(CONNECTED_LINE));
            Vec::new()
        }
        TransportEvent::Error { message } => {
            tracing::debug!(%message, "transport error");
            present(app, NewLine::error(CONNECTION_ERROR_LINE));
            Vec::new()
        }
        TransportEvent::Disconnected => {
            app.connection = ConnectionStatus::Offline;
            present(app, NewLine::error(DISCONNECTED_LINE));
            Vec::new()
        }
        TransportEvent::Frame(Inbound::Message(message)) => handle_server_message(app, message),
        TransportEvent::Frame(Inbound::Ignored) => Vec::new(),
        TransportEvent::Frame(Inbound::Malformed { .. }) => {
            present(app, NewLine::error(MALFORMED_LINE));
            Vec::new()
        }
    }
}

fn handle_server_message(app: &mut AppState, message: ServerMessage) -> Vec<UiEffect> {
    match message {
        ServerMessage::Mode { value } => {
            app.mode = Mode::from_wire(value.as_deref());
            tracing::debug!(mode = ?app.mode, "mode switched");
            Vec::new()
        }
        ServerMessage::Prompt(payload) => {
            app.input.prompt = PromptInfo::from_payload(&payload);
            Vec::new()
        }
        ServerMessage::Line(payload) => handle_line(app, &payload),
        ServerMessage::Lines { items } => items
            .iter()
            .flatten()
            .flat_map(|payload| handle_line(app, payload))
            .collect(),
        ServerMessage::Clear => {
            app.scrollback.clear();
            Vec::new()
        }
        ServerMessage::Err { message } => {
            let text = message
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| "error".to_string());
            present(app, NewLine::error(text));
            Vec::new()
        }
        ServerMessage::Scene(scene) => {
            app.mode = Mode::Story;
            apply_story(app, StoryInput::Scene(scene))
        }
        ServerMessage::Unknown => Vec::new(),
    }
}

fn handle_line(app: &mut AppState, payload: &LinePayload) -> Vec<UiEffect> {
    if payload.partial {
        if !app.scrollback.update_last(payload.text(), payload.kind) {
            present(
                app,
                NewLine::new(payload.text(), payload.kind_or_default()),
            );
        }
        return Vec::new();
    }

    let kind = payload.kind_or_default();
    if app.mode.is_story() {
        if kind.is_system() && app.story.expects_outcome() {
            return apply_story(app, StoryInput::Outcome(payload.text().to_string()));
        }
        if app.story.awaiting_advance() {
            tracing::trace!(text = payload.text(), "dropping line while awaiting advance");
            return Vec::new();
        }
    }
    present(app, NewLine::new(payload.text(), kind));
    Vec::new()
}

// ============================================================================
// Terminal Events
// ============================================================================

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) => handle_key(app, &key),
        Event::Mouse(mouse) => handle_mouse(app, &mouse),
        Event::Paste(text) => {
            if app.connection.is_online() {
                let editor = if app.mode.is_story() {
                    &mut app.input.story_editor
                } else {
                    &mut app.input.editor
                };
                input::handle_paste(editor, &text);
            }
            Vec::new()
        }
        // Resize is picked up by the next Frame event.
        _ => Vec::new(),
    }
}

fn handle_key(app: &mut AppState, key: &KeyEvent) -> Vec<UiEffect> {
    if matches!(key.kind, KeyEventKind::Release) {
        return Vec::new();
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q' | 'Q') if ctrl => {
            app.should_quit = true;
            return vec![UiEffect::Quit];
        }
        KeyCode::F(2) => {
            let enabled = !app.animator.is_enabled();
            app.animator.set_enabled(enabled, &mut app.scrollback);
            tracing::debug!(enabled, "typing effect toggled");
            return Vec::new();
        }
        KeyCode::PageUp | KeyCode::PageDown => {
            scrollback::handle_scroll_key(&mut app.scrollback, key);
            return Vec::new();
        }
        // End also moves the editor cursor below.
        KeyCode::End => app.scrollback.jump_to_latest(),
        _ => {}
    }

    if !app.connection.is_online() {
        return Vec::new();
    }

    if app.mode.is_story() {
        return match story::handle_story_key(&app.story, &mut app.input.story_editor, key) {
            Some(input) => apply_story(app, input),
            None => Vec::new(),
        };
    }

    match input::handle_terminal_key(&mut app.input, key) {
        Some(PromptCommand::Submit { echo, text }) => {
            present(app, NewLine::standard(echo));
            vec![UiEffect::Send(ClientMessage::Input { text })]
        }
        Some(PromptCommand::Clear) => {
            app.scrollback.clear();
            vec![UiEffect::Send(ClientMessage::Control {
                action: ControlAction::Clear,
            })]
        }
        Some(PromptCommand::Interrupt) => {
            present(app, NewLine::system("^C"));
            vec![UiEffect::Send(ClientMessage::Control {
                action: ControlAction::Interrupt,
            })]
        }
        None => Vec::new(),
    }
}

fn handle_mouse(app: &mut AppState, mouse: &MouseEvent) -> Vec<UiEffect> {
    if scrollback::handle_mouse_scroll(&mut app.scrollback, mouse) {
        return Vec::new();
    }
    if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
        return Vec::new();
    }

    let position = Position::new(mouse.column, mouse.row);
    if !app.scrollback.scroll.is_following()
        && statusline::jump_indicator_area(app.layout.status).contains(position)
    {
        app.scrollback.jump_to_latest();
        return Vec::new();
    }

    if !app.connection.is_online() || !app.mode.is_story() {
        return Vec::new();
    }
    match story::handle_story_click(&app.story, &app.scrollback, app.layout.scrollback, mouse) {
        Some(input) => apply_story(app, input),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use env0_core::config::Config;
    use env0_types::LineKind;
    use serde_json::json;

    use super::*;

    fn app(typing: bool) -> AppState {
        let mut config = Config::default();
        config.typing.enabled = typing;
        let mut app = AppState::new(&config);
        update(&mut app, UiEvent::Frame { width: 80, height: 24 });
        update(&mut app, UiEvent::Transport(TransportEvent::Connected));
        // Let the greeting finish typing.
        let start = Instant::now();
        update(&mut app, UiEvent::Tick { now: start });
        update(&mut app, UiEvent::Tick {
            now: start + Duration::from_secs(60),
        });
        app
    }

    fn recv(app: &mut AppState, value: serde_json::Value) -> Vec<UiEffect> {
        recv_raw(app, &value.to_string())
    }

    fn recv_raw(app: &mut AppState, raw: &str) -> Vec<UiEffect> {
        update(
            app,
            UiEvent::Transport(TransportEvent::Frame(Inbound::decode(raw))),
        )
    }

    fn press(app: &mut AppState, code: KeyCode) -> Vec<UiEffect> {
        update(
            app,
            UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE))),
        )
    }

    fn ctrl(app: &mut AppState, ch: char) -> Vec<UiEffect> {
        update(
            app,
            UiEvent::Terminal(Event::Key(KeyEvent::new(
                KeyCode::Char(ch),
                KeyModifiers::CONTROL,
            ))),
        )
    }

    fn tick(app: &mut AppState) {
        update(app, UiEvent::Tick { now: Instant::now() });
    }

    fn texts(app: &AppState) -> Vec<String> {
        app.scrollback.lines().map(|line| line.text.clone()).collect()
    }

    fn scene(text: &str, choices: &[&str]) -> serde_json::Value {
        json!({"t": "story", "text": text, "choices": choices})
    }

    fn choice(index: usize) -> UiEffect {
        UiEffect::Send(ClientMessage::Choice { index })
    }

    #[test]
    fn test_connection_lines() {
        let mut app = app(false);
        update(&mut app, UiEvent::Transport(TransportEvent::Error {
            message: "refused".to_string(),
        }));
        update(&mut app, UiEvent::Transport(TransportEvent::Disconnected));
        tick(&mut app);

        assert_eq!(
            texts(&app),
            vec![CONNECTED_LINE, CONNECTION_ERROR_LINE, DISCONNECTED_LINE]
        );
        let kinds: Vec<LineKind> = app.scrollback.lines().map(|line| line.kind).collect();
        assert_eq!(kinds, vec![LineKind::System, LineKind::Error, LineKind::Error]);
        assert!(!app.connection.is_online());
    }

    #[test]
    fn test_appends_beyond_capacity_keep_latest() {
        let mut app = app(false);
        ctrl(&mut app, 'l');
        for i in 0..1050 {
            recv(&mut app, json!({"t": "line", "text": format!("line {i}")}));
        }
        tick(&mut app);

        let all = texts(&app);
        assert_eq!(all.len(), 1000);
        assert_eq!(all[0], "line 50");
        assert_eq!(all[999], "line 1049");
    }

    #[test]
    fn test_partial_update_mutates_last_line() {
        let mut app = app(false);
        recv(&mut app, json!({"t": "line", "text": "progress 1"}));
        tick(&mut app);
        let before = app.scrollback.len();

        recv(&mut app, json!({"t": "line", "text": "progress 2", "partial": true}));
        recv(
            &mut app,
            json!({"t": "lines", "items": [{"text": "progress 3", "partial": true}, null]}),
        );
        assert_eq!(app.scrollback.len(), before);
        assert_eq!(texts(&app).last().map(String::as_str), Some("progress 3"));
    }

    #[test]
    fn test_partial_on_empty_buffer_appends() {
        let mut app = app(false);
        recv(&mut app, json!({"t": "clear"}));
        recv(&mut app, json!({"t": "line", "text": "first", "partial": true}));
        tick(&mut app);
        assert_eq!(texts(&app), vec!["first"]);
    }

    #[test]
    fn test_malformed_frame_renders_one_error_line() {
        let mut app = app(false);
        recv(&mut app, json!({"t": "clear"}));
        recv_raw(&mut app, "{oops");
        recv_raw(&mut app, r#"{"t":"bogus"}"#);
        recv_raw(&mut app, "[1,2]");
        tick(&mut app);

        assert_eq!(texts(&app), vec![MALFORMED_LINE]);
        assert_eq!(app.scrollback.last().map(|line| line.kind), Some(LineKind::Error));
    }

    #[test]
    fn test_err_message_defaults() {
        let mut app = app(false);
        recv(&mut app, json!({"t": "clear"}));
        recv(&mut app, json!({"t": "err"}));
        recv(&mut app, json!({"t": "err", "message": "no such file"}));
        tick(&mut app);
        assert_eq!(texts(&app), vec!["error", "no such file"]);
    }

    #[test]
    fn test_submit_echoes_and_sends() {
        let mut app = app(false);
        recv(&mut app, json!({"t": "prompt", "user": "ada", "host": "lab", "cwd": "~"}));
        for ch in "ls".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        let effects = press(&mut app, KeyCode::Enter);
        tick(&mut app);

        assert_eq!(
            effects,
            vec![UiEffect::Send(ClientMessage::Input {
                text: "ls".to_string()
            })]
        );
        assert_eq!(texts(&app).last().map(String::as_str), Some("ada@lab:~$ ls"));
    }

    #[test]
    fn test_control_shortcuts() {
        let mut app = app(false);
        tick(&mut app);

        let effects = ctrl(&mut app, 'c');
        tick(&mut app);
        assert_eq!(
            effects,
            vec![UiEffect::Send(ClientMessage::Control {
                action: ControlAction::Interrupt
            })]
        );
        assert_eq!(texts(&app).last().map(String::as_str), Some("^C"));

        let effects = ctrl(&mut app, 'l');
        assert_eq!(
            effects,
            vec![UiEffect::Send(ClientMessage::Control {
                action: ControlAction::Clear
            })]
        );
        assert!(app.scrollback.is_empty());

        assert_eq!(ctrl(&mut app, 'q'), vec![UiEffect::Quit]);
        assert!(app.should_quit);
    }

    #[test]
    fn test_input_disabled_offline() {
        let mut app = app(false);
        update(&mut app, UiEvent::Transport(TransportEvent::Disconnected));
        press(&mut app, KeyCode::Char('x'));
        assert!(press(&mut app, KeyCode::Enter).is_empty());
        assert!(app.input.editor.is_empty());
    }

    #[test]
    fn test_mode_switch() {
        let mut app = app(false);
        recv(&mut app, json!({"t": "mode", "value": "story"}));
        assert_eq!(app.mode, Mode::Story);
        recv(&mut app, json!({"t": "mode", "value": "shell"}));
        assert_eq!(app.mode, Mode::Terminal);
    }

    #[test]
    fn test_scene_renders_and_choice_sends_once() {
        let mut app = app(false);
        recv(&mut app, scene("A fork.", &["Left", "Middle", "Right"]));
        tick(&mut app);
        assert_eq!(app.mode, Mode::Story);
        assert_eq!(
            texts(&app),
            vec![" ", " ", "A fork.", " ", "1) Left", "2) Middle", "3) Right"]
        );
        let choices: Vec<Option<usize>> = app.scrollback.lines().map(|line| line.choice).collect();
        assert_eq!(choices[4..], [Some(1), Some(2), Some(3)]);

        assert_eq!(press(&mut app, KeyCode::Char('2')), vec![choice(2)]);
        assert!(press(&mut app, KeyCode::Char('2')).is_empty());
        assert!(press(&mut app, KeyCode::Char('1')).is_empty());
    }

    #[test]
    fn test_out_of_range_choice_is_silent() {
        let mut app = app(false);
        recv(&mut app, scene("A fork.", &["Left", "Right"]));
        tick(&mut app);
        let before = texts(&app);

        assert!(press(&mut app, KeyCode::Char('5')).is_empty());
        assert!(press(&mut app, KeyCode::Char('0')).is_empty());
        tick(&mut app);
        assert_eq!(texts(&app), before);
        assert_eq!(press(&mut app, KeyCode::Char('1')), vec![choice(1)]);
    }

    #[test]
    fn test_click_selects_choice() {
        let mut app = app(false);
        recv(&mut app, scene("Pick.", &["Up", "Down"]));
        tick(&mut app);

        // Content is bottom-aligned: the last scrollback row is "2) Down".
        let area = app.layout.scrollback;
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: area.x + 1,
            row: area.y + area.height - 1,
            modifiers: KeyModifiers::NONE,
        };
        let effects = update(&mut app, UiEvent::Terminal(Event::Mouse(click)));
        assert_eq!(effects, vec![choice(2)]);
    }

    #[test]
    fn test_buffered_scene_waits_for_advance() {
        let mut app = app(false);
        recv(&mut app, scene("Room one", &["Go", "Stay"]));
        tick(&mut app);
        assert_eq!(press(&mut app, KeyCode::Char('1')), vec![choice(1)]);

        recv(&mut app, json!({"t": "line", "text": "You go.", "type": "system"}));
        recv(&mut app, json!({"t": "line", "text": "noise"}));
        recv(&mut app, scene("Room two", &["Onward"]));
        tick(&mut app);

        let shown = texts(&app);
        assert_eq!(shown.last().map(String::as_str), Some("You go. (press enter)"));
        assert!(!shown.iter().any(|text| text == "Room two" || text == "noise"));

        assert!(press(&mut app, KeyCode::Enter).is_empty());
        tick(&mut app);
        assert_eq!(texts(&app), vec![" ", " ", "Room two", " ", "1) Onward"]);
        assert_eq!(press(&mut app, KeyCode::Char('1')), vec![choice(1)]);
    }

    #[test]
    fn test_advance_before_scene() {
        let mut app = app(false);
        recv(&mut app, scene("Room one", &["Go"]));
        press(&mut app, KeyCode::Char('1'));
        recv(&mut app, json!({"t": "line", "text": "", "type": "SYSTEM"}));
        tick(&mut app);
        assert_eq!(texts(&app).last().map(String::as_str), Some("(press enter)"));

        press(&mut app, KeyCode::Enter);
        recv(&mut app, scene("Room two", &[]));
        tick(&mut app);
        assert_eq!(texts(&app), vec![" ", " ", "Room two", " "]);
    }

    #[test]
    fn test_scene_before_outcome_shows_blank_outcome() {
        let mut app = app(false);
        recv(&mut app, scene("Room one", &["Go"]));
        press(&mut app, KeyCode::Char('1'));
        recv(&mut app, scene("Room two", &["Next"]));
        tick(&mut app);
        assert_eq!(texts(&app).last().map(String::as_str), Some("(press enter)"));

        press(&mut app, KeyCode::Enter);
        tick(&mut app);
        assert_eq!(texts(&app)[2], "Room two");
    }

    #[test]
    fn test_late_outcome_after_scene_is_shown() {
        let mut app = app(false);
        recv(&mut app, scene("Room one", &["Go"]));
        assert_eq!(press(&mut app, KeyCode::Char('1')), vec![choice(1)]);
        recv(&mut app, scene("Room two", &["Next"]));
        recv(
            &mut app,
            json!({"t": "line", "text": "The door creaks open.", "type": "system"}),
        );
        tick(&mut app);

        let shown = texts(&app);
        assert_eq!(
            shown.last().map(String::as_str),
            Some("The door creaks open. (press enter)")
        );
        assert!(!shown.iter().any(|text| text == "Room two"));

        press(&mut app, KeyCode::Enter);
        tick(&mut app);
        assert_eq!(texts(&app), vec![" ", " ", "Room two", " ", "1) Next"]);
    }

    #[test]
    fn test_scene_is_committed_before_choices_open() {
        let mut app = app(false);
        recv(&mut app, scene("A fork.", &["Left", "Right"]));

        // No tick in between: the choices must already be on screen.
        assert!(!app.scrollback.has_pending());
        assert_eq!(texts(&app).last().map(String::as_str), Some("2) Right"));
        assert!(app.story.active_choices().is_some());
        assert_eq!(press(&mut app, KeyCode::Char('2')), vec![choice(2)]);
    }

    #[test]
    fn test_terminal_lines_stay_batched_until_tick() {
        let mut app = app(false);
        let before = app.scrollback.len();
        recv(&mut app, json!({"t": "line", "text": "one"}));
        recv(&mut app, json!({"t": "line", "text": "two"}));
        assert_eq!(app.scrollback.len(), before);
        assert!(app.scrollback.has_pending());

        tick(&mut app);
        assert_eq!(app.scrollback.len(), before + 2);
    }

    #[test]
    fn test_system_line_outside_outcome_is_plain() {
        let mut app = app(false);
        recv(&mut app, scene("Room", &["Go"]));
        recv(&mut app, json!({"t": "line", "text": "a clock ticks", "type": "system"}));
        tick(&mut app);
        assert_eq!(texts(&app).last().map(String::as_str), Some("a clock ticks"));
    }

    #[test]
    fn test_story_waits_for_typed_scene() {
        let mut app = app(true);
        let t0 = Instant::now();
        recv(&mut app, scene("Hi", &["Go"]));
        update(&mut app, UiEvent::Tick { now: t0 });

        // Still revealing: choices are not selectable yet.
        assert!(press(&mut app, KeyCode::Char('1')).is_empty());

        update(&mut app, UiEvent::Tick {
            now: t0 + Duration::from_secs(5),
        });
        assert_eq!(texts(&app), vec![" ", " ", "Hi", " ", "1) Go"]);
        assert_eq!(press(&mut app, KeyCode::Char('1')), vec![choice(1)]);
    }

    #[test]
    fn test_toggle_typing_completes_queue() {
        let mut app = app(true);
        let t0 = Instant::now();
        recv(&mut app, scene("Hi", &["Go"]));
        update(&mut app, UiEvent::Tick { now: t0 });

        press(&mut app, KeyCode::F(2));
        assert!(!app.animator.is_enabled());
        assert!(!app.animator.is_busy());
        assert_eq!(texts(&app), vec![" ", " ", "Hi", " ", "1) Go"]);
        assert_eq!(press(&mut app, KeyCode::Char('1')), vec![choice(1)]);
    }

    #[test]
    fn test_jump_indicator_click() {
        let mut app = app(false);
        for i in 0..100 {
            recv(&mut app, json!({"t": "line", "text": i.to_string()}));
        }
        tick(&mut app);
        press(&mut app, KeyCode::PageUp);
        assert!(!app.scrollback.scroll.is_following());

        let indicator = statusline::jump_indicator_area(app.layout.status);
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: indicator.x,
            row: indicator.y,
            modifiers: KeyModifiers::NONE,
        };
        update(&mut app, UiEvent::Terminal(Event::Mouse(click)));
        assert!(app.scrollback.scroll.is_following());
    }
}
