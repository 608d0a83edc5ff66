//! Backend message protocol.
//!
//! Every frame is a JSON object tagged by `t`. Decoding is lenient: missing
//! fields and explicit nulls take defaults, unknown tags and untagged values
//! are ignored, and only payloads that are not JSON at all (or carry
//! mistyped fields) are reported as malformed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::line::LineKind;

/// Reads an explicit `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Active input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Terminal,
    Story,
}

impl Mode {
    /// `"story"` selects story mode; every other value selects the terminal.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("story") => Mode::Story,
            _ => Mode::Terminal,
        }
    }

    pub fn is_story(self) -> bool {
        matches!(self, Mode::Story)
    }
}

/// A single line payload (`line` messages and `lines` items).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct LinePayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<LineKind>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub partial: bool,
}

impl LinePayload {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Kind used when the line is appended (missing kind is `Standard`).
    pub fn kind_or_default(&self) -> LineKind {
        self.kind.unwrap_or_default()
    }
}

/// Prompt decoration fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PromptPayload {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// A choice as sent on the wire: a bare label or `{ text }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum ChoiceWire {
    Label(String),
    Object {
        #[serde(default)]
        text: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
struct ScenePayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    choices: Vec<ChoiceWire>,
}

/// A player choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
}

/// A narrative block plus its ordered choices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scene {
    pub text: String,
    pub choices: Vec<Choice>,
}

impl<'de> Deserialize<'de> for Scene {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        ScenePayload::deserialize(deserializer).map(Scene::from_payload)
    }
}

impl Scene {
    fn from_payload(payload: ScenePayload) -> Self {
        let choices = payload
            .choices
            .into_iter()
            .map(|choice| match choice {
                ChoiceWire::Label(label) => Choice { label },
                ChoiceWire::Object { text } => Choice {
                    label: text.unwrap_or_default(),
                },
            })
            .collect();
        Self {
            text: payload.text.unwrap_or_default(),
            choices,
        }
    }

    /// Scene text split on `\n` or `\r\n`. Empty text yields one empty line.
    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
    }

    /// Display text for the 1-based choice `index`.
    pub fn choice_line(index: usize, choice: &Choice) -> String {
        format!("{index}) {}", choice.label)
    }
}

/// Inbound messages from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "t")]
pub enum ServerMessage {
    #[serde(rename = "mode")]
    Mode {
        #[serde(default)]
        value: Option<String>,
    },
    #[serde(rename = "prompt")]
    Prompt(PromptPayload),
    #[serde(rename = "line")]
    Line(LinePayload),
    #[serde(rename = "lines")]
    Lines {
        #[serde(default, deserialize_with = "null_as_default")]
        items: Vec<Option<LinePayload>>,
    },
    #[serde(rename = "clear")]
    Clear,
    #[serde(rename = "err")]
    Err {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(
        rename = "story",
        alias = "scene",
        alias = "storyScene",
        alias = "StoryScene"
    )]
    Scene(Scene),
    #[serde(other)]
    Unknown,
}

/// Result of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Message(ServerMessage),
    /// Valid JSON that carries no recognized event.
    Ignored,
    /// Payload that could not be decoded.
    Malformed { error: String },
}

impl Inbound {
    pub fn decode(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                return Inbound::Malformed {
                    error: err.to_string(),
                };
            }
        };

        let has_tag = value
            .as_object()
            .and_then(|obj| obj.get("t"))
            .is_some_and(Value::is_string);
        if !has_tag {
            return Inbound::Ignored;
        }

        match serde_json::from_value::<ServerMessage>(value) {
            Ok(ServerMessage::Unknown) => Inbound::Ignored,
            Ok(message) => Inbound::Message(message),
            Err(err) => Inbound::Malformed {
                error: err.to_string(),
            },
        }
    }
}

/// Control actions sent from the terminal prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Clear,
    Interrupt,
}

/// Outbound messages to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "t", rename_all = "lowercase")]
pub enum ClientMessage {
    Input { text: String },
    /// 1-based choice index.
    Choice { index: usize },
    Control { action: ControlAction },
}

impl ClientMessage {
    /// Serializes to a JSON text frame.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
