//! Line kinds.

use serde::{Deserialize, Deserializer, Serialize};

/// Visual category of a scrollback line.
///
/// Parsed case-insensitively from the wire; anything unrecognized renders as
/// `Standard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    #[default]
    Standard,
    System,
    Error,
    Choice,
    Spacer,
}

impl LineKind {
    /// Parses a wire `type` value.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "system" => LineKind::System,
            "error" => LineKind::Error,
            "choice" => LineKind::Choice,
            "spacer" => LineKind::Spacer,
            _ => LineKind::Standard,
        }
    }

    pub fn is_system(self) -> bool {
        matches!(self, LineKind::System)
    }
}

impl<'de> Deserialize<'de> for LineKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(LineKind::from_wire(&raw))
    }
}
