//! Prompt decoration.

use env0_types::PromptPayload;

/// Display-only prompt fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptInfo {
    pub user: String,
    pub host: String,
    pub cwd: String,
    pub symbol: String,
}

impl Default for PromptInfo {
    fn default() -> Self {
        Self {
            user: String::new(),
            host: String::new(),
            cwd: String::new(),
            symbol: Self::DEFAULT_SYMBOL.to_string(),
        }
    }
}

impl PromptInfo {
    pub const DEFAULT_SYMBOL: &'static str = "$";

    /// Builds prompt fields from a `prompt` message. Missing fields are
    /// empty; a missing or empty symbol falls back to `$`.
    pub fn from_payload(payload: &PromptPayload) -> Self {
        Self {
            user: payload.user.clone().unwrap_or_default(),
            host: payload.host.clone().unwrap_or_default(),
            cwd: payload.cwd.clone().unwrap_or_default(),
            symbol: payload
                .symbol
                .as_deref()
                .filter(|symbol| !symbol.is_empty())
                .unwrap_or(Self::DEFAULT_SYMBOL)
                .to_string(),
        }
    }

    /// Renders `"{user}@{host}:{cwd}{symbol} "`, leaving out each
    /// decoration whose field is empty.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.user.is_empty() {
            out.push_str(&self.user);
            out.push('@');
        }
        out.push_str(&self.host);
        if !self.cwd.is_empty() {
            out.push(':');
            out.push_str(&self.cwd);
        }
        out.push_str(&self.symbol);
        out.push(' ');
        out
    }
}
