//! Update commands pushed to the peer.

use serde::{Deserialize, Serialize};

/// What rofi does with the text placed in its input box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputAction {
    /// Filter the entry list with the input text.
    Filter,
    /// Send the input text back as an event.
    Send,
}

/// A partial update of the peer's displayed state.
///
/// Only fields that were set are serialized; unset fields are left out of the
/// wire object rather than sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Wire name has a space, not an underscore.
    #[serde(
        rename = "input action",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub input_action: Option<InputAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_entry: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<String>>,
}

impl UpdateCommand {
    /// Create an empty update, serialized as `{}`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message shown above the entries.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the overlay text.
    #[must_use]
    pub fn overlay(mut self, overlay: impl Into<String>) -> Self {
        self.overlay = Some(overlay.into());
        self
    }

    /// Set the prompt.
    #[must_use]
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the input box text.
    #[must_use]
    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Set the input action.
    #[must_use]
    pub fn input_action(mut self, action: InputAction) -> Self {
        self.input_action = Some(action);
        self
    }

    /// Set the highlighted entry.
    #[must_use]
    pub fn active_entry(mut self, entry: i64) -> Self {
        self.active_entry = Some(entry);
        self
    }

    /// Replace the entry lines.
    #[must_use]
    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines = Some(lines.into_iter().map(Into::into).collect());
        self
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Encode as a single newline-terminated JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
