//! Effects produced by state transitions

use super::event::TurnPurpose;

/// Inline keyboard button: callback id and visible label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub id: String,
    pub label: String,
}

impl Button {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a content-store image
    SendImage { key: String },

    /// Send a content-store message
    SendMessage { key: String },

    /// Send literal text
    SendText { text: String },

    /// Send text with an inline keyboard
    SendButtons { text: String, buttons: Vec<Button> },

    /// Send a content-store message with an inline keyboard
    SendMessageButtons { key: String, buttons: Vec<Button> },

    /// Register the command menu
    ShowMainMenu { commands: Vec<(String, String)> },

    /// Send a placeholder that a later `EditPlaceholder` replaces
    SendPlaceholder { text: String },

    /// Replace the pending placeholder
    EditPlaceholder { text: String },

    /// Install a content-store prompt as the session system prompt (clears history)
    InstallSystemPrompt { prompt_key: String },

    /// Drop session history, keep the system prompt
    ResetHistory,

    /// Append a user turn; the reply comes back as `Event::ModelReply`
    RequestTurn { text: String, purpose: TurnPurpose },

    /// One-off query outside the session history
    QueryOnce {
        prompt_key: String,
        purpose: TurnPurpose,
    },
}

impl Effect {
    pub fn image(key: impl Into<String>) -> Self {
        Effect::SendImage { key: key.into() }
    }

    pub fn message(key: impl Into<String>) -> Self {
        Effect::SendMessage { key: key.into() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Effect::SendText { text: text.into() }
    }

    pub fn buttons(text: impl Into<String>, buttons: Vec<Button>) -> Self {
        Effect::SendButtons {
            text: text.into(),
            buttons,
        }
    }

    pub fn install_prompt(prompt_key: impl Into<String>) -> Self {
        Effect::InstallSystemPrompt {
            prompt_key: prompt_key.into(),
        }
    }

    pub fn request_turn(text: impl Into<String>, purpose: TurnPurpose) -> Self {
        Effect::RequestTurn {
            text: text.into(),
            purpose,
        }
    }

    /// Whether executing this effect calls the model
    #[cfg(test)]
    pub fn calls_model(&self) -> bool {
        matches!(self, Effect::RequestTurn { .. } | Effect::QueryOnce { .. })
    }
}
