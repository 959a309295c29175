//! Telegram Bot API wire types

use crate::controller::{ChatId, TransportError};
use crate::dialog::Button;
use crate::router::{parse_command, Inbound, InboundUpdate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Longest text a single message may carry, in characters
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Every Bot API response is wrapped in this envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Unwrap the response envelope
pub fn decode_response<T: DeserializeOwned>(body: &str) -> Result<T, TransportError> {
    let envelope: ApiResponse<T> = serde_json::from_str(body)
        .map_err(|e| TransportError::Decode(format!("{e}")))?;

    if !envelope.ok {
        return Err(TransportError::Api {
            code: envelope.error_code.unwrap_or_default(),
            description: envelope.description.unwrap_or_default(),
        });
    }

    envelope
        .result
        .ok_or_else(|| TransportError::Decode("response has no result".to_string()))
}

// ============================================================================
// Inbound
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

/// An update the bot acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    /// `None` for a button press that cannot be routed
    pub update: Option<InboundUpdate>,
    /// Button presses must be acknowledged to stop the client spinner
    pub callback_id: Option<String>,
}

impl Update {
    /// The part of this update the bot acts on, if any.
    ///
    /// Non-text messages are dropped. Button presses are always kept so
    /// they can be acknowledged, even when they carry nothing to route.
    pub fn into_incoming(self) -> Option<Incoming> {
        if let Some(message) = self.message {
            let text = message.text?;
            let inbound = parse_command(&text).map_or(Inbound::Text(text), Inbound::Command);
            return Some(Incoming {
                update: Some(InboundUpdate {
                    chat_id: message.chat.id,
                    inbound,
                }),
                callback_id: None,
            });
        }

        let query = self.callback_query?;
        let update = query
            .message
            .zip(query.data)
            .map(|(message, data)| InboundUpdate {
                chat_id: message.chat.id,
                inbound: Inbound::ButtonPress(data),
            });
        Some(Incoming {
            update,
            callback_id: Some(query.id),
        })
    }
}

// ============================================================================
// Outbound
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GetUpdates<'a> {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

#[derive(Debug, Serialize)]
pub struct EditMessageText {
    pub chat_id: ChatId,
    pub message_id: i64,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery<'a> {
    pub callback_query_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SetMyCommands<'a> {
    pub commands: Vec<BotCommand<'a>>,
    pub scope: CommandScope,
}

#[derive(Debug, Serialize)]
pub struct BotCommand<'a> {
    pub command: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandScope {
    Chat { chat_id: ChatId },
}

#[derive(Debug, Serialize)]
pub struct SetChatMenuButton {
    pub chat_id: ChatId,
    pub menu_button: MenuButton,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuButton {
    Commands,
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardMarkup<'a> {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton<'a>>>,
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardButton<'a> {
    pub text: &'a str,
    pub callback_data: &'a str,
}

/// Only `message_id` of a sent message is needed
#[derive(Debug, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

/// One button per row, in order
pub fn keyboard(buttons: &[Button]) -> InlineKeyboardMarkup<'_> {
    InlineKeyboardMarkup {
        inline_keyboard: buttons
            .iter()
            .map(|b| {
                vec![InlineKeyboardButton {
                    text: &b.label,
                    callback_data: &b.id,
                }]
            })
            .collect(),
    }
}

/// Stand-in for empty text, which the API rejects
pub const EMPTY_TEXT: &str = "…";

/// Split text into as many messages as it needs
pub fn split_message(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![EMPTY_TEXT.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_MESSAGE_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Fit text into one existing message, truncating if needed
pub fn message_text(text: &str) -> String {
    if text.trim().is_empty() {
        return EMPTY_TEXT.to_string();
    }
    let chars = text.chars().count();
    if chars <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    tracing::warn!(chars, limit = MAX_MESSAGE_CHARS, "Truncating text of edited message");
    let mut truncated: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    truncated.push_str(EMPTY_TEXT);
    truncated
}
