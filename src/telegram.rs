//! Telegram Bot API transport
//!
//! Long-polls `getUpdates` for inbound events and implements [`Transport`]
//! for everything the controller sends.

mod api;

pub use api::Incoming;

use crate::controller::{ChatId, MessageHandle, Transport, TransportError};
use crate::dialog::Button;
use api::{
    decode_response, keyboard, message_text, split_message, AnswerCallbackQuery, BotCommand,
    CommandScope, EditMessageText, GetUpdates, MenuButton, SendMessage, SentMessage,
    SetChatMenuButton, SetMyCommands, Update, EMPTY_TEXT,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const API_ROOT: &str = "https://api.telegram.org";

/// Slack on top of the long-poll timeout before the HTTP request gives up
const POLL_GRACE: Duration = Duration::from_secs(10);

const ALLOWED_UPDATES: [&str; 2] = ["message", "callback_query"];

/// Bot API client
pub struct TelegramClient {
    client: Client,
    /// `{API_ROOT}/bot<token>`, never logged
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: &str, poll_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(poll_timeout + POLL_GRACE)
            .build()
            .map_err(|e| TransportError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("{API_ROOT}/bot{token}"),
            poll_timeout,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TransportError>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(method))
            .json(params)
            .send()
            .await
            .map_err(|e| http_error(method, e))?;
        read_response(method, response).await
    }

    /// Wait for the next batch of updates after `offset`.
    ///
    /// Advances `offset` past every update received, including the ones
    /// that are dropped as unroutable.
    pub async fn poll(&self, offset: &mut i64) -> Result<Vec<Incoming>, TransportError> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &GetUpdates {
                    offset: *offset,
                    timeout: self.poll_timeout.as_secs(),
                    allowed_updates: &ALLOWED_UPDATES,
                },
            )
            .await?;

        let mut incoming = Vec::with_capacity(updates.len());
        for update in updates {
            *offset = (*offset).max(update.update_id + 1);
            let update_id = update.update_id;
            if let Some(item) = update.into_incoming() {
                incoming.push(item);
            } else {
                tracing::debug!(update_id, "Dropping update with nothing to route");
            }
        }
        Ok(incoming)
    }

    /// Acknowledge a button press
    pub async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQuery {
                    callback_query_id: callback_id,
                },
            )
            .await?;
        Ok(())
    }

    /// Send text, split over several messages if it is too long.
    ///
    /// Buttons go on the last message, whose handle is returned.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: Option<&[Button]>,
    ) -> Result<MessageHandle, TransportError> {
        let mut parts = split_message(text);
        let last = parts.pop().unwrap_or_else(|| EMPTY_TEXT.to_string());
        if !parts.is_empty() {
            tracing::debug!(chat_id, parts = parts.len() + 1, "Splitting long message");
        }

        for part in parts {
            let _: SentMessage = self
                .call(
                    "sendMessage",
                    &SendMessage {
                        chat_id,
                        text: part,
                        reply_markup: None,
                    },
                )
                .await?;
        }

        let sent: SentMessage = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id,
                    text: last,
                    reply_markup: buttons.map(keyboard),
                },
            )
            .await?;
        Ok(MessageHandle {
            chat_id,
            message_id: sent.message_id,
        })
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageHandle, TransportError> {
        self.send_message(chat_id, text, None).await
    }

    async fn send_image(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), TransportError> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime.as_ref())
            .map_err(|e| http_error("sendPhoto", e))?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", part);

        let response = self
            .client
            .post(self.url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| http_error("sendPhoto", e))?;
        let _: SentMessage = read_response("sendPhoto", response).await?;
        Ok(())
    }

    async fn send_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: &[Button],
    ) -> Result<MessageHandle, TransportError> {
        self.send_message(chat_id, text, Some(buttons)).await
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<(), TransportError> {
        // Result is the edited message, or `true` for inline messages
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageText {
                    chat_id: handle.chat_id,
                    message_id: handle.message_id,
                    text: message_text(text),
                },
            )
            .await?;
        Ok(())
    }

    async fn set_commands(
        &self,
        chat_id: ChatId,
        commands: &[(String, String)],
    ) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "setMyCommands",
                &SetMyCommands {
                    commands: commands
                        .iter()
                        .map(|(command, description)| BotCommand {
                            command,
                            description,
                        })
                        .collect(),
                    scope: CommandScope::Chat { chat_id },
                },
            )
            .await?;

        let _: bool = self
            .call(
                "setChatMenuButton",
                &SetChatMenuButton {
                    chat_id,
                    menu_button: MenuButton::Commands,
                },
            )
            .await?;
        Ok(())
    }
}

/// Request errors carry the URL, which embeds the bot token
fn http_error(method: &str, e: reqwest::Error) -> TransportError {
    TransportError::Http(format!("{method}: {}", e.without_url()))
}

async fn read_response<R: DeserializeOwned>(
    method: &str,
    response: reqwest::Response,
) -> Result<R, TransportError> {
    let body = response.text().await.map_err(|e| http_error(method, e))?;
    decode_response(&body)
}
