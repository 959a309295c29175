//! Trait abstractions for controller I/O
//!
//! These traits enable testing the controller with mock implementations.

use crate::dialog::Button;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Chat identifier on the transport
pub type ChatId = i64;

/// Reference to a sent message, used to edit it later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHandle {
    pub chat_id: ChatId,
    pub message_id: i64,
}

/// Transport failures
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Outbound side of the messaging transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send plain text
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageHandle, TransportError>;

    /// Send an image
    async fn send_image(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), TransportError>;

    /// Send text with an inline keyboard, one button per row
    async fn send_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: &[Button],
    ) -> Result<MessageHandle, TransportError>;

    /// Replace the text of a sent message
    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<(), TransportError>;

    /// Register the command menu for a chat
    async fn set_commands(
        &self,
        chat_id: ChatId,
        commands: &[(String, String)],
    ) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageHandle, TransportError> {
        (**self).send_text(chat_id, text).await
    }

    async fn send_image(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), TransportError> {
        (**self).send_image(chat_id, file_name, bytes).await
    }

    async fn send_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: &[Button],
    ) -> Result<MessageHandle, TransportError> {
        (**self).send_buttons(chat_id, text, buttons).await
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<(), TransportError> {
        (**self).edit_text(handle, text).await
    }

    async fn set_commands(
        &self,
        chat_id: ChatId,
        commands: &[(String, String)],
    ) -> Result<(), TransportError> {
        (**self).set_commands(chat_id, commands).await
    }
}
