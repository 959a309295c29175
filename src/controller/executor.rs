//! Mode controller executor

use super::traits::{ChatId, MessageHandle, Transport};
use super::ControllerError;

use crate::content::ContentStore;
use crate::dialog::{transition, DialogContext, DialogState, Effect, Event};
use crate::router::{self, InboundUpdate};
use crate::session::ChatSession;
use std::collections::VecDeque;
use std::sync::Arc;

/// Shown when a model turn or delivery fails
pub const FAILURE_NOTICE: &str = "Не удалось получить ответ. Попробуйте ещё раз.";

/// Interprets events against one dialog state and one model session
pub struct ModeController<T: Transport> {
    context: DialogContext,
    state: DialogState,
    session: ChatSession,
    content: Arc<ContentStore>,
    transport: T,
    /// Chat of the inbound event being handled
    chat_id: ChatId,
    /// Placeholder awaiting the model reply
    placeholder: Option<MessageHandle>,
}

impl<T: Transport> ModeController<T> {
    pub fn new(
        context: DialogContext,
        session: ChatSession,
        content: Arc<ContentStore>,
        transport: T,
    ) -> Self {
        Self {
            context,
            state: DialogState::default(),
            session,
            content,
            transport,
            chat_id: 0,
            placeholder: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &DialogState {
        &self.state
    }

    #[cfg(test)]
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Handle one inbound transport event for `update.chat_id`.
    ///
    /// Runs every event the inbound one chains into (model replies included)
    /// before returning, so inbound events are handled strictly in order.
    pub async fn handle_inbound(&mut self, update: InboundUpdate) -> Result<(), ControllerError> {
        self.chat_id = update.chat_id;
        self.placeholder = None;

        let event = router::route(update.inbound);
        self.handle_event(event).await
    }

    /// Tell the user the last event failed.
    ///
    /// Replaces a pending placeholder if there is one, otherwise sends a new message.
    pub async fn report_failure(&mut self) -> Result<(), ControllerError> {
        if let Some(handle) = self.placeholder.take() {
            self.transport.edit_text(handle, FAILURE_NOTICE).await?;
        } else {
            self.transport.send_text(self.chat_id, FAILURE_NOTICE).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Run `event` and every model reply it chains into.
    ///
    /// An event the current mode does not accept is logged and dropped.
    pub async fn handle_event(&mut self, event: Event) -> Result<(), ControllerError> {
        // Model replies are queued behind the remaining effects of the same transition
        let mut events_to_process = VecDeque::from([event]);

        while let Some(current_event) = events_to_process.pop_front() {
            let event_name = current_event.name();

            let result = match transition(&self.state, &self.context, current_event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(
                        chat_id = self.chat_id,
                        error = %e,
                        "Ignoring event not valid in current mode"
                    );
                    return Ok(());
                }
            };

            let old_mode = self.state.mode();
            self.state = result.new_state;
            if old_mode != self.state.mode() {
                tracing::info!(
                    chat_id = self.chat_id,
                    event = event_name,
                    from = %old_mode,
                    to = %self.state.mode(),
                    persona = self.state.persona_name(),
                    topic = ?self.state.quiz_topic(),
                    "Dialog mode changed"
                );
            }

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect).await? {
                    events_to_process.push_back(generated_event);
                }
            }
        }

        Ok(())
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect) -> Result<Option<Event>, ControllerError> {
        let chat_id = self.chat_id;

        match effect {
            Effect::SendImage { key } => {
                if let Some((file_name, bytes)) = self.content.load_image(&key)? {
                    self.transport.send_image(chat_id, &file_name, bytes).await?;
                } else {
                    tracing::warn!(key = %key, "No image for key, skipping");
                }
                Ok(None)
            }

            Effect::SendMessage { key } => {
                let text = self.content.load_message(&key)?;
                self.transport.send_text(chat_id, &text).await?;
                Ok(None)
            }

            Effect::SendText { text } => {
                self.transport.send_text(chat_id, &text).await?;
                Ok(None)
            }

            Effect::SendButtons { text, buttons } => {
                self.transport.send_buttons(chat_id, &text, &buttons).await?;
                Ok(None)
            }

            Effect::SendMessageButtons { key, buttons } => {
                let text = self.content.load_message(&key)?;
                self.transport.send_buttons(chat_id, &text, &buttons).await?;
                Ok(None)
            }

            Effect::ShowMainMenu { commands } => {
                self.transport.set_commands(chat_id, &commands).await?;
                Ok(None)
            }

            Effect::SendPlaceholder { text } => {
                let handle = self.transport.send_text(chat_id, &text).await?;
                self.placeholder = Some(handle);
                Ok(None)
            }

            Effect::EditPlaceholder { text } => {
                if let Some(handle) = self.placeholder.take() {
                    self.transport.edit_text(handle, &text).await?;
                } else {
                    tracing::warn!(chat_id, "No placeholder to edit, sending reply as new message");
                    self.transport.send_text(chat_id, &text).await?;
                }
                Ok(None)
            }

            Effect::InstallSystemPrompt { prompt_key } => {
                let prompt = self.content.load_prompt(&prompt_key)?;
                self.session.set_system_prompt(prompt);
                tracing::debug!(chat_id, prompt = %prompt_key, "Installed system prompt");
                Ok(None)
            }

            Effect::ResetHistory => {
                self.session.reset_history();
                Ok(None)
            }

            Effect::RequestTurn { text, purpose } => {
                tracing::debug!(
                    chat_id,
                    ?purpose,
                    history_len = self.session.history().len(),
                    "Requesting model turn"
                );
                let reply = self.session.add_turn(&text).await?;
                Ok(Some(Event::ModelReply {
                    purpose,
                    text: reply,
                }))
            }

            Effect::QueryOnce {
                prompt_key,
                purpose,
            } => {
                let prompt = self.content.load_prompt(&prompt_key)?;
                let reply = self.session.query(&prompt, "").await?;
                Ok(Some(Event::ModelReply {
                    purpose,
                    text: reply,
                }))
            }
        }
    }
}
