//! Language model session
//!
//! A single evolving conversation with the model. Installing a system prompt
//! discards all prior turns, so history is always scoped to the current mode.

use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService, RequestKind};
use std::sync::Arc;

/// Sampling parameters applied to every request of a session
#[derive(Debug, Clone, Copy)]
pub struct SessionParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            max_tokens: 3000,
            temperature: 0.9,
        }
    }
}

/// Conversation thread with a system prompt and alternating user/assistant turns
pub struct ChatSession {
    llm: Arc<dyn LlmService>,
    params: SessionParams,
    system_prompt: Option<String>,
    history: Vec<LlmMessage>,
}

impl ChatSession {
    pub fn new(llm: Arc<dyn LlmService>, params: SessionParams) -> Self {
        Self {
            llm,
            params,
            system_prompt: None,
            history: Vec::new(),
        }
    }

    /// Replace the system prompt and discard every prior turn
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
        self.history.clear();
    }

    /// Discard every turn, keeping the current system prompt
    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    #[cfg(test)]
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn history(&self) -> &[LlmMessage] {
        &self.history
    }

    /// One-off question outside the persisted conversation.
    ///
    /// Neither the system prompt nor the history is sent or modified.
    pub async fn query(&self, prompt: &str, context: &str) -> Result<String, LlmError> {
        let text = if context.is_empty() {
            prompt.to_string()
        } else {
            format!("{prompt}\n\n{context}")
        };
        let request = LlmRequest {
            kind: RequestKind::Query,
            system: None,
            messages: vec![LlmMessage::user(text)],
            max_tokens: Some(self.params.max_tokens),
            temperature: Some(self.params.temperature),
        };
        let response = self.llm.complete(&request).await?;
        Ok(response.text)
    }

    /// Append a user turn and return the assistant reply.
    ///
    /// On failure the user turn is rolled back so the history never ends
    /// with an unanswered message.
    pub async fn add_turn(&mut self, user_text: &str) -> Result<String, LlmError> {
        self.history.push(LlmMessage::user(user_text));

        let request = LlmRequest {
            kind: RequestKind::Turn,
            system: self.system_prompt.clone(),
            messages: self.history.clone(),
            max_tokens: Some(self.params.max_tokens),
            temperature: Some(self.params.temperature),
        };

        match self.llm.complete(&request).await {
            Ok(response) => {
                self.history.push(LlmMessage::assistant(response.text.clone()));
                Ok(response.text)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }
}
