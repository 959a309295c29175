//! Mock implementations for testing
//!
//! These mocks enable controller tests without a model API or a chat server.

use super::traits::*;
use crate::dialog::Button;
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Record of all requests made
    requests: Mutex<Vec<LlmRequest>>,
    /// When set, requests never complete
    stalled: AtomicBool,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            stalled: AtomicBool::new(false),
        }
    }

    /// Make every following request hang forever
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    /// Queue a successful text response
    pub fn queue_text(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(LlmResponse::text(text)));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

/// Everything the controller delivered, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        message_id: i64,
        text: String,
    },
    Image {
        file_name: String,
    },
    Buttons {
        message_id: i64,
        text: String,
        ids: Vec<String>,
    },
    Edit {
        message_id: i64,
        text: String,
    },
    Commands {
        names: Vec<String>,
    },
}

/// Mock transport that records outbound calls
pub struct MockTransport {
    sent: Mutex<Vec<Sent>>,
    next_message_id: Mutex<i64>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            next_message_id: Mutex::new(1),
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Visible text of every message, with edits applied in place
    pub fn texts(&self) -> Vec<String> {
        let mut texts: Vec<(i64, String)> = Vec::new();
        for item in self.sent() {
            match item {
                Sent::Text { message_id, text } | Sent::Buttons { message_id, text, .. } => {
                    texts.push((message_id, text));
                }
                Sent::Edit { message_id, text } => {
                    if let Some(entry) = texts.iter_mut().find(|(id, _)| *id == message_id) {
                        entry.1 = text;
                    }
                }
                Sent::Image { .. } | Sent::Commands { .. } => {}
            }
        }
        texts.into_iter().map(|(_, text)| text).collect()
    }

    pub fn last_buttons(&self) -> Option<Vec<String>> {
        self.sent().into_iter().rev().find_map(|item| match item {
            Sent::Buttons { ids, .. } => Some(ids),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn next_handle(&self, chat_id: ChatId) -> MessageHandle {
        let mut next = self.next_message_id.lock().unwrap();
        let handle = MessageHandle {
            chat_id,
            message_id: *next,
        };
        *next += 1;
        handle
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageHandle, TransportError> {
        let handle = self.next_handle(chat_id);
        self.sent.lock().unwrap().push(Sent::Text {
            message_id: handle.message_id,
            text: text.to_string(),
        });
        Ok(handle)
    }

    async fn send_image(
        &self,
        _chat_id: ChatId,
        file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(Sent::Image {
            file_name: file_name.to_string(),
        });
        Ok(())
    }

    async fn send_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: &[Button],
    ) -> Result<MessageHandle, TransportError> {
        let handle = self.next_handle(chat_id);
        self.sent.lock().unwrap().push(Sent::Buttons {
            message_id: handle.message_id,
            text: text.to_string(),
            ids: buttons.iter().map(|b| b.id.clone()).collect(),
        });
        Ok(handle)
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(Sent::Edit {
            message_id: handle.message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn set_commands(
        &self,
        _chat_id: ChatId,
        commands: &[(String, String)],
    ) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(Sent::Commands {
            names: commands.iter().map(|(name, _)| name.clone()).collect(),
        });
        Ok(())
    }
}

// ============================================================================
// Controller scenarios
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentStore, Persona, PersonaRegistry};
    use crate::controller::{ControllerError, ModeController, FAILURE_NOTICE};
    use crate::dialog::{DialogContext, DialogState, Event, Mode, QuizTopic};
    use crate::llm::{LlmMessage, LlmErrorKind};
    use crate::router::{Inbound, InboundUpdate};
    use crate::session::{ChatSession, SessionParams};
    use std::sync::Arc;

    const CHAT: ChatId = 42;

    struct Harness {
        llm: Arc<MockLlmClient>,
        transport: Arc<MockTransport>,
        controller: ModeController<Arc<MockTransport>>,
    }

    fn harness() -> Harness {
        let llm = Arc::new(MockLlmClient::new());
        let transport = Arc::new(MockTransport::new());
        let personas = PersonaRegistry::new(vec![
            Persona::new("talk_tesla", "Tesla - Изобретатель ⚡", "talk_tesla"),
            Persona::new("talk_cobain", "Курт Кобейн - Солист группы Nirvana 🎸", "talk_cobain"),
        ]);
        let controller = ModeController::new(
            DialogContext::new(Arc::new(personas)),
            ChatSession::new(llm.clone(), SessionParams::default()),
            Arc::new(ContentStore::embedded()),
            transport.clone(),
        );
        Harness {
            llm,
            transport,
            controller,
        }
    }

    impl Harness {
        async fn command(&mut self, name: &str) {
            self.inbound(Inbound::Command(name.to_string())).await.unwrap();
        }

        async fn text(&mut self, text: &str) -> Result<(), ControllerError> {
            self.inbound(Inbound::Text(text.to_string())).await
        }

        async fn press(&mut self, data: &str) -> Result<(), ControllerError> {
            self.inbound(Inbound::ButtonPress(data.to_string())).await
        }

        async fn inbound(&mut self, inbound: Inbound) -> Result<(), ControllerError> {
            self.controller
                .handle_inbound(InboundUpdate {
                    chat_id: CHAT,
                    inbound,
                })
                .await
        }
    }

    #[tokio::test]
    async fn test_start_shows_menu() {
        let mut h = harness();
        h.command("start").await;

        assert_eq!(h.controller.state(), &DialogState::Main);
        let sent = h.transport.sent();
        assert!(matches!(&sent[0], Sent::Text { text, .. } if !text.is_empty()));
        assert!(matches!(&sent[1], Sent::Commands { names } if names.len() == 6));
        assert!(h.llm.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_quiz_scores_correct_answer() {
        let mut h = harness();
        h.llm.queue_text("Сколько будет 2+2?");
        h.llm.queue_text("Правильно! Это 4.");

        h.command("start").await;
        h.command("quiz").await;
        assert_eq!(h.controller.state().mode(), Mode::ChooseQuizTopic);
        assert_eq!(
            h.transport.last_buttons().unwrap(),
            vec!["quiz_prog", "quiz_math", "quiz_biology"]
        );

        h.press("quiz_math").await.unwrap();
        assert_eq!(h.controller.state().quiz_topic(), Some(QuizTopic::Math));
        assert!(h.transport.texts().contains(&"Сколько будет 2+2?".to_string()));

        h.text("4").await.unwrap();

        assert_eq!(h.controller.state().correct_answers(), 1);
        assert_eq!(h.transport.last_buttons().unwrap(), vec!["quiz_more", "quiz_exit"]);
        let last = h.transport.texts().pop().unwrap();
        assert!(last.contains("Правильно! Это 4."));
        assert!(last.ends_with("Правильных ответов: 1"));

        // Topic key starts the quiz conversation on a fresh prompt
        let requests = h.llm.recorded_requests();
        assert_eq!(requests[0].messages, vec![LlmMessage::user("quiz_math")]);
        assert_eq!(requests[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn test_quiz_wrong_answer_keeps_score() {
        let mut h = harness();
        h.llm.queue_text("Question?");
        h.llm.queue_text("Неправильно. Ответ: 4.");

        h.command("quiz").await;
        h.press("quiz_prog").await.unwrap();
        h.text("5").await.unwrap();

        assert_eq!(h.controller.state().correct_answers(), 0);
    }

    #[tokio::test]
    async fn test_quiz_more_asks_next_question() {
        let mut h = harness();
        h.llm.queue_text("Q1");
        h.llm.queue_text("Правильно!");
        h.llm.queue_text("Q2");

        h.command("quiz").await;
        h.press("quiz_biology").await.unwrap();
        h.text("answer").await.unwrap();
        h.press("quiz_more").await.unwrap();

        let last_request = h.llm.recorded_requests().pop().unwrap();
        assert_eq!(last_request.messages.last().unwrap(), &LlmMessage::user("more"));
        assert_eq!(h.transport.texts().pop().unwrap(), "Q2");
        assert_eq!(h.controller.state().correct_answers(), 1);
    }

    #[tokio::test]
    async fn test_quiz_exit_reports_summary() {
        let mut h = harness();
        h.llm.queue_text("Q1");
        for _ in 0..3 {
            h.llm.queue_text("Правильно!");
            h.llm.queue_text("next question");
        }

        h.command("quiz").await;
        h.press("quiz_math").await.unwrap();
        for _ in 0..3 {
            h.text("answer").await.unwrap();
            h.press("quiz_more").await.unwrap();
        }
        assert_eq!(h.controller.state().correct_answers(), 3);

        h.transport.clear();
        h.press("quiz_exit").await.unwrap();

        assert_eq!(h.controller.state(), &DialogState::Main);
        assert_eq!(
            h.transport.texts()[0],
            "Викторина завершена! Вы набрали 3 правильных ответов."
        );
    }

    #[tokio::test]
    async fn test_talk_placeholder_is_edited_with_reply() {
        let mut h = harness();
        h.llm.queue_text("Электричество - это жизнь.");

        h.command("talk").await;
        h.press("talk_tesla").await.unwrap();
        assert_eq!(h.controller.state().persona_name(), Some("Tesla"));

        h.transport.clear();
        h.text("Что такое ток?").await.unwrap();

        let sent = h.transport.sent();
        assert_eq!(
            sent[0],
            Sent::Text {
                message_id: sent_id(&sent[0]),
                text: "Tesla думает...".to_string(),
            }
        );
        assert_eq!(
            sent[1],
            Sent::Edit {
                message_id: sent_id(&sent[0]),
                text: "Электричество - это жизнь.".to_string(),
            }
        );

        let request = h.llm.recorded_requests().pop().unwrap();
        assert!(request.system.is_some());
        assert_eq!(request.messages, vec![LlmMessage::user("Что такое ток?")]);
    }

    fn sent_id(item: &Sent) -> i64 {
        match item {
            Sent::Text { message_id, .. }
            | Sent::Buttons { message_id, .. }
            | Sent::Edit { message_id, .. } => *message_id,
            Sent::Image { .. } | Sent::Commands { .. } => 0,
        }
    }

    #[tokio::test]
    async fn test_unknown_persona_keeps_mode() {
        let mut h = harness();
        h.command("talk").await;
        h.transport.clear();

        h.press("talk_unknownkey").await.unwrap();

        assert_eq!(h.controller.state(), &DialogState::ChoosePersonality);
        assert_eq!(h.transport.texts(), vec!["Выбранная личность не найдена."]);
    }

    #[tokio::test]
    async fn test_mode_switch_starts_fresh_conversation() {
        let mut h = harness();
        h.llm.queue_text("gpt answer");
        h.llm.queue_text("persona answer");

        h.command("gpt").await;
        h.text("hello").await.unwrap();
        h.command("talk").await;
        h.press("talk_cobain").await.unwrap();
        h.text("hey").await.unwrap();

        let requests = h.llm.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_ne!(requests[0].system, requests[1].system);
        assert_eq!(requests[1].messages, vec![LlmMessage::user("hey")]);
        assert_eq!(h.controller.state().persona_name(), Some("Курт Кобейн"));
    }

    #[tokio::test]
    async fn test_random_fact_keeps_mode_and_history() {
        let mut h = harness();
        h.llm.queue_text("gpt answer");
        h.llm.queue_text("Octopuses have three hearts");

        h.command("gpt").await;
        h.text("hello").await.unwrap();
        let prompt_before = h.controller.session().system_prompt().map(str::to_string);

        h.command("random").await;

        assert_eq!(h.controller.state(), &DialogState::Gpt);
        assert_eq!(h.controller.session().history().len(), 2);
        assert_eq!(
            h.controller.session().system_prompt().map(str::to_string),
            prompt_before
        );
        assert_eq!(h.transport.last_buttons().unwrap(), vec!["random"]);
        let fact_request = h.llm.recorded_requests().pop().unwrap();
        assert!(fact_request.system.is_none());
        assert_eq!(fact_request.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_true_false_round() {
        let mut h = harness();
        h.llm.queue_text("Солнце - звезда.");
        h.llm.queue_text("Верно! Солнце - звезда.");
        h.llm.queue_text("Луна сделана из сыра.");

        h.command("truefalse").await;
        assert_eq!(
            h.controller.state().true_false_statement(),
            Some("Солнце - звезда.")
        );
        assert_eq!(
            h.transport.last_buttons().unwrap(),
            vec!["truefalse_true", "truefalse_false"]
        );

        h.press("truefalse_true").await.unwrap();
        assert_eq!(h.controller.state().true_false_score(), 1);
        assert!(h.transport.texts().pop().unwrap().ends_with("Ваш счёт: 1"));

        h.press("truefalse_next").await.unwrap();
        assert_eq!(
            h.controller.state().true_false_statement(),
            Some("Луна сделана из сыра.")
        );

        let requests = h.llm.recorded_requests();
        assert_eq!(requests[0].messages, vec![LlmMessage::user("next")]);
        assert_eq!(requests[1].messages.last().unwrap(), &LlmMessage::user("Правда"));

        h.transport.clear();
        h.press("truefalse_exit").await.unwrap();
        assert_eq!(h.controller.state(), &DialogState::Main);
        assert_eq!(h.transport.texts()[0], "Игра окончена! Ваш итоговый счёт: 1.");
    }

    #[tokio::test]
    async fn test_llm_failure_rolls_back_and_reports() {
        let mut h = harness();
        h.llm.queue_error(LlmError::server_error("upstream down"));

        h.command("gpt").await;
        h.transport.clear();
        let err = h.text("hello").await.unwrap_err();

        assert!(matches!(
            &err,
            ControllerError::Llm(e) if e.kind == LlmErrorKind::ServerError
        ));
        assert!(h.controller.session().history().is_empty());
        assert_eq!(h.controller.state(), &DialogState::Gpt);

        h.controller.report_failure().await.unwrap();
        assert_eq!(h.transport.texts(), vec![FAILURE_NOTICE]);
        assert!(matches!(h.transport.sent().last(), Some(Sent::Edit { .. })));
    }

    #[tokio::test]
    async fn test_failure_without_placeholder_sends_notice() {
        let mut h = harness();
        h.llm.queue_error(LlmError::network("connection reset"));

        h.command("quiz").await;
        h.transport.clear();
        assert!(h.press("quiz_math").await.is_err());

        h.controller.report_failure().await.unwrap();
        assert_eq!(
            h.transport.sent(),
            vec![Sent::Text {
                message_id: sent_id(&h.transport.sent()[0]),
                text: FAILURE_NOTICE.to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_stale_button_is_acknowledged() {
        let mut h = harness();
        h.command("gpt").await;
        h.transport.clear();

        h.press("quiz_more").await.unwrap();

        assert_eq!(h.controller.state(), &DialogState::Gpt);
        assert_eq!(h.transport.texts(), vec!["Вы нажали на кнопку: quiz_more"]);
        assert!(h.llm.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_free_text_in_main_shows_menu() {
        let mut h = harness();
        h.command("start").await;
        h.transport.clear();

        h.text("hello").await.unwrap();

        assert_eq!(h.controller.state(), &DialogState::Main);
        assert!(h
            .transport
            .sent()
            .iter()
            .any(|s| matches!(s, Sent::Commands { .. })));
        assert!(h.llm.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_direct_event_in_wrong_mode_is_ignored() {
        let mut h = harness();
        h.command("start").await;
        h.transport.clear();

        h.controller
            .handle_event(Event::QuizAnswer {
                text: "42".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(h.controller.state(), &DialogState::Main);
        assert!(h.transport.sent().is_empty());
    }
}
