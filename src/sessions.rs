//! Session management
//!
//! Each session is one mode controller running in its own task, fed inbound
//! updates through a channel so a session handles its updates strictly in
//! order while separate sessions run concurrently.

use crate::content::ContentStore;
use crate::controller::{ChatId, ModeController, Transport};
use crate::dialog::DialogContext;
use crate::llm::LlmService;
use crate::router::InboundUpdate;
use crate::session::{ChatSession, SessionParams};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

const SESSION_QUEUE: usize = 32;

/// Key under which every chat shares a single session
const SHARED_KEY: ChatId = 0;

/// How chats map onto sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionScope {
    /// One dialog state and model session for the whole bot
    Shared,
    /// Independent dialog state and model session per chat
    PerChat,
}

impl SessionScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "shared" => Some(Self::Shared),
            "per_chat" => Some(Self::PerChat),
            _ => None,
        }
    }

    fn key(self, chat_id: ChatId) -> ChatId {
        match self {
            Self::Shared => SHARED_KEY,
            Self::PerChat => chat_id,
        }
    }
}

/// Handle to a running session
struct SessionHandle {
    update_tx: mpsc::Sender<InboundUpdate>,
    task: JoinHandle<()>,
}

/// Shared dependencies every new controller is built from
pub struct SessionDeps<T> {
    pub context: DialogContext,
    pub content: Arc<ContentStore>,
    pub llm: Arc<dyn LlmService>,
    pub params: SessionParams,
    pub transport: T,
}

/// Routes inbound updates to per-key controller tasks, spawning them on demand
pub struct SessionManager<T> {
    scope: SessionScope,
    deps: SessionDeps<T>,
    sessions: RwLock<HashMap<ChatId, SessionHandle>>,
}

impl<T: Transport + Clone + 'static> SessionManager<T> {
    pub fn new(scope: SessionScope, deps: SessionDeps<T>) -> Self {
        Self {
            scope,
            deps,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Queue an update on its session.
    ///
    /// Never waits on the session: an update for a session whose queue is
    /// full is dropped, so one busy chat cannot hold up the others.
    pub async fn dispatch(&self, update: InboundUpdate) {
        let key = self.scope.key(update.chat_id);
        let chat_id = update.chat_id;
        let update_tx = self.get_or_create(key).await;

        match update_tx.try_send(update) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(session = key, chat_id, "Session queue is full, dropping update");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::error!(session = key, chat_id, "Session task is gone, dropping update");
                self.sessions.write().await.remove(&key);
            }
        }
    }

    async fn get_or_create(&self, key: ChatId) -> mpsc::Sender<InboundUpdate> {
        if let Some(handle) = self.sessions.read().await.get(&key) {
            return handle.update_tx.clone();
        }

        let mut sessions = self.sessions.write().await;
        // Another dispatch may have created it while we waited for the lock
        if let Some(handle) = sessions.get(&key) {
            return handle.update_tx.clone();
        }

        let (update_tx, update_rx) = mpsc::channel(SESSION_QUEUE);
        let controller = ModeController::new(
            self.deps.context.clone(),
            ChatSession::new(self.deps.llm.clone(), self.deps.params),
            self.deps.content.clone(),
            self.deps.transport.clone(),
        );
        let task = tokio::spawn(run_session(key, controller, update_rx));

        sessions.insert(
            key,
            SessionHandle {
                update_tx: update_tx.clone(),
                task,
            },
        );
        tracing::info!(session = key, active_sessions = sessions.len(), "Started session");

        update_tx
    }

    /// Stop accepting updates and wait for every session to drain its queue
    pub async fn shutdown(&self) {
        let sessions: Vec<_> = self.sessions.write().await.drain().collect();
        for (key, handle) in sessions {
            drop(handle.update_tx);
            if let Err(e) = handle.task.await {
                tracing::error!(session = key, error = %e, "Session task panicked");
            }
        }
    }

    #[cfg(test)]
    async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

async fn run_session<T: Transport>(
    key: ChatId,
    mut controller: ModeController<T>,
    mut update_rx: mpsc::Receiver<InboundUpdate>,
) {
    while let Some(update) = update_rx.recv().await {
        let chat_id = update.chat_id;
        if let Err(e) = controller.handle_inbound(update).await {
            tracing::error!(session = key, chat_id, error = %e, "Failed to handle update");
            if let Err(e) = controller.report_failure().await {
                tracing::warn!(session = key, chat_id, error = %e, "Failed to report failure");
            }
        }
    }
    tracing::debug!(session = key, "Session stopped");
}
