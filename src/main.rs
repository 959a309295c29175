//! Persona bot - Telegram chat bot over a single language model session
//!
//! Switches between dialog modes (free chat, persona talk, quiz, true/false
//! game), re-priming the model session with a mode-specific system prompt
//! on every switch.

mod config;
mod content;
mod controller;
mod dialog;
mod llm;
mod router;
mod session;
mod sessions;
mod telegram;

use config::BotConfig;
use content::ContentStore;
use dialog::DialogContext;
use llm::{LlmService, LoggingService, OpenAIService};
use sessions::{SessionDeps, SessionManager};
use std::sync::Arc;
use std::time::Duration;
use telegram::TelegramClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pause before polling again after a failed `getUpdates`
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "persona_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env()?;

    let content = if let Some(dir) = &config.resources_dir {
        tracing::info!(path = %dir.display(), "Using content override directory");
        ContentStore::with_override_dir(dir)
    } else {
        ContentStore::embedded()
    };
    let personas = content.load_personas()?;
    tracing::info!(personas = personas.len(), "Loaded persona registry");
    if personas.is_empty() {
        tracing::warn!("Persona registry is empty, /talk will offer no choices");
    }

    let openai = OpenAIService::new(
        config.openai_api_key.clone(),
        config.model.clone(),
        config.openai_base_url.as_deref(),
    )?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(openai)));
    tracing::info!(model = %llm.model_id(), "Language model configured");

    let telegram = Arc::new(TelegramClient::new(
        &config.telegram_token,
        config.poll_timeout,
    )?);

    let sessions = SessionManager::new(
        config.session_scope,
        SessionDeps {
            context: DialogContext::new(Arc::new(personas)),
            content: Arc::new(content),
            llm,
            params: config.session,
            transport: telegram.clone(),
        },
    );

    tracing::info!(scope = ?config.session_scope, "Bot started, polling for updates");

    tokio::select! {
        () = poll_updates(&telegram, &sessions) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutdown requested");
        }
    }

    sessions.shutdown().await;
    tracing::info!("Bot stopped");
    Ok(())
}

async fn poll_updates(telegram: &TelegramClient, sessions: &SessionManager<Arc<TelegramClient>>) {
    let mut offset = 0;

    loop {
        let batch = match telegram.poll(&mut offset).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(error = %e, "Polling for updates failed");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for incoming in batch {
            if let Some(callback_id) = &incoming.callback_id {
                if let Err(e) = telegram.answer_callback(callback_id).await {
                    tracing::warn!(error = %e, "Failed to acknowledge button press");
                }
            }
            if let Some(update) = incoming.update {
                tracing::debug!(chat_id = update.chat_id, "Received update");
                sessions.dispatch(update).await;
            }
        }
    }
}
