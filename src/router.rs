//! Inbound routing
//!
//! Maps transport events onto dialog events: the command surface and the
//! string-prefixed button namespaces.

use crate::controller::ChatId;
use crate::dialog::Event;
use regex::Regex;
use std::sync::LazyLock;

/// Inbound event as surfaced by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Bot command without the leading slash, e.g. `quiz`
    Command(String),
    /// Plain text message
    Text(String),
    /// Inline keyboard button callback data
    ButtonPress(String),
}

/// Inbound event with the chat it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUpdate {
    pub chat_id: ChatId,
    pub inbound: Inbound,
}

type ButtonRoute = fn(String) -> Event;

/// Button patterns, first match wins
static BUTTON_ROUTES: LazyLock<Vec<(Regex, ButtonRoute)>> = LazyLock::new(|| {
    let routes: [(&str, ButtonRoute); 6] = [
        (r"^random$", |_| Event::RandomFact),
        (r"^talk_.*", |key| Event::PersonalityChosen { key }),
        (r"^quiz_(prog|math|biology)$", |key| Event::QuizTopicChosen { key }),
        (r"^quiz_(more|exit)$", |choice| Event::QuizContinue { choice }),
        (r"^truefalse_(true|false)$", |choice| Event::TrueFalseAnswer { choice }),
        (r"^truefalse_(next|exit)$", |choice| Event::TrueFalseContinue { choice }),
    ];
    routes
        .into_iter()
        .map(|(pattern, route)| (Regex::new(pattern).expect("valid button pattern"), route))
        .collect()
});

/// Translate an inbound transport event into a dialog event
pub fn route(inbound: Inbound) -> Event {
    match inbound {
        Inbound::Command(name) => route_command(&name),
        Inbound::Text(text) => Event::FreeText { text },
        Inbound::ButtonPress(data) => route_button(data),
    }
}

fn route_command(name: &str) -> Event {
    match name {
        "start" => Event::Start,
        "random" => Event::RandomFact,
        "gpt" => Event::GptStart,
        "talk" => Event::TalkStart,
        "quiz" => Event::QuizStart,
        "truefalse" => Event::TrueFalseStart,
        // Unregistered commands are ordinary text
        other => Event::FreeText {
            text: format!("/{other}"),
        },
    }
}

fn route_button(data: String) -> Event {
    if let Some((_, route)) = BUTTON_ROUTES.iter().find(|(pattern, _)| pattern.is_match(&data)) {
        route(data)
    } else {
        Event::UnknownAction { data }
    }
}

/// Split a message into a bot command name, if it is one.
///
/// Handles the `/cmd@BotName args` form Telegram uses in groups.
pub fn parse_command(text: &str) -> Option<String> {
    let rest = text.strip_prefix('/')?;
    let word = rest.split(char::is_whitespace).next()?;
    let name = word.split_once('@').map_or(word, |(name, _)| name);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
