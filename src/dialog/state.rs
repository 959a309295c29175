//! Dialog state types

use crate::content::PersonaRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Quiz Topics
// ============================================================================

/// Topics offered when a quiz starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizTopic {
    Programming,
    Math,
    Biology,
}

impl QuizTopic {
    pub const ALL: [QuizTopic; 3] = [QuizTopic::Programming, QuizTopic::Math, QuizTopic::Biology];

    /// Button id, also sent to the model as the first quiz turn
    pub fn key(self) -> &'static str {
        match self {
            QuizTopic::Programming => "quiz_prog",
            QuizTopic::Math => "quiz_math",
            QuizTopic::Biology => "quiz_biology",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuizTopic::Programming => "Программирование на Python 🐍",
            QuizTopic::Math => "Математические теории 📐",
            QuizTopic::Biology => "Биология 🧬",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }
}

// ============================================================================
// Dialog State
// ============================================================================

/// Which mode is active, without the per-mode payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    None,
    Main,
    Gpt,
    ChoosePersonality,
    Talk,
    ChooseQuizTopic,
    Quiz,
    TrueFalse,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::None => "none",
            Mode::Main => "main",
            Mode::Gpt => "gpt",
            Mode::ChoosePersonality => "choose_personality",
            Mode::Talk => "talk",
            Mode::ChooseQuizTopic => "choose_quiz_topic",
            Mode::Quiz => "quiz",
            Mode::TrueFalse => "truefalse",
        };
        f.write_str(name)
    }
}

/// Dialog state. Each variant carries exactly the fields meaningful in that mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DialogState {
    /// No mode selected (process start, or just after leaving a game)
    #[default]
    Idle,

    /// Main menu shown
    Main,

    /// Free conversation with the assistant
    Gpt,

    /// Persona list shown, waiting for a choice
    ChoosePersonality,

    /// Conversation with a persona
    Talk { persona_name: String },

    /// Topic list shown, waiting for a choice
    ChooseQuizTopic,

    /// Quiz in progress
    Quiz {
        topic: QuizTopic,
        correct_answers: u32,
    },

    /// True/false game in progress
    TrueFalse {
        score: u32,
        /// Last statement shown
        current_statement: Option<String>,
    },
}

impl DialogState {
    pub fn mode(&self) -> Mode {
        match self {
            DialogState::Idle => Mode::None,
            DialogState::Main => Mode::Main,
            DialogState::Gpt => Mode::Gpt,
            DialogState::ChoosePersonality => Mode::ChoosePersonality,
            DialogState::Talk { .. } => Mode::Talk,
            DialogState::ChooseQuizTopic => Mode::ChooseQuizTopic,
            DialogState::Quiz { .. } => Mode::Quiz,
            DialogState::TrueFalse { .. } => Mode::TrueFalse,
        }
    }

    /// Correct quiz answers so far; zero outside a quiz
    pub fn correct_answers(&self) -> u32 {
        match self {
            DialogState::Quiz {
                correct_answers, ..
            } => *correct_answers,
            _ => 0,
        }
    }

    /// True/false score so far; zero outside the game
    pub fn true_false_score(&self) -> u32 {
        match self {
            DialogState::TrueFalse { score, .. } => *score,
            _ => 0,
        }
    }

    pub fn persona_name(&self) -> Option<&str> {
        match self {
            DialogState::Talk { persona_name } => Some(persona_name),
            _ => None,
        }
    }

    pub fn quiz_topic(&self) -> Option<QuizTopic> {
        match self {
            DialogState::Quiz { topic, .. } => Some(*topic),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn true_false_statement(&self) -> Option<&str> {
        match self {
            DialogState::TrueFalse {
                current_statement, ..
            } => current_statement.as_deref(),
            _ => None,
        }
    }
}

// ============================================================================
// Dialog Context
// ============================================================================

/// Immutable configuration available to every transition
#[derive(Debug, Clone)]
pub struct DialogContext {
    pub personas: Arc<PersonaRegistry>,
}

impl DialogContext {
    pub fn new(personas: Arc<PersonaRegistry>) -> Self {
        Self { personas }
    }
}
