//! Events that drive the dialog

/// What a model reply is for. Echoed back on [`Event::ModelReply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPurpose {
    /// Reply in GPT or persona conversation, replaces the placeholder
    Conversation,
    /// Quiz question (first one, or after "more")
    QuizQuestion,
    /// Verdict on a quiz answer
    QuizJudgment,
    /// New true/false statement
    TrueFalseStatement,
    /// Verdict on a true/false answer
    TrueFalseJudgment,
    /// Side-channel random fact
    RandomFact,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Commands
    Start,
    RandomFact,
    GptStart,
    TalkStart,
    QuizStart,
    TrueFalseStart,

    // Free text
    FreeText { text: String },
    ConversationTurn { text: String },
    QuizAnswer { text: String },

    // Buttons
    PersonalityChosen { key: String },
    QuizTopicChosen { key: String },
    QuizContinue { choice: String },
    TrueFalseNext,
    TrueFalseAnswer { choice: String },
    TrueFalseContinue { choice: String },
    UnknownAction { data: String },

    // Model
    ModelReply { purpose: TurnPurpose, text: String },
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::RandomFact => "random_fact",
            Event::GptStart => "gpt_start",
            Event::TalkStart => "talk_start",
            Event::QuizStart => "quiz_start",
            Event::TrueFalseStart => "truefalse_start",
            Event::FreeText { .. } => "free_text",
            Event::ConversationTurn { .. } => "conversation_turn",
            Event::QuizAnswer { .. } => "quiz_answer",
            Event::PersonalityChosen { .. } => "personality_chosen",
            Event::QuizTopicChosen { .. } => "quiz_topic_chosen",
            Event::QuizContinue { .. } => "quiz_continue",
            Event::TrueFalseNext => "truefalse_next",
            Event::TrueFalseAnswer { .. } => "truefalse_answer",
            Event::TrueFalseContinue { .. } => "truefalse_continue",
            Event::UnknownAction { .. } => "unknown_action",
            Event::ModelReply { .. } => "model_reply",
        }
    }
}
