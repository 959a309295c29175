//! Pure state transition function
//!
//! Given the current dialog state and an event, decides the next state and
//! the effects (outbound content, session priming, model turns) to execute.
//! No I/O happens here.

use super::{Button, DialogContext, DialogState, Effect, Event, Mode, QuizTopic, TurnPurpose};
use thiserror::Error;

/// Substring of a quiz verdict that marks the answer as correct
pub const QUIZ_CORRECT_MARKER: &str = "Правильно!";

/// Substring of a true/false verdict that marks the answer as correct
pub const TRUE_FALSE_CORRECT_MARKER: &str = "Верно!";

/// User turn asking the quiz prompt for another question
const QUIZ_MORE_SENTINEL: &str = "more";

/// User turn asking the true/false prompt for another statement
const TRUE_FALSE_NEXT_SENTINEL: &str = "next";

const THINKING_PLACEHOLDER: &str = "Думаю над ответом...";
const PERSONA_NOT_FOUND: &str = "Выбранная личность не найдена.";
const TOPIC_NOT_FOUND: &str = "Нет такой темы.";
const INVALID_CHOICE: &str = "Неверный выбор.";

/// Commands registered as the bot menu, in display order
const MAIN_MENU: [(&str, &str); 6] = [
    ("start", "Главное меню"),
    ("random", "Узнать случайный интересный факт 🧠"),
    ("gpt", "Задать вопрос чату GPT 🤖"),
    ("talk", "Поговорить с известной личностью 👤"),
    ("quiz", "Поучаствовать в квизе ❓"),
    ("truefalse", "Игра \"Правда или ложь\" 🎲"),
];

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DialogState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DialogState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition.
///
/// Only reachable when an operation is invoked directly in a mode that does
/// not own it; inbound routing never produces them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{event} is not valid in mode {mode}")]
    ModeMismatch { event: &'static str, mode: Mode },
    #[error("Unexpected {purpose:?} reply in mode {mode}")]
    UnexpectedReply { purpose: TurnPurpose, mode: Mode },
}

/// Quiz follow-up choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuizChoice {
    More,
    Exit,
}

impl QuizChoice {
    fn parse(choice: &str) -> Option<Self> {
        match choice.strip_prefix("quiz_").unwrap_or(choice) {
            "more" => Some(Self::More),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// True/false follow-up choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameChoice {
    Next,
    Exit,
}

impl GameChoice {
    fn parse(choice: &str) -> Option<Self> {
        match choice.strip_prefix("truefalse_").unwrap_or(choice) {
            "next" => Some(Self::Next),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Word sent to the model for a true/false answer button
fn true_false_word(choice: &str) -> Option<&'static str> {
    match choice.strip_prefix("truefalse_").unwrap_or(choice) {
        "true" => Some("Правда"),
        "false" => Some("Ложь"),
        _ => None,
    }
}

/// Pure transition function
#[allow(clippy::too_many_lines)] // One arm per operation reads best as a single match
pub fn transition(
    state: &DialogState,
    context: &DialogContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let mode = state.mode();

    match (state, event) {
        // ============================================================
        // Main menu
        // ============================================================
        (_, Event::Start) => Ok(start()),

        // ============================================================
        // Random fact (side channel, any mode)
        // ============================================================
        (_, Event::RandomFact) => Ok(TransitionResult::new(state.clone())
            .with_effect(Effect::image("random"))
            .with_effect(Effect::QueryOnce {
                prompt_key: "random".to_string(),
                purpose: TurnPurpose::RandomFact,
            })),

        (
            _,
            Event::ModelReply {
                purpose: TurnPurpose::RandomFact,
                text,
            },
        ) => Ok(
            TransitionResult::new(state.clone()).with_effect(Effect::buttons(
                text,
                vec![Button::new("random", "Узнать другой случайный факт 🧠")],
            )),
        ),

        // ============================================================
        // GPT and persona conversation
        // ============================================================
        (_, Event::GptStart) => Ok(TransitionResult::new(DialogState::Gpt).with_effects([
            Effect::install_prompt("gpt"),
            Effect::image("gpt"),
            Effect::message("gpt"),
        ])),

        (_, Event::TalkStart) => {
            let buttons = context
                .personas
                .iter()
                .map(|p| Button::new(&p.key, &p.name))
                .collect();
            Ok(
                TransitionResult::new(DialogState::ChoosePersonality).with_effects([
                    Effect::image("talk"),
                    Effect::SendMessageButtons {
                        key: "talk".to_string(),
                        buttons,
                    },
                ]),
            )
        }

        (DialogState::ChoosePersonality, Event::PersonalityChosen { key }) => {
            let Some(persona) = context.personas.get(&key) else {
                return Ok(
                    TransitionResult::new(state.clone()).with_effect(Effect::text(PERSONA_NOT_FOUND))
                );
            };
            Ok(TransitionResult::new(DialogState::Talk {
                persona_name: persona.short_name().to_string(),
            })
            .with_effects([
                Effect::install_prompt(&persona.prompt_file),
                Effect::image(&persona.key),
                Effect::text(format!(
                    "Вы выбрали: {}\nТеперь вы можете начать диалог.",
                    persona.name
                )),
            ]))
        }

        // Free text means a conversation turn or a quiz answer, by mode
        (DialogState::Gpt | DialogState::Talk { .. }, Event::FreeText { text }) => {
            transition(state, context, Event::ConversationTurn { text })
        }
        (DialogState::Quiz { .. }, Event::FreeText { text }) => {
            transition(state, context, Event::QuizAnswer { text })
        }

        (DialogState::Gpt | DialogState::Talk { .. }, Event::ConversationTurn { text }) => {
            let placeholder = state
                .persona_name()
                .map_or_else(|| THINKING_PLACEHOLDER.to_string(), |name| format!("{name} думает..."));
            Ok(TransitionResult::new(state.clone()).with_effects([
                Effect::SendPlaceholder { text: placeholder },
                Effect::request_turn(text, TurnPurpose::Conversation),
            ]))
        }

        (
            DialogState::Gpt | DialogState::Talk { .. },
            Event::ModelReply {
                purpose: TurnPurpose::Conversation,
                text,
            },
        ) => Ok(TransitionResult::new(state.clone()).with_effect(Effect::EditPlaceholder { text })),

        // ============================================================
        // Quiz
        // ============================================================
        (_, Event::QuizStart) => {
            let buttons = QuizTopic::ALL
                .into_iter()
                .map(|t| Button::new(t.key(), t.label()))
                .collect();
            Ok(
                TransitionResult::new(DialogState::ChooseQuizTopic).with_effects([
                    Effect::image("quiz"),
                    Effect::SendMessageButtons {
                        key: "quiz".to_string(),
                        buttons,
                    },
                ]),
            )
        }

        (DialogState::ChooseQuizTopic, Event::QuizTopicChosen { key }) => {
            let Some(topic) = QuizTopic::from_key(&key) else {
                return Ok(
                    TransitionResult::new(state.clone()).with_effect(Effect::text(TOPIC_NOT_FOUND))
                );
            };
            Ok(TransitionResult::new(DialogState::Quiz {
                topic,
                correct_answers: 0,
            })
            .with_effects([
                Effect::install_prompt("quiz"),
                Effect::request_turn(topic.key(), TurnPurpose::QuizQuestion),
            ]))
        }

        (
            DialogState::Quiz { .. },
            Event::ModelReply {
                purpose: TurnPurpose::QuizQuestion,
                text,
            },
        ) => Ok(TransitionResult::new(state.clone()).with_effect(Effect::text(text))),

        (DialogState::Quiz { .. }, Event::QuizAnswer { text }) => {
            Ok(TransitionResult::new(state.clone())
                .with_effect(Effect::request_turn(text, TurnPurpose::QuizJudgment)))
        }

        (
            DialogState::Quiz {
                topic,
                correct_answers,
            },
            Event::ModelReply {
                purpose: TurnPurpose::QuizJudgment,
                text,
            },
        ) => {
            let correct_answers = correct_answers + u32::from(text.contains(QUIZ_CORRECT_MARKER));
            Ok(TransitionResult::new(DialogState::Quiz {
                topic: *topic,
                correct_answers,
            })
            .with_effect(Effect::buttons(
                format!("{text}\n\nПравильных ответов: {correct_answers}"),
                vec![
                    Button::new("quiz_more", "Следующий вопрос 🔄"),
                    Button::new("quiz_exit", "Завершить викторину 🏁"),
                ],
            )))
        }

        (DialogState::Quiz { .. }, Event::QuizContinue { choice }) => {
            match QuizChoice::parse(&choice) {
                Some(QuizChoice::More) => Ok(TransitionResult::new(state.clone()).with_effect(
                    Effect::request_turn(QUIZ_MORE_SENTINEL, TurnPurpose::QuizQuestion),
                )),
                Some(QuizChoice::Exit) => Ok(finish_with_summary(format!(
                    "Викторина завершена! Вы набрали {} правильных ответов.",
                    state.correct_answers()
                ))),
                None => Ok(TransitionResult::new(state.clone()).with_effect(Effect::text(INVALID_CHOICE))),
            }
        }

        // ============================================================
        // True / false game
        // ============================================================
        (_, Event::TrueFalseStart) => Ok(TransitionResult::new(DialogState::TrueFalse {
            score: 0,
            current_statement: None,
        })
        .with_effects([
            Effect::ResetHistory,
            Effect::install_prompt("truefalse"),
            Effect::image("truefalse"),
            Effect::message("truefalse"),
        ])
        .with_effect(next_statement())),

        (DialogState::TrueFalse { .. }, Event::TrueFalseNext) => {
            Ok(TransitionResult::new(state.clone()).with_effect(next_statement()))
        }

        (
            DialogState::TrueFalse { score, .. },
            Event::ModelReply {
                purpose: TurnPurpose::TrueFalseStatement,
                text,
            },
        ) => Ok(TransitionResult::new(DialogState::TrueFalse {
            score: *score,
            current_statement: Some(text.clone()),
        })
        .with_effect(Effect::buttons(
            text,
            vec![
                Button::new("truefalse_true", "Правда ✅"),
                Button::new("truefalse_false", "Ложь ❌"),
            ],
        ))),

        (DialogState::TrueFalse { .. }, Event::TrueFalseAnswer { choice }) => {
            match true_false_word(&choice) {
                Some(word) => Ok(TransitionResult::new(state.clone())
                    .with_effect(Effect::request_turn(word, TurnPurpose::TrueFalseJudgment))),
                None => Ok(TransitionResult::new(state.clone()).with_effect(Effect::text(INVALID_CHOICE))),
            }
        }

        (
            DialogState::TrueFalse {
                score,
                current_statement,
            },
            Event::ModelReply {
                purpose: TurnPurpose::TrueFalseJudgment,
                text,
            },
        ) => {
            let score = score + u32::from(text.contains(TRUE_FALSE_CORRECT_MARKER));
            Ok(TransitionResult::new(DialogState::TrueFalse {
                score,
                current_statement: current_statement.clone(),
            })
            .with_effect(Effect::buttons(
                format!("{text}\n\nВаш счёт: {score}"),
                vec![
                    Button::new("truefalse_next", "Следующее утверждение ▶️"),
                    Button::new("truefalse_exit", "Завершить игру 🛑"),
                ],
            )))
        }

        (DialogState::TrueFalse { .. }, Event::TrueFalseContinue { choice }) => {
            match GameChoice::parse(&choice) {
                Some(GameChoice::Next) => transition(state, context, Event::TrueFalseNext),
                Some(GameChoice::Exit) => Ok(finish_with_summary(format!(
                    "Игра окончена! Ваш итоговый счёт: {}.",
                    state.true_false_score()
                ))),
                None => Ok(TransitionResult::new(state.clone()).with_effect(Effect::text(INVALID_CHOICE))),
            }
        }

        // ============================================================
        // Fallbacks
        // ============================================================

        // Free text outside a conversation or quiz falls back to the main menu
        (_, Event::FreeText { .. }) => Ok(start()),

        // Buttons from a keyboard whose mode is no longer active
        (
            _,
            Event::PersonalityChosen { key: data }
            | Event::QuizTopicChosen { key: data }
            | Event::QuizContinue { choice: data }
            | Event::TrueFalseAnswer { choice: data }
            | Event::TrueFalseContinue { choice: data }
            | Event::UnknownAction { data },
        ) => Ok(unrecognized_action(state, &data)),

        (_, event @ (Event::ConversationTurn { .. } | Event::QuizAnswer { .. } | Event::TrueFalseNext)) => {
            Err(TransitionError::ModeMismatch {
                event: event.name(),
                mode,
            })
        }

        (_, Event::ModelReply { purpose, .. }) => {
            Err(TransitionError::UnexpectedReply { purpose, mode })
        }
    }
}

// Helper functions

fn start() -> TransitionResult {
    let commands = MAIN_MENU
        .iter()
        .map(|(name, label)| ((*name).to_string(), (*label).to_string()))
        .collect();
    TransitionResult::new(DialogState::Main).with_effects([
        Effect::image("main"),
        Effect::message("main"),
        Effect::ShowMainMenu { commands },
    ])
}

/// Closing summary, leave the game, then show the main menu
fn finish_with_summary(summary: String) -> TransitionResult {
    let menu = start();
    TransitionResult::new(menu.new_state)
        .with_effect(Effect::text(summary))
        .with_effects(menu.effects)
}

fn next_statement() -> Effect {
    Effect::request_turn(TRUE_FALSE_NEXT_SENTINEL, TurnPurpose::TrueFalseStatement)
}

fn unrecognized_action(state: &DialogState, data: &str) -> TransitionResult {
    TransitionResult::new(state.clone()).with_effect(Effect::text(format!(
        "Вы нажали на кнопку: {data}"
    )))
}
