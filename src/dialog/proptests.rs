//! Property-based tests for the dialog state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::{QUIZ_CORRECT_MARKER, TRUE_FALSE_CORRECT_MARKER};
use super::*;
use crate::content::{Persona, PersonaRegistry};
use crate::router::{route, Inbound};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> DialogContext {
    DialogContext::new(Arc::new(PersonaRegistry::new(vec![
        Persona::new("talk_tesla", "Tesla - Изобретатель ⚡", "talk_tesla"),
        Persona::new("talk_hawking", "Стивен Хокинг - Физик 🔭", "talk_hawking"),
    ])))
}

/// Apply an event, then feed a reply back for every model call it asks for.
///
/// Mirrors what the controller does with `RequestTurn` and `QueryOnce`.
fn run(
    state: DialogState,
    ctx: &DialogContext,
    event: Event,
    reply: &str,
) -> Result<DialogState, TransitionError> {
    let mut state = state;
    let mut pending = vec![event];

    while let Some(event) = pending.pop() {
        let result = transition(&state, ctx, event)?;
        state = result.new_state;
        for effect in result.effects {
            match effect {
                Effect::RequestTurn { purpose, .. } | Effect::QueryOnce { purpose, .. } => {
                    pending.push(Event::ModelReply {
                        purpose,
                        text: reply.to_string(),
                    });
                }
                _ => {}
            }
        }
    }

    Ok(state)
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_topic() -> impl Strategy<Value = QuizTopic> {
    prop_oneof![
        Just(QuizTopic::Programming),
        Just(QuizTopic::Math),
        Just(QuizTopic::Biology),
    ]
}

fn arb_state() -> impl Strategy<Value = DialogState> {
    prop_oneof![
        Just(DialogState::Idle),
        Just(DialogState::Main),
        Just(DialogState::Gpt),
        Just(DialogState::ChoosePersonality),
        "[A-Za-z]{1,10}".prop_map(|persona_name| DialogState::Talk { persona_name }),
        Just(DialogState::ChooseQuizTopic),
        (arb_topic(), 0u32..50).prop_map(|(topic, correct_answers)| DialogState::Quiz {
            topic,
            correct_answers
        }),
        (0u32..50, proptest::option::of("[a-z ]{1,20}")).prop_map(
            |(score, current_statement)| DialogState::TrueFalse {
                score,
                current_statement
            }
        ),
    ]
}

fn arb_button() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("random".to_string()),
        Just("talk_tesla".to_string()),
        Just("talk_hawking".to_string()),
        Just("quiz_prog".to_string()),
        Just("quiz_math".to_string()),
        Just("quiz_biology".to_string()),
        Just("quiz_more".to_string()),
        Just("quiz_exit".to_string()),
        Just("truefalse_true".to_string()),
        Just("truefalse_false".to_string()),
        Just("truefalse_next".to_string()),
        Just("truefalse_exit".to_string()),
        "(talk_|quiz_|truefalse_)?[a-z]{0,8}",
    ]
}

fn arb_inbound() -> impl Strategy<Value = Inbound> {
    prop_oneof![
        prop_oneof![
            Just("start"),
            Just("random"),
            Just("gpt"),
            Just("talk"),
            Just("quiz"),
            Just("truefalse"),
            Just("help"),
        ]
        .prop_map(|name| Inbound::Command(name.to_string())),
        "[a-zA-Zа-я0-9 ?!]{1,30}".prop_map(Inbound::Text),
        arb_button().prop_map(Inbound::ButtonPress),
    ]
}

fn arb_reply() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ]{0,30}",
        "[a-zA-Z ]{0,10}".prop_map(|s| format!("{QUIZ_CORRECT_MARKER} {s}")),
        "[a-zA-Z ]{0,10}".prop_map(|s| format!("{TRUE_FALSE_CORRECT_MARKER} {s}")),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Start resets everything from any state
    #[test]
    fn prop_start_always_reaches_main(state in arb_state()) {
        let result = transition(&state, &test_context(), Event::Start).unwrap();
        prop_assert_eq!(&result.new_state, &DialogState::Main);
        prop_assert_eq!(result.new_state.correct_answers(), 0);
        prop_assert_eq!(result.new_state.true_false_score(), 0);
    }

    // Anything the router produces is accepted in every mode
    #[test]
    fn prop_routed_events_never_fail(
        inbound in proptest::collection::vec((arb_inbound(), arb_reply()), 0..30)
    ) {
        let ctx = test_context();
        let mut state = DialogState::Idle;

        for (inbound, reply) in inbound {
            let event = route(inbound);
            let name = event.name();
            match run(state.clone(), &ctx, event, &reply) {
                Ok(next) => state = next,
                Err(e) => prop_assert!(false, "{} failed in {:?}: {}", name, state, e),
            }
        }
    }

    // Quiz score counts exactly the verdicts carrying the marker
    #[test]
    fn prop_quiz_score_counts_markers(
        topic in arb_topic(),
        verdicts in proptest::collection::vec(any::<bool>(), 0..20)
    ) {
        let ctx = test_context();
        let mut state = run(
            DialogState::ChooseQuizTopic,
            &ctx,
            Event::QuizTopicChosen { key: topic.key().to_string() },
            "Question?",
        ).unwrap();

        let mut expected = 0;
        for correct in verdicts {
            let previous = state.correct_answers();
            let verdict = if correct {
                format!("{QUIZ_CORRECT_MARKER} Well done")
            } else {
                "Неправильно.".to_string()
            };
            state = run(state, &ctx, Event::QuizAnswer { text: "answer".to_string() }, &verdict).unwrap();
            expected += u32::from(correct);

            prop_assert!(state.correct_answers() >= previous);
            prop_assert_eq!(state.correct_answers(), expected);
            prop_assert_eq!(state.quiz_topic(), Some(topic));
        }
    }

    // True/false score counts exactly the verdicts carrying the marker
    #[test]
    fn prop_true_false_score_counts_markers(
        rounds in proptest::collection::vec((any::<bool>(), any::<bool>()), 0..20)
    ) {
        let ctx = test_context();
        let mut state = run(DialogState::Main, &ctx, Event::TrueFalseStart, "Statement").unwrap();

        let mut expected = 0;
        for (says_true, correct) in rounds {
            let verdict = if correct {
                format!("{TRUE_FALSE_CORRECT_MARKER} Так и есть")
            } else {
                "Неверно!".to_string()
            };
            let choice = if says_true { "truefalse_true" } else { "truefalse_false" };
            state = run(state, &ctx, Event::TrueFalseAnswer { choice: choice.to_string() }, &verdict).unwrap();
            expected += u32::from(correct);
            prop_assert_eq!(state.true_false_score(), expected);

            state = run(state, &ctx, Event::TrueFalseNext, "Statement").unwrap();
            prop_assert_eq!(state.true_false_score(), expected);
        }
    }

    // Unknown selection keys never change the mode
    #[test]
    fn prop_unknown_selection_keeps_mode(suffix in "[a-z]{1,10}") {
        prop_assume!(suffix != "tesla" && suffix != "hawking");
        prop_assume!(QuizTopic::from_key(&format!("quiz_{suffix}")).is_none());
        let ctx = test_context();

        let persona = transition(
            &DialogState::ChoosePersonality,
            &ctx,
            Event::PersonalityChosen { key: format!("talk_{suffix}") },
        ).unwrap();
        prop_assert_eq!(persona.new_state, DialogState::ChoosePersonality);

        let topic = transition(
            &DialogState::ChooseQuizTopic,
            &ctx,
            Event::QuizTopicChosen { key: format!("quiz_{suffix}") },
        ).unwrap();
        prop_assert_eq!(topic.new_state, DialogState::ChooseQuizTopic);
    }

    // Random facts leave the dialog state untouched
    #[test]
    fn prop_random_fact_keeps_state(state in arb_state(), fact in arb_reply()) {
        let next = run(state.clone(), &test_context(), Event::RandomFact, &fact).unwrap();
        prop_assert_eq!(next, state);
    }
}
