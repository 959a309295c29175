//! Dialog mode state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! the controller feeds events in, executes the returned effects, and feeds
//! model replies back in as events.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Button, Effect};
pub use event::{Event, TurnPurpose};
pub use state::{DialogContext, DialogState, Mode, QuizTopic};
pub use transition::{transition, TransitionError, TransitionResult};
