//! Mode controller
//!
//! Owns one dialog state and one language model session, and executes the
//! effects the pure transition function asks for.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{ModeController, FAILURE_NOTICE};
pub use traits::*;

use crate::content::ContentError;
use crate::llm::LlmError;
use thiserror::Error;

/// Errors that end the handling of an inbound event
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("model request failed: {0}")]
    Llm(#[from] LlmError),
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Content(#[from] ContentError),
}
