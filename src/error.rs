//! Error types surfaced by the turn engine.

use thiserror::Error;

use crate::turn::TurnState;

/// Why a single generated reply was rejected.
///
/// Parse failures and missing keys are treated the same way by the retry
/// controller; the variants only exist to make the diagnosis readable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// The cleaned reply text is not JSON at all.
    #[error("reply is not valid JSON: {0}")]
    Malformed(String),

    /// The reply parsed, but not into an object.
    #[error("reply is JSON but not an object")]
    NotAnObject,

    /// The reply is an object without every required key.
    #[error("reply is missing required keys: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session configuration is incomplete or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Every attempt produced a reply that violated the contract.
    #[error(
        "{party} failed to return a valid reply after {attempts} attempts; \
         last error: {last_error}; last raw reply: {last_raw:?}"
    )]
    RepliesExhausted {
        party: String,
        attempts: u32,
        last_error: ContractViolation,
        last_raw: String,
    },

    /// The generation service itself failed. The message carries the cause chain.
    #[error("generation service call failed for {party}: {source:#}")]
    Service {
        party: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The operator boundary failed to deliver input.
    #[error("operator input failed: {0:#}")]
    Operator(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The turn machine was driven out of order.
    #[error("cannot {event} while {state:?}")]
    InvalidTransition { state: TurnState, event: &'static str },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SessionError>;
