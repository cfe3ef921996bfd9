//! Bounded retry around the generation service.

use std::sync::Arc;

use crate::error::{ContractViolation, SessionError};
use crate::llm::LlmClient;
use crate::parser::ReplyContract;
use crate::types::StructuredReply;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// A reply that satisfied the contract, with the text that produced it.
#[derive(Debug, Clone)]
pub struct AcceptedReply {
    pub reply: StructuredReply,
    pub raw: String,
    pub attempts: u32,
}

/// Sends prompts and insists on a contract-conforming reply.
///
/// After each invalid reply the corrective instruction is appended to the
/// same prompt, so every retry strictly extends the one before it.
pub struct ReplyValidator {
    client: Arc<dyn LlmClient>,
    contract: ReplyContract,
    max_attempts: u32,
}

impl ReplyValidator {
    /// Validator with `max_attempts` tries per prompt (at least one).
    pub fn new(client: Arc<dyn LlmClient>, contract: ReplyContract, max_attempts: u32) -> Self {
        Self {
            client,
            contract,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn contract(&self) -> &ReplyContract {
        &self.contract
    }

    /// Attempts per prompt before giving up.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn execute(&self, party: &str, prompt: &str) -> crate::Result<AcceptedReply> {
        let mut current = prompt.to_string();
        let mut last_error: Option<ContractViolation> = None;
        let mut last_raw = String::new();

        for attempt in 1..=self.max_attempts {
            let raw = self
                .client
                .query(&current)
                .await
                .map_err(|e| SessionError::Service {
                    party: party.to_string(),
                    source: e.into(),
                })?;

            match self.contract.parse(&raw) {
                Ok(reply) => {
                    if attempt > 1 {
                        log::info!("{party} produced a valid reply on attempt {attempt}");
                    }
                    return Ok(AcceptedReply {
                        reply,
                        raw,
                        attempts: attempt,
                    });
                }
                Err(violation) => {
                    log::warn!(
                        "{party} reply rejected (attempt {attempt}/{}): {violation}",
                        self.max_attempts
                    );
                    if attempt < self.max_attempts {
                        current.push_str("\n\n");
                        current.push_str(&self.contract.corrective_instruction());
                    }
                    last_error = Some(violation);
                    last_raw = raw;
                }
            }
        }

        Err(SessionError::RepliesExhausted {
            party: party.to_string(),
            attempts: self.max_attempts,
            last_error: last_error.unwrap_or(ContractViolation::NotAnObject),
            last_raw,
        })
    }
}
