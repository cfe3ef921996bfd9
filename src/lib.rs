//! # Turn Duel
//!
//! A turn engine for two-party text simulations where each party is played
//! by a remote text-generation service.
//!
//! ## Features
//!
//! - **Turn Engine**: Round-robin turn ownership with operator-confirmed end of turn
//! - **Memory Store**: Per-party private memory, either replaced each reply or capped to the last few entries
//! - **Shared State Channel**: Public snapshots broadcast to everyone or targeted at the next party
//! - **Prompt Composer**: Deterministic prompt assembly that consumes one-shot facts exactly once
//! - **Reply Contract**: JSON replies validated by key presence with bounded corrective retries
//! - **LLM Integration**: Built-in client for OpenAI-compatible chat completion endpoints
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use turn_duel::{ChatCompletionsClient, ConsoleOperator, FileTranscript, SessionConfig, TurnEngine};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = SessionConfig::load("session.json")?;
//! let llm = ChatCompletionsClient::new(config.service.clone(), config.resolve_api_key());
//! let transcript = FileTranscript::new(&config.log_dir)?;
//! let operator = ConsoleOperator::new(config.phase_entry.label.clone());
//!
//! let mut engine = TurnEngine::new(&config, Arc::new(llm), operator, Arc::new(transcript))?;
//! let summary = engine.run().await?;
//! println!("{} turns completed", summary.turns_completed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod memory;
pub mod operator;
pub mod parser;
pub mod prompts;
pub mod retry;
pub mod shared;
pub mod traits;
pub mod transcript;
pub mod turn;
pub mod types;

// Re-export main types for convenience
pub use config::{MemoryConfig, PartyConfig, PhaseEntryConfig, SessionConfig};
pub use engine::{CycleOutcome, SessionSummary, TurnEngine};
pub use error::{ContractViolation, Result, SessionError};
pub use llm::{ChatCompletionsClient, LlmClient, ServiceConfig};
pub use memory::{MemoryStore, MessageHistory};
pub use operator::ConsoleOperator;
pub use parser::ReplyContract;
pub use prompts::{LastDecisionPolicy, PromptComposer, PromptLoader};
pub use retry::{AcceptedReply, ReplyValidator};
pub use shared::{DeliveryPolicy, SharedStateChannel};
pub use traits::{Announcement, EntryKind, Operator, OperatorPrompt, Transcript};
pub use transcript::{FileTranscript, MemoryTranscript};
pub use turn::{TurnMachine, TurnState};
pub use types::{Party, PlayOrder, SharedSnapshot, StructuredReply};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
