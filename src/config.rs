//! Session configuration, loaded once before the first cycle.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SessionError};
use crate::llm::ServiceConfig;
use crate::memory::{MemoryStore, DEFAULT_HISTORY_MESSAGES, DEFAULT_MEMORY_ENTRIES};
use crate::parser::ReplyContract;
use crate::prompts::LastDecisionPolicy;
use crate::retry::DEFAULT_MAX_ATTEMPTS;
use crate::shared::DeliveryPolicy;
use crate::types::{Party, PlayOrder};

/// Environment variable consulted for the service API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// One side of the session as written in the session file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyConfig {
    /// Display name, also used to pick the transcript file.
    pub name: String,
    /// Whether this party acts first or second.
    pub order: PlayOrder,
    /// Decklist text repeated in every prompt for reference.
    pub deck: String,
    /// Initial setup shown with the first-turn framing.
    pub setup: String,
}

/// Which memory strategy every party uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryConfig {
    #[default]
    Replace,
    Capped {
        #[serde(default = "default_entries")]
        entries: usize,
        #[serde(default = "default_history")]
        history: usize,
    },
}

impl MemoryConfig {
    /// A fresh, empty store of the configured kind.
    pub fn build(&self) -> MemoryStore {
        match *self {
            MemoryConfig::Replace => MemoryStore::replace(),
            MemoryConfig::Capped { entries, history } => MemoryStore::capped(entries, history),
        }
    }
}

fn default_entries() -> usize {
    DEFAULT_MEMORY_ENTRIES
}

fn default_history() -> usize {
    DEFAULT_HISTORY_MESSAGES
}

/// Operator interaction when a new party becomes active
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseEntryConfig {
    /// Ask the operator for an injected fact, e.g. the drawn card.
    pub draw: bool,
    /// Ask the operator for an updated public snapshot.
    pub public_state: bool,
    /// Label the injected fact carries in prompts.
    pub label: String,
}

impl Default for PhaseEntryConfig {
    fn default() -> Self {
        Self {
            draw: true,
            public_state: false,
            label: "Drawn card".to_string(),
        }
    }
}

/// Everything a session needs, read from one JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the game, substituted into the framing templates.
    #[serde(default = "default_game")]
    pub game: String,
    /// The two parties, in any order; turn order comes from `PartyConfig::order`.
    pub parties: Vec<PartyConfig>,
    /// Keys a reply must and may carry.
    #[serde(default)]
    pub contract: ReplyContract,
    /// Who receives a published public snapshot.
    #[serde(default)]
    pub delivery: DeliveryPolicy,
    /// Memory strategy shared by every party.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Whether the last-decisions reminder is shown once or until replaced.
    #[serde(default)]
    pub last_decision: LastDecisionPolicy,
    /// Generation attempts per cycle before the session fails.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub phase_entry: PhaseEntryConfig,
    /// Endpoint, model and sampling settings for the generation service.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Overrides the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Directory for per-party transcript files.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Optional `initial.md`/`continuation.md` overrides.
    #[serde(default)]
    pub prompts_dir: Option<PathBuf>,
}

fn default_game() -> String {
    "a trading card game".to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl SessionConfig {
    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("cannot read {path:?}: {e}")))?;
        Self::from_json(&content)
    }

    /// Parses and validates configuration text.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(content)
            .map_err(|e| SessionError::Config(format!("invalid session file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// File key first, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Fails fast on anything that would break the session mid-game.
    pub fn validate(&self) -> Result<()> {
        if self.parties.len() != 2 {
            return Err(config_error(format!(
                "exactly two parties are required, found {}",
                self.parties.len()
            )));
        }

        let mut names = HashSet::new();
        let mut orders = HashSet::new();
        for party in &self.parties {
            if party.name.trim().is_empty() {
                return Err(config_error("party name must not be empty"));
            }
            if !names.insert(party.name.as_str()) {
                return Err(config_error(format!("duplicate party name {}", party.name)));
            }
            if !orders.insert(party.order) {
                return Err(config_error(format!("two parties play {}", party.order)));
            }
            if party.deck.trim().is_empty() {
                return Err(config_error(format!("no deck found for {}", party.name)));
            }
            if party.setup.trim().is_empty() {
                return Err(config_error(format!("no initial setup found for {}", party.name)));
            }
        }

        let missing = self.contract.missing_mandatory();
        if !missing.is_empty() {
            return Err(config_error(format!(
                "reply contract must require {}",
                missing.join(", ")
            )));
        }
        if self.max_attempts == 0 {
            return Err(config_error("max_attempts must be at least 1"));
        }
        if let MemoryConfig::Capped { entries, history } = self.memory {
            if entries == 0 || history == 0 {
                return Err(config_error("capped memory sizes must be at least 1"));
            }
        }
        Ok(())
    }

    /// Parties in turn order, each with a fresh memory store.
    pub fn build_parties(&self) -> Vec<Party> {
        let mut ordered: Vec<&PartyConfig> = self.parties.iter().collect();
        ordered.sort_by_key(|p| p.order);
        ordered
            .into_iter()
            .map(|p| {
                Party::new(
                    p.name.clone(),
                    p.deck.clone(),
                    p.setup.clone(),
                    p.order,
                    self.memory.build(),
                )
            })
            .collect()
    }
}

fn config_error(message: impl Into<String>) -> SessionError {
    SessionError::Config(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "parties": [
            {"name": "Player2", "order": "second", "deck": "d2", "setup": "s2"},
            {"name": "Player1", "order": "first", "deck": "d1", "setup": "s1"}
        ]
    }"#;

    #[test]
    fn minimal_file_gets_defaults_and_order() {
        let config = SessionConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.parties.len(), 2);
        assert_eq!(config.delivery, DeliveryPolicy::Broadcast);
        assert_eq!(config.memory, MemoryConfig::Replace);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.contract, ReplyContract::default());
        assert!(config.phase_entry.draw);
    }

    #[test]
    fn capped_memory_uses_default_sizes() {
        let json = MINIMAL.replacen('{', r#"{"memory": {"kind": "capped"}, "#, 1);
        let config = SessionConfig::from_json(&json).unwrap();
        assert_eq!(
            config.memory,
            MemoryConfig::Capped {
                entries: 5,
                history: 10
            }
        );
    }

    #[test]
    fn missing_deck_fails_fast() {
        let json = MINIMAL.replace("\"d1\"", "\"\"");
        let err = SessionConfig::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("no deck found for Player1"));
    }

    #[test]
    fn duplicate_order_is_rejected() {
        let json = MINIMAL.replace("\"second\"", "\"first\"");
        assert!(matches!(
            SessionConfig::from_json(&json),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn contract_must_require_engine_keys() {
        let json = MINIMAL.replacen(
            '{',
            r#"{"contract": {"required": ["memory", "decisions"]}, "#,
            1,
        );
        let err = SessionConfig::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("end_turn"));
    }

    #[test]
    fn parties_are_built_with_configured_memory() {
        let json = MINIMAL.replacen('{', r#"{"memory": {"kind": "capped", "entries": 2}, "#, 1);
        let parties = SessionConfig::from_json(&json).unwrap().build_parties();
        assert_eq!(parties.len(), 2);
        assert!(parties.iter().all(|p| p.memory.history().is_some()));
    }

    #[test]
    fn parties_are_built_in_play_order() {
        let config: SessionConfig = serde_json::from_str(MINIMAL).unwrap();
        let parties = config.build_parties();
        assert_eq!(parties[0].name, "Player1");
        assert_eq!(parties[0].order, PlayOrder::First);
        assert_eq!(parties[1].name, "Player2");
    }
}
