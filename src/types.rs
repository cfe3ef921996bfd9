use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::memory::MemoryStore;

/// Key carrying the party's updated private memory.
pub const MEMORY_KEY: &str = "memory";
/// Key carrying what the party decided to do.
pub const DECISIONS_KEY: &str = "decisions";
/// Key carrying the end-of-turn signal.
pub const END_TURN_KEY: &str = "end_turn";
/// Key carrying the public snapshot of the world.
pub const PUBLIC_INFO_KEY: &str = "public_info";
/// Key carrying extra facts the party wants to keep.
pub const TO_MEMORIZE_KEY: &str = "to_memorize";
/// Key carrying a request the operator has to resolve.
pub const OPERATOR_REQUEST_KEY: &str = "user_input_request";

/// Which slot of the turn order a party plays in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayOrder {
    First,
    Second,
}

impl fmt::Display for PlayOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayOrder::First => f.write_str("first"),
            PlayOrder::Second => f.write_str("second"),
        }
    }
}

/// A publicly visible world snapshot, kept opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedSnapshot(pub Value);

impl SharedSnapshot {
    /// Operator entries are taken as JSON when they parse, raw text otherwise.
    pub fn from_operator_text(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => Self(value),
            Err(_) => Self(Value::String(text.to_string())),
        }
    }

    /// Null, blank strings and empty containers carry nothing worth publishing.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }

    /// Prompt text for the board-state section.
    pub fn render(&self) -> String {
        canonical_text(&self.0)
    }
}

/// One of the turn-taking participants and everything it owns.
///
/// The `pending_*` fields and `entered_new_phase` are one-shot: the prompt
/// composer clears them as soon as they are read.
#[derive(Debug, Clone)]
pub struct Party {
    pub name: String,
    pub deck: String,
    pub setup: String,
    pub order: PlayOrder,
    /// Private memory, written only from the party's own replies.
    pub memory: MemoryStore,
    /// Set once the first reply is applied; picks the continuation framing.
    pub has_taken_turn: bool,
    /// Decisions from the most recent reply.
    pub last_decision: Option<String>,
    /// Operator-injected fact, e.g. the drawn card.
    pub pending_fact: Option<String>,
    /// Operator notes and end-turn corrections awaiting the next prompt.
    pub pending_note: Option<String>,
    pub entered_new_phase: bool,
    /// Public snapshot delivered by the shared state channel.
    pub incoming_shared: Option<SharedSnapshot>,
}

impl Party {
    /// A party that has not acted yet, with nothing pending.
    pub fn new(
        name: impl Into<String>,
        deck: impl Into<String>,
        setup: impl Into<String>,
        order: PlayOrder,
        memory: MemoryStore,
    ) -> Self {
        Self {
            name: name.into(),
            deck: deck.into(),
            setup: setup.into(),
            order,
            memory,
            has_taken_turn: false,
            last_decision: None,
            pending_fact: None,
            pending_note: None,
            entered_new_phase: false,
            incoming_shared: None,
        }
    }

    /// Appends an operator note; notes pile up until the next composition.
    pub fn push_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        match &mut self.pending_note {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(&note);
            }
            None => self.pending_note = Some(note),
        }
    }

    /// Flags that the next prompt opens with the new-turn marker.
    pub fn mark_phase_entry(&mut self) {
        self.entered_new_phase = true;
    }
}

/// A generated reply that passed the key-presence check.
///
/// Only the required keys are guaranteed; everything else is passed
/// through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredReply {
    fields: Map<String, Value>,
}

impl StructuredReply {
    pub(crate) fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Any top-level key, required or not.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The whole reply object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The party's memory update.
    pub fn memory(&self) -> Option<&Value> {
        self.get(MEMORY_KEY)
    }

    /// Decisions as display text; empty when the key is null.
    pub fn decisions(&self) -> String {
        self.text(DECISIONS_KEY).unwrap_or_default()
    }

    /// Booleans are taken as-is; strings count when they read "true" or "yes".
    pub fn end_turn(&self) -> bool {
        match self.get(END_TURN_KEY) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes")
            }
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            _ => false,
        }
    }

    /// The snapshot to publish, if the reply carries a non-empty one.
    pub fn public_info(&self) -> Option<SharedSnapshot> {
        self.get(PUBLIC_INFO_KEY)
            .cloned()
            .map(SharedSnapshot)
            .filter(|s| !s.is_empty())
    }

    /// Extra fact to keep alongside the memory update.
    pub fn to_memorize(&self) -> Option<&Value> {
        self.get(TO_MEMORIZE_KEY).filter(|v| !is_blank(v))
    }

    /// A question the party wants the operator to resolve.
    pub fn operator_request(&self) -> Option<String> {
        self.text(OPERATOR_REQUEST_KEY).filter(|s| !s.trim().is_empty())
    }

    fn text(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_null()).map(canonical_text)
    }
}

/// Strings pass through; any other value is stored as compact JSON.
pub fn canonical_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
