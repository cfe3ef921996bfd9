use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;

use crate::types::canonical_text;

/// Default number of memory entries kept by the capped store
pub const DEFAULT_MEMORY_ENTRIES: usize = 5;
/// Default number of messages kept in the recent history
pub const DEFAULT_HISTORY_MESSAGES: usize = 10;

/// A party's private recollection of the game.
///
/// The text is opaque to the engine: it is stored and replayed, never
/// interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryStore {
    /// Each update wholly replaces the previous memory.
    Replace { text: String },
    /// Updates are appended and only the most recent `limit` survive.
    Capped {
        entries: VecDeque<String>,
        limit: usize,
        history: MessageHistory,
    },
}

impl MemoryStore {
    /// Memory that holds only the latest update.
    pub fn replace() -> Self {
        MemoryStore::Replace { text: String::new() }
    }

    /// Memory keeping the last `limit` entries plus `history_limit` recent messages.
    pub fn capped(limit: usize, history_limit: usize) -> Self {
        MemoryStore::Capped {
            entries: VecDeque::with_capacity(limit + 1),
            limit,
            history: MessageHistory::new(history_limit),
        }
    }

    /// Stores an update plus any extra facts the party asked to keep.
    pub fn record(&mut self, update: &Value, extra: Option<&Value>) {
        match self {
            MemoryStore::Replace { text } => {
                *text = canonical_text(update);
                if let Some(extra) = extra {
                    text.push('\n');
                    text.push_str(&canonical_text(extra));
                }
            }
            MemoryStore::Capped { entries, limit, .. } => {
                for value in std::iter::once(update).chain(extra) {
                    let entry = canonical_text(value).trim().to_string();
                    if !entry.is_empty() {
                        entries.push_back(entry);
                    }
                }
                while entries.len() > *limit {
                    entries.pop_front();
                }
            }
        }
    }

    /// Current memory as one block of text, oldest entry first.
    pub fn read(&self) -> String {
        match self {
            MemoryStore::Replace { text } => text.clone(),
            MemoryStore::Capped { entries, .. } => {
                entries.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
            }
        }
    }

    /// True when nothing is remembered.
    pub fn is_empty(&self) -> bool {
        match self {
            MemoryStore::Replace { text } => text.is_empty(),
            MemoryStore::Capped { entries, .. } => entries.is_empty(),
        }
    }

    /// Recent exchange history, only tracked by the capped variant.
    pub fn history(&self) -> Option<&MessageHistory> {
        match self {
            MemoryStore::Capped { history, .. } => Some(history),
            MemoryStore::Replace { .. } => None,
        }
    }

    /// Adds a prompt and its raw reply to the history. No-op for the replace variant.
    pub fn remember_exchange(&mut self, prompt: &str, reply: &str) {
        if let MemoryStore::Capped { history, .. } = self {
            history.push(Role::User, prompt);
            history.push(Role::Assistant, reply);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

/// Sliding window over the last few messages exchanged by one party
#[derive(Debug, Clone, PartialEq)]
pub struct MessageHistory {
    messages: VecDeque<HistoryMessage>,
    limit: usize,
}

impl MessageHistory {
    /// Empty history holding at most `limit` messages.
    pub fn new(limit: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(limit + 1),
            limit,
        }
    }

    /// Appends a message, dropping the oldest once full.
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push_back(HistoryMessage {
            role,
            content: content.into(),
        });
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &HistoryMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Comma separated roles, e.g. `user,assistant,user`.
    pub fn role_summary(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.role.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replace_keeps_only_latest_update() {
        let mut memory = MemoryStore::replace();
        memory.record(&json!("hand: A, B"), None);
        memory.record(&json!("hand: B"), Some(&json!("opponent has 5 prizes")));
        assert_eq!(memory.read(), "hand: B\nopponent has 5 prizes");
    }

    #[test]
    fn structured_updates_are_stored_as_json_text() {
        let mut memory = MemoryStore::replace();
        memory.record(&json!({"hand": ["A"]}), None);
        assert_eq!(memory.read(), r#"{"hand":["A"]}"#);
    }

    #[test]
    fn capped_keeps_last_five_oldest_first() {
        let mut memory = MemoryStore::capped(5, DEFAULT_HISTORY_MESSAGES);
        for i in 1..=7 {
            memory.record(&json!(format!("entry {i}")), None);
        }
        assert_eq!(
            memory.read(),
            "entry 3\nentry 4\nentry 5\nentry 6\nentry 7"
        );
    }

    #[test]
    fn capped_counts_extra_facts_as_entries() {
        let mut memory = MemoryStore::capped(2, DEFAULT_HISTORY_MESSAGES);
        memory.record(&json!("old"), None);
        memory.record(&json!("new"), Some(&json!("extra")));
        assert_eq!(memory.read(), "new\nextra");
    }

    #[test]
    fn history_is_capped_and_summarized() {
        let mut memory = MemoryStore::capped(5, 3);
        memory.remember_exchange("p1", "r1");
        memory.remember_exchange("p2", "r2");
        let history = memory.history().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.role_summary(), "assistant,user,assistant");
    }

    #[test]
    fn replace_variant_tracks_no_history() {
        let mut memory = MemoryStore::replace();
        memory.remember_exchange("p", "r");
        assert!(memory.history().is_none());
        assert!(memory.is_empty());
    }
}
