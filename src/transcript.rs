//! Transcript sinks for prompts, replies and operator input.

use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::traits::{EntryKind, Transcript};

/// Appends entries to `<log_dir>/<party>.log`.
pub struct FileTranscript {
    log_dir: PathBuf,
}

impl FileTranscript {
    /// Creates `log_dir` if needed. One file per party is appended to.
    pub fn new(log_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow::anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;
        Ok(Self { log_dir })
    }

    fn append(&self, party: &str, kind: EntryKind, content: &str) -> std::io::Result<()> {
        let path = self.log_dir.join(format!("{party}.log"));
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(format_entry(party, kind, content).as_bytes())
    }
}

impl Transcript for FileTranscript {
    fn record(&self, party: &str, kind: EntryKind, content: &str) {
        if let Err(e) = self.append(party, kind, content) {
            log::warn!("Failed to write {kind} entry for {party}: {e}");
        }
    }
}

/// Keeps entries in memory; handy for tests and dry runs.
#[derive(Default)]
pub struct MemoryTranscript {
    entries: Mutex<Vec<(String, EntryKind, String)>>,
}

impl MemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, EntryKind, String)> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Contents of one party's entries of the given kind, in order.
    pub fn of_kind(&self, party: &str, kind: EntryKind) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(p, k, _)| p == party && *k == kind)
            .map(|(_, _, content)| content)
            .collect()
    }
}

impl Transcript for MemoryTranscript {
    fn record(&self, party: &str, kind: EntryKind, content: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((party.to_string(), kind, content.to_string()));
        }
    }
}

fn format_entry(party: &str, kind: EntryKind, content: &str) -> String {
    format!(
        "=== {} {} {} ===\n{}\n\n",
        party,
        kind,
        Utc::now().to_rfc3339(),
        content.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_delimited_and_newline_terminated() {
        let entry = format_entry("Player1", EntryKind::Prompt, "  hello\n");
        assert!(entry.starts_with("=== Player1 PROMPT "));
        assert!(entry.ends_with(" ===\nhello\n\n"));
    }

    #[test]
    fn file_transcript_appends_per_party() {
        let dir = std::env::temp_dir().join(format!("turn_duel_logs_{}", std::process::id()));
        let transcript = FileTranscript::new(&dir).unwrap();

        transcript.record("A", EntryKind::Prompt, "one");
        transcript.record("A", EntryKind::Response, "two");
        transcript.record("B", EntryKind::Prompt, "three");

        let a = fs::read_to_string(dir.join("A.log")).unwrap();
        assert!(a.contains("A PROMPT") && a.contains("A RESPONSE"));
        assert!(!a.contains("three"));
        assert!(dir.join("B.log").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn memory_transcript_filters_by_kind() {
        let transcript = MemoryTranscript::new();
        transcript.record("A", EntryKind::UserInput, "Drew card: Potion");
        transcript.record("A", EntryKind::Prompt, "prompt");
        assert_eq!(
            transcript.of_kind("A", EntryKind::UserInput),
            vec!["Drew card: Potion".to_string()]
        );
    }
}
