use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Reserved operator input that stops the session wherever it is entered.
pub const STOP_SENTINEL: &str = "end";

/// True when `input` is the stop sentinel, ignoring case and whitespace.
pub fn is_stop(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(STOP_SENTINEL)
}

/// Something the engine needs the human operator to answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorPrompt<'a> {
    /// The side effect of a new turn starting, e.g. the card that was drawn.
    PhaseEntry { party: &'a str },
    /// An updated public snapshot at the start of a turn.
    PublicState { party: &'a str },
    /// A request the party embedded in its reply.
    ResolveRequest { party: &'a str, request: &'a str },
    /// A free-form note for the party's next prompt.
    Note { party: &'a str },
    /// Whether the party really ended its turn.
    ConfirmEndTurn { party: &'a str },
}

/// Status the engine reports to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement<'a> {
    TurnStarted { party: &'a str, order: &'a str },
    Decisions { party: &'a str, decisions: &'a str },
    Stopped,
    Failed { error: &'a str },
}

/// The human mediating randomness and corrections.
///
/// Every answer is raw text; the engine interprets the stop sentinel and
/// the yes/no confirmation itself.
#[async_trait]
pub trait Operator: Send {
    async fn ask(&mut self, prompt: OperatorPrompt<'_>) -> Result<String>;

    fn announce(&mut self, announcement: Announcement<'_>);
}

/// Kinds of entries written to a party's transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Prompt,
    Response,
    UserInput,
    Error,
    History,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::Prompt => "PROMPT",
            EntryKind::Response => "RESPONSE",
            EntryKind::UserInput => "USER_INPUT",
            EntryKind::Error => "ERROR",
            EntryKind::History => "HISTORY",
        })
    }
}

/// Write-only, best-effort record of what each party saw and said.
///
/// Implementations swallow their own failures; the engine never reads a
/// transcript back.
pub trait Transcript: Send + Sync {
    fn record(&self, party: &str, kind: EntryKind, content: &str);
}
