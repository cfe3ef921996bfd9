//! Console implementation of the operator boundary.

use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::traits::{Announcement, Operator, OperatorPrompt, STOP_SENTINEL};

/// Reads operator answers line by line from stdin.
///
/// End of input is reported as the stop sentinel.
pub struct ConsoleOperator {
    lines: Lines<BufReader<Stdin>>,
    fact_label: String,
}

impl ConsoleOperator {
    pub fn new(fact_label: impl Into<String>) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            fact_label: fact_label.into(),
        }
    }

    fn question(&self, prompt: &OperatorPrompt<'_>) -> String {
        match prompt {
            OperatorPrompt::PhaseEntry { party } => {
                format!("{party}: {} (enter value)> ", self.fact_label)
            }
            OperatorPrompt::PublicState { party } => {
                format!("{party}: enter updated public info as JSON or text (blank to skip)> ")
            }
            OperatorPrompt::ResolveRequest { party, request } => {
                format!("\n>> {party} requests input: {request}\nYour response> ")
            }
            OperatorPrompt::Note { .. } => {
                "\nPress Enter to continue, or type a note to include in the next prompt> "
                    .to_string()
            }
            OperatorPrompt::ConfirmEndTurn { party } => {
                format!("\n{party} wants to end its turn. Confirm end turn? (yes/no)> ")
            }
        }
    }
}

#[async_trait]
impl Operator for ConsoleOperator {
    async fn ask(&mut self, prompt: OperatorPrompt<'_>) -> Result<String> {
        print!("{}", self.question(&prompt));
        std::io::stdout().flush()?;
        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Ok(STOP_SENTINEL.to_string()),
        }
    }

    fn announce(&mut self, announcement: Announcement<'_>) {
        match announcement {
            Announcement::TurnStarted { party, order } => {
                println!("\n--- {party}'s turn ({order}) ---");
            }
            Announcement::Decisions { decisions, .. } => {
                println!("Decisions:\n{decisions}");
            }
            Announcement::Stopped => println!("Game ended by user."),
            Announcement::Failed { error } => println!("ERROR during turn: {error}"),
        }
    }
}
