use std::sync::Arc;

use crate::config::{PhaseEntryConfig, SessionConfig};
use crate::error::{Result, SessionError};
use crate::llm::LlmClient;
use crate::prompts::templates::END_TURN_CORRECTION;
use crate::prompts::{PromptComposer, PromptLoader};
use crate::retry::{AcceptedReply, ReplyValidator};
use crate::shared::SharedStateChannel;
use crate::traits::{is_stop, Announcement, EntryKind, Operator, OperatorPrompt, Transcript};
use crate::turn::{TurnMachine, TurnState};
use crate::types::{Party, SharedSnapshot};

/// What happened at the end of one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Keep going with the next cycle.
    Continue,
    /// The operator entered the stop sentinel.
    Stopped,
}

/// Where the session was when the operator stopped it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Cycles started, including the one that was stopped.
    pub cycles: u64,
    /// Confirmed ends of turn.
    pub turns_completed: u64,
    /// Name of the party holding the turn.
    pub active_party: String,
}

/// The session loop: one party, one prompt, one validated reply per cycle.
pub struct TurnEngine<O: Operator> {
    parties: Vec<Party>,
    machine: TurnMachine,
    channel: SharedStateChannel,
    composer: PromptComposer,
    validator: ReplyValidator,
    phase_entry: PhaseEntryConfig,
    operator: O,
    transcript: Arc<dyn Transcript>,
    cycles: u64,
}

impl<O: Operator> TurnEngine<O> {
    /// Builds an engine from a validated configuration.
    pub fn new(
        config: &SessionConfig,
        llm_client: Arc<dyn LlmClient>,
        operator: O,
        transcript: Arc<dyn Transcript>,
    ) -> Result<Self> {
        config.validate()?;

        let loader = PromptLoader::new(config.prompts_dir.as_ref());
        let composer = PromptComposer::from_loader(&config.game, &loader, &config.contract)
            .map_err(|e| SessionError::Config(format!("{e:#}")))?
            .with_fact_label(&config.phase_entry.label)
            .with_last_decision_policy(config.last_decision);
        let validator =
            ReplyValidator::new(llm_client, config.contract.clone(), config.max_attempts);

        Self::from_parts(
            config.build_parties(),
            composer,
            validator,
            SharedStateChannel::new(config.delivery),
            config.phase_entry.clone(),
            operator,
            transcript,
        )
    }

    /// Builds an engine from already assembled parts. The first party starts.
    ///
    /// Fails with [`SessionError::Config`] when `parties` is empty.
    pub fn from_parts(
        mut parties: Vec<Party>,
        composer: PromptComposer,
        validator: ReplyValidator,
        channel: SharedStateChannel,
        phase_entry: PhaseEntryConfig,
        operator: O,
        transcript: Arc<dyn Transcript>,
    ) -> Result<Self> {
        let Some(first) = parties.first_mut() else {
            return Err(SessionError::Config("no parties configured".to_string()));
        };
        first.mark_phase_entry();

        Ok(Self {
            machine: TurnMachine::new(parties.len()),
            parties,
            channel,
            composer,
            validator,
            phase_entry,
            operator,
            transcript,
            cycles: 0,
        })
    }

    /// Parties in turn order.
    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    pub fn party(&self, name: &str) -> Option<&Party> {
        self.parties.iter().find(|p| p.name == name)
    }

    /// The party whose turn it is.
    pub fn active_party(&self) -> &Party {
        &self.parties[self.machine.active()]
    }

    pub fn machine(&self) -> &TurnMachine {
        &self.machine
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Snapshot of the session counters.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            cycles: self.cycles,
            turns_completed: self.machine.turns_completed(),
            active_party: self.active_party().name.clone(),
        }
    }

    /// Runs cycles until the operator stops the session or a cycle fails.
    pub async fn run(&mut self) -> Result<SessionSummary> {
        log::info!("Starting session with {} parties", self.parties.len());

        loop {
            match self.run_cycle().await {
                Ok(CycleOutcome::Continue) => {}
                Ok(CycleOutcome::Stopped) => {
                    log::info!("Session stopped by operator after {} cycles", self.cycles);
                    self.operator.announce(Announcement::Stopped);
                    return Ok(self.summary());
                }
                Err(e) => {
                    let message = e.to_string();
                    log::error!("Session ended: {}", message);
                    let name = self.active_party().name.clone();
                    self.transcript.record(&name, EntryKind::Error, &message);
                    self.operator.announce(Announcement::Failed { error: &message });
                    return Err(e);
                }
            }
        }
    }

    /// One cycle: phase entry if due, compose, validate, apply the reply.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let idx = self.machine.active();
        self.cycles += 1;

        let (name, order) = {
            let party = &self.parties[idx];
            (party.name.clone(), party.order.to_string())
        };
        self.operator.announce(Announcement::TurnStarted {
            party: &name,
            order: &order,
        });

        if self.machine.begin_cycle()? {
            if self.enter_phase(idx, &name).await? == CycleOutcome::Stopped {
                return Ok(CycleOutcome::Stopped);
            }
            self.machine.phase_entered()?;
        }

        let prompt = {
            let party = &mut self.parties[idx];
            if let Some(history) = party.memory.history() {
                self.transcript
                    .record(&name, EntryKind::History, &history.role_summary());
            }
            self.composer.compose(party)
        };
        self.transcript.record(&name, EntryKind::Prompt, &prompt);

        let accepted = self.validator.execute(&name, &prompt).await?;
        let pretty = serde_json::to_string_pretty(accepted.reply.fields())
            .unwrap_or_else(|_| accepted.raw.clone());
        self.transcript.record(&name, EntryKind::Response, &pretty);

        self.apply_reply(idx, &prompt, &accepted);
        let reply = &accepted.reply;
        let decisions = reply.decisions();
        self.operator.announce(Announcement::Decisions {
            party: &name,
            decisions: &decisions,
        });

        if let Some(request) = reply.operator_request() {
            let Some(answer) = self
                .ask(OperatorPrompt::ResolveRequest {
                    party: &name,
                    request: &request,
                })
                .await?
            else {
                return Ok(CycleOutcome::Stopped);
            };
            let resolution = format!("{request} -> {answer}");
            self.transcript
                .record(&name, EntryKind::UserInput, &resolution);
            self.parties[idx].push_note(resolution);
        }

        let Some(note) = self.ask(OperatorPrompt::Note { party: &name }).await? else {
            return Ok(CycleOutcome::Stopped);
        };
        if !note.is_empty() {
            self.transcript
                .record(&name, EntryKind::UserInput, &format!("[Pending note] {note}"));
            self.parties[idx].push_note(note);
        }

        if let Some(snapshot) = reply.public_info() {
            self.channel
                .publish(&mut self.parties, self.machine.next(), snapshot);
        }

        if self.machine.reply_received(reply.end_turn())? == TurnState::AwaitingEndTurnConfirmation {
            let Some(answer) = self
                .ask(OperatorPrompt::ConfirmEndTurn { party: &name })
                .await?
            else {
                return Ok(CycleOutcome::Stopped);
            };
            if answer.eq_ignore_ascii_case("yes") || answer.eq_ignore_ascii_case("y") {
                let next = self.machine.confirm_end_turn()?;
                self.parties[next].mark_phase_entry();
                log::info!("{} ended its turn, {} is up", name, self.parties[next].name);
            } else {
                self.machine.reject_end_turn()?;
                self.transcript.record(
                    &name,
                    EntryKind::UserInput,
                    &format!("[Correction] {END_TURN_CORRECTION}"),
                );
                self.parties[idx].push_note(END_TURN_CORRECTION);
                log::info!("End of turn for {} rejected", name);
            }
        }

        Ok(CycleOutcome::Continue)
    }

    async fn enter_phase(&mut self, idx: usize, name: &str) -> Result<CycleOutcome> {
        self.parties[idx].mark_phase_entry();

        if self.phase_entry.draw {
            let Some(fact) = self.ask(OperatorPrompt::PhaseEntry { party: name }).await? else {
                return Ok(CycleOutcome::Stopped);
            };
            self.transcript.record(
                name,
                EntryKind::UserInput,
                &format!("{}: {}", self.phase_entry.label, fact),
            );
            if !fact.is_empty() {
                self.parties[idx].pending_fact = Some(fact);
            }
        }

        if self.phase_entry.public_state {
            let Some(entry) = self.ask(OperatorPrompt::PublicState { party: name }).await? else {
                return Ok(CycleOutcome::Stopped);
            };
            if !entry.is_empty() {
                self.transcript.record(
                    name,
                    EntryKind::UserInput,
                    &format!("Updated public_info: {entry}"),
                );
                // The active party has not composed yet, so it is the one "acting next".
                self.channel.publish(
                    &mut self.parties,
                    idx,
                    SharedSnapshot::from_operator_text(&entry),
                );
            }
        }

        Ok(CycleOutcome::Continue)
    }

    fn apply_reply(&mut self, idx: usize, prompt: &str, accepted: &AcceptedReply) {
        let reply = &accepted.reply;
        let party = &mut self.parties[idx];

        if let Some(memory) = reply.memory() {
            party.memory.record(memory, reply.to_memorize());
        }
        party.memory.remember_exchange(prompt, &accepted.raw);
        party.has_taken_turn = true;
        party.last_decision = Some(reply.decisions());
    }

    /// Asks the operator; `None` means the stop sentinel was entered.
    async fn ask(&mut self, prompt: OperatorPrompt<'_>) -> Result<Option<String>> {
        let answer = self
            .operator
            .ask(prompt)
            .await
            .map_err(|e| SessionError::Operator(e.into()))?;
        if is_stop(&answer) {
            Ok(None)
        } else {
            Ok(Some(answer.trim().to_string()))
        }
    }
}
