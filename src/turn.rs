//! Turn ownership and the per-cycle state machine.

/// Where the engine is within the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Between cycles.
    Idle,
    /// A new party holds the turn and the operator has not been asked yet.
    AwaitingPhaseEntry,
    AwaitingReply,
    /// The party signalled end of turn; the operator decides.
    AwaitingEndTurnConfirmation,
}

/// Round-robin cursor over the parties plus the cycle state.
///
/// The cursor only moves on a confirmed end of turn, always by exactly one
/// position.
#[derive(Debug, Clone)]
pub struct TurnMachine {
    party_count: usize,
    active: usize,
    previous: Option<usize>,
    state: TurnState,
    turns_completed: u64,
}

impl TurnMachine {
    /// Starts idle with the first party active. A count of zero is treated as one.
    pub fn new(party_count: usize) -> Self {
        Self {
            party_count: party_count.max(1),
            active: 0,
            previous: None,
            state: TurnState::Idle,
            turns_completed: 0,
        }
    }

    /// Index of the party holding the turn.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Index of the party that acts after the active one.
    pub fn next(&self) -> usize {
        (self.active + 1) % self.party_count
    }

    /// Current position within the cycle.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Number of confirmed ends of turn.
    pub fn turns_completed(&self) -> u64 {
        self.turns_completed
    }

    /// Starts a cycle. Returns true when the active party differs from the
    /// one that ran the previous cycle, i.e. a phase entry is due.
    pub fn begin_cycle(&mut self) -> crate::Result<bool> {
        self.expect(TurnState::Idle, "begin a cycle")?;
        if self.previous != Some(self.active) {
            self.state = TurnState::AwaitingPhaseEntry;
            Ok(true)
        } else {
            self.state = TurnState::AwaitingReply;
            Ok(false)
        }
    }

    /// Phase-entry prompts are done; the reply comes next.
    pub fn phase_entered(&mut self) -> crate::Result<()> {
        self.expect(TurnState::AwaitingPhaseEntry, "finish phase entry")?;
        self.previous = Some(self.active);
        self.state = TurnState::AwaitingReply;
        Ok(())
    }

    /// Records an accepted reply. An end-of-turn signal moves to
    /// confirmation; otherwise the same party goes again.
    pub fn reply_received(&mut self, end_turn: bool) -> crate::Result<TurnState> {
        self.expect(TurnState::AwaitingReply, "accept a reply")?;
        self.state = if end_turn {
            TurnState::AwaitingEndTurnConfirmation
        } else {
            TurnState::Idle
        };
        Ok(self.state)
    }

    /// Confirms the end of turn and returns the newly active index.
    pub fn confirm_end_turn(&mut self) -> crate::Result<usize> {
        self.expect(TurnState::AwaitingEndTurnConfirmation, "confirm end of turn")?;
        self.active = self.next();
        self.turns_completed += 1;
        self.state = TurnState::Idle;
        Ok(self.active)
    }

    /// Keeps the turn with the active party. No phase entry follows.
    pub fn reject_end_turn(&mut self) -> crate::Result<()> {
        self.expect(TurnState::AwaitingEndTurnConfirmation, "reject end of turn")?;
        self.state = TurnState::Idle;
        Ok(())
    }

    fn expect(&self, state: TurnState, event: &'static str) -> crate::Result<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(crate::SessionError::InvalidTransition {
                state: self.state,
                event,
            })
        }
    }
}
