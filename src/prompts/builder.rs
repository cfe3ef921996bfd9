use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::loader::PromptLoader;
use super::templates::{render, PHASE_ENTRY_MARKER};
use crate::parser::ReplyContract;
use crate::shared::SharedStateChannel;
use crate::types::Party;

/// Whether the last-decision reminder survives being read into a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastDecisionPolicy {
    /// Kept until the next reply overwrites it.
    #[default]
    Persist,
    /// Cleared like the other one-shot fields.
    Clear,
}

/// Assembles the next request text for a party.
///
/// Composition consumes the party's one-shot fields, so composing twice in a
/// row yields two different prompts.
pub struct PromptComposer {
    game: String,
    initial: String,
    continuation: String,
    contract: String,
    fact_label: String,
    last_decision: LastDecisionPolicy,
}

impl PromptComposer {
    /// Composer with explicit framing templates.
    pub fn new(
        game: impl Into<String>,
        initial: impl Into<String>,
        continuation: impl Into<String>,
        contract: &ReplyContract,
    ) -> Self {
        Self {
            game: game.into(),
            initial: initial.into(),
            continuation: continuation.into(),
            contract: contract.describe(),
            fact_label: "Drawn card".to_string(),
            last_decision: LastDecisionPolicy::default(),
        }
    }

    /// Composer using templates from `loader`.
    pub fn from_loader(
        game: impl Into<String>,
        loader: &PromptLoader,
        contract: &ReplyContract,
    ) -> Result<Self> {
        Ok(Self::new(
            game,
            loader.load_initial()?,
            loader.load_continuation()?,
            contract,
        ))
    }

    /// Label for the injected fact section, "Drawn card" by default.
    pub fn with_fact_label(mut self, label: impl Into<String>) -> Self {
        self.fact_label = label.into();
        self
    }

    /// Whether the last-decisions reminder is consumed or kept.
    pub fn with_last_decision_policy(mut self, policy: LastDecisionPolicy) -> Self {
        self.last_decision = policy;
        self
    }

    /// Builds the next prompt for `party`, consuming its one-shot fields.
    pub fn compose(&self, party: &mut Party) -> String {
        let mut sections = vec![];

        // 1. Phase entry marker
        if std::mem::take(&mut party.entered_new_phase) {
            sections.push(PHASE_ENTRY_MARKER.to_string());
        }

        // 2. Framing
        if !party.has_taken_turn {
            sections.push(self.render(&self.initial, party));
        } else {
            sections.push(self.render(&self.continuation, party));
            sections.push(format!("# Decklist (for reference):\n{}", party.deck));
            if !party.memory.is_empty() {
                sections.push(format!("Previously remembered:\n{}", party.memory.read()));
            }
        }

        // 3. Public snapshot
        if let Some(snapshot) = SharedStateChannel::consume(party) {
            sections.push(format!("[Board state: {}]", snapshot.render()));
        }

        // 4. Injected fact
        if let Some(fact) = party.pending_fact.take() {
            sections.push(format!("[{}: {}]", self.fact_label, fact));
        }

        // 5. Last decision
        let decision = match self.last_decision {
            LastDecisionPolicy::Persist => party.last_decision.clone(),
            LastDecisionPolicy::Clear => party.last_decision.take(),
        };
        if let Some(decision) = decision.filter(|d| !d.is_empty()) {
            sections.push(format!("[Last decisions: {}]", decision));
        }

        // 6. Operator notes
        if let Some(note) = party.pending_note.take() {
            sections.push(format!("[User note: {}]", note));
        }

        log::debug!("Composed {} sections for {}", sections.len(), party.name);

        sections.join("\n\n")
    }

    fn render(&self, template: &str, party: &Party) -> String {
        let order = party.order.to_string();
        render(
            template,
            &[
                ("name", party.name.as_str()),
                ("game", self.game.as_str()),
                ("setup", party.setup.as_str()),
                ("deck", party.deck.as_str()),
                ("order", order.as_str()),
                ("contract", self.contract.as_str()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::types::{PlayOrder, SharedSnapshot};
    use serde_json::json;

    fn composer() -> PromptComposer {
        PromptComposer::new(
            "a card game",
            "INITIAL {name} {order} {setup} {deck}",
            "CONTINUE {name}",
            &ReplyContract::default(),
        )
    }

    fn party() -> Party {
        Party::new("Ash", "Pikachu x4", "7 cards", PlayOrder::First, MemoryStore::replace())
    }

    #[test]
    fn first_turn_uses_initial_framing() {
        let prompt = composer().compose(&mut party());
        assert_eq!(prompt, "INITIAL Ash first 7 cards Pikachu x4");
    }

    #[test]
    fn later_turns_restate_deck_and_memory() {
        let mut party = party();
        party.has_taken_turn = true;
        party.memory.record(&json!("hand: Pikachu"), None);

        let prompt = composer().compose(&mut party);

        assert_eq!(
            prompt,
            "CONTINUE Ash\n\n# Decklist (for reference):\nPikachu x4\n\nPreviously remembered:\nhand: Pikachu"
        );
    }

    #[test]
    fn cleared_memory_still_counts_as_later_turn() {
        let mut party = party();
        party.has_taken_turn = true;
        let prompt = composer().compose(&mut party);
        assert!(prompt.starts_with("CONTINUE Ash"));
        assert!(!prompt.contains("Previously remembered"));
    }

    #[test]
    fn sections_follow_fixed_order() {
        let mut party = party();
        party.mark_phase_entry();
        party.incoming_shared = Some(SharedSnapshot(json!({"prizes": 6})));
        party.pending_fact = Some("Potion".into());
        party.last_decision = Some("attack".into());
        party.push_note("watch the bench");

        let prompt = composer().compose(&mut party);

        assert_eq!(
            prompt,
            "[New Turn]\n\nINITIAL Ash first 7 cards Pikachu x4\n\n[Board state: {\"prizes\":6}]\n\n\
             [Drawn card: Potion]\n\n[Last decisions: attack]\n\n[User note: watch the bench]"
        );
    }

    #[test]
    fn one_shot_sections_disappear_on_second_compose() {
        let composer = composer();
        let mut party = party();
        party.mark_phase_entry();
        party.incoming_shared = Some(SharedSnapshot(json!("board")));
        party.pending_fact = Some("Potion".into());
        party.last_decision = Some("attack".into());
        party.push_note("note");

        let first = composer.compose(&mut party);
        let second = composer.compose(&mut party);

        assert_ne!(first, second);
        assert!(!second.contains("[New Turn]"));
        assert!(!second.contains("[Board state"));
        assert!(!second.contains("[Drawn card"));
        assert!(!second.contains("[User note"));
        assert!(second.contains("[Last decisions: attack]"));
    }

    #[test]
    fn clear_policy_consumes_last_decision() {
        let composer = composer().with_last_decision_policy(LastDecisionPolicy::Clear);
        let mut party = party();
        party.last_decision = Some("attack".into());

        assert!(composer.compose(&mut party).contains("[Last decisions: attack]"));
        assert!(!composer.compose(&mut party).contains("[Last decisions"));
    }

    #[test]
    fn fact_label_is_configurable() {
        let composer = composer().with_fact_label("Rolled");
        let mut party = party();
        party.pending_fact = Some("6".into());
        assert!(composer.compose(&mut party).ends_with("[Rolled: 6]"));
    }
}
