//! Propagation of public world snapshots between parties.

use serde::{Deserialize, Serialize};

use crate::types::{Party, SharedSnapshot};

/// How a published snapshot reaches the parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Every party's incoming slot is overwritten.
    #[default]
    Broadcast,
    /// Only the party acting next receives it.
    Targeted,
}

/// The only piece of cross-party mutable state.
///
/// The policy is fixed at construction and cannot change for the life of a
/// session.
#[derive(Debug, Clone, Copy)]
pub struct SharedStateChannel {
    policy: DeliveryPolicy,
}

impl SharedStateChannel {
    /// Channel delivering snapshots under `policy`.
    pub fn new(policy: DeliveryPolicy) -> Self {
        Self { policy }
    }

    /// Active delivery policy.
    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Writes `snapshot` into the incoming slots selected by the policy.
    /// `next` is the index of the party that will act after the current one.
    /// Empty snapshots are dropped.
    pub fn publish(&self, parties: &mut [Party], next: usize, snapshot: SharedSnapshot) {
        if snapshot.is_empty() {
            return;
        }
        match self.policy {
            DeliveryPolicy::Broadcast => {
                log::debug!("Broadcasting public snapshot to {} parties", parties.len());
                for party in parties.iter_mut() {
                    party.incoming_shared = Some(snapshot.clone());
                }
            }
            DeliveryPolicy::Targeted => {
                if let Some(party) = parties.get_mut(next) {
                    log::debug!("Delivering public snapshot to {}", party.name);
                    party.incoming_shared = Some(snapshot);
                }
            }
        }
    }

    /// Takes the party's pending snapshot, leaving the slot empty.
    pub fn consume(party: &mut Party) -> Option<SharedSnapshot> {
        party.incoming_shared.take().filter(|s| !s.is_empty())
    }
}
