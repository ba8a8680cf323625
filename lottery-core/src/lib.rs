use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use thiserror::Error;

pub type ParticipantId = u32;
pub type GroupId = u32;

/// One person in the gift exchange. Sourced from the roster provider and
/// never created or destroyed by the engine. `group_id` marks households:
/// people in the same group never draw each other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub group_id: GroupId,
}

/// The persisted assignment table: a partial map from actor id to the target
/// they drew. Absence of a key means "never ran the lottery" and is distinct
/// from any placeholder value; the JSON form is a string-keyed object so
/// backends with set-only semantics cannot conflate the two.
///
/// An entry, once written, is never overwritten or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MappingTable(BTreeMap<ParticipantId, Participant>);

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, actor_id: ParticipantId) -> Option<&Participant> {
        self.0.get(&actor_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParticipantId, &Participant)> {
        self.0.iter().map(|(id, target)| (*id, target))
    }

    /// Ids of every participant already holding an incoming assignment,
    /// regardless of which actor drew them.
    pub fn used_targets(&self) -> BTreeSet<ParticipantId> {
        self.0.values().map(|target| target.id).collect()
    }

    /// Roster members not yet drawn as anyone's target, in roster order.
    pub fn unassigned(&self, roster: &[Participant]) -> Vec<Participant> {
        let used = self.used_targets();
        roster
            .iter()
            .filter(|p| !used.contains(&p.id))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LotteryError {
    #[error("participant not found")]
    ActorNotFound,
    #[error("no eligible target")]
    NoEligibleTarget,
}

/// Result of a lottery draw. `Assigned` carries the updated table for the
/// caller to persist; `AlreadyAssigned` repeats the stored target verbatim
/// and the caller must perform no write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotteryOutcome {
    Assigned {
        target: Participant,
        mapping: MappingTable,
    },
    AlreadyAssigned {
        target: Participant,
    },
}

/// Draws a target for `actor_id`.
///
/// Candidates are the roster minus the actor itself, minus everyone already
/// drawn as a target, minus the actor's own group. One candidate is chosen
/// uniformly at random from the injected RNG. The input mapping is never
/// mutated; a fresh draw returns a new table with exactly one added entry.
pub fn run_lottery(
    actor_id: ParticipantId,
    roster: &[Participant],
    mapping: &MappingTable,
    rng: &mut impl Rng,
) -> Result<LotteryOutcome, LotteryError> {
    let actor = roster
        .iter()
        .find(|p| p.id == actor_id)
        .ok_or(LotteryError::ActorNotFound)?;

    if let Some(existing) = mapping.get(actor.id) {
        return Ok(LotteryOutcome::AlreadyAssigned {
            target: existing.clone(),
        });
    }

    let used = mapping.used_targets();
    let candidates: Vec<&Participant> = roster
        .iter()
        .filter(|p| p.id != actor.id)
        .filter(|p| !used.contains(&p.id))
        .filter(|p| p.group_id != actor.group_id)
        .collect();

    let target = candidates
        .choose(rng)
        .map(|p| (*p).clone())
        .ok_or(LotteryError::NoEligibleTarget)?;

    let mut next = mapping.clone();
    next.0.insert(actor.id, target.clone());

    Ok(LotteryOutcome::Assigned {
        target,
        mapping: next,
    })
}
