//! Merged client-facing proposal value.

use super::majority::can_execute;
use super::state::{map_state, ProposalState};
use crate::types::{
    Address, ChildProposalRecord, ProposalId, ProposalMetadata, QuorumPolicy, RootProposalRecord,
    Zdao, ZdaoId,
};
use serde::{Deserialize, Serialize};

/// Tally-dependent fields, present only when the child record is mirrored
/// under the same id as the root record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedTally {
    pub start: u64,
    pub end: u64,
    pub snapshot: u64,
    pub scores: Vec<u128>,
    pub voters: u64,
    /// Child chain finished local tallying.
    pub calculated: bool,
}

impl From<ChildProposalRecord> for SyncedTally {
    fn from(child: ChildProposalRecord) -> Self {
        Self {
            start: child.start_timestamp,
            end: child.end_timestamp,
            snapshot: child.snapshot_block,
            scores: child.tally,
            voters: child.voters,
            calculated: child.calculated,
        }
    }
}

/// One proposal as seen across both chains. Recomputed on every read.
///
/// Holds the owning zDAO's id and the policy it is judged under rather than
/// a handle to the zDAO itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalView {
    pub zdao_id: ZdaoId,
    pub id: ProposalId,
    pub created_by: Address,
    pub metadata_ref: String,
    pub created_at: u64,
    pub canceled: bool,
    /// Root chain accepted the relayed tally.
    pub calculated: bool,
    pub executed: bool,
    pub metadata: ProposalMetadata,
    pub policy: QuorumPolicy,
    pub total_supply: u128,
    tally: Option<SyncedTally>,
    state: ProposalState,
    can_execute: bool,
}

impl ProposalView {
    /// Merge a root record with an optional child record.
    ///
    /// A child record with a different id is treated as absent.
    pub fn merge(
        zdao: &Zdao,
        root: RootProposalRecord,
        child: Option<ChildProposalRecord>,
        metadata: ProposalMetadata,
    ) -> Self {
        let tally = child.filter(|c| c.id == root.id).map(SyncedTally::from);
        Self {
            zdao_id: zdao.id,
            id: root.id,
            created_by: root.created_by,
            metadata_ref: root.metadata_ref,
            created_at: root.created_at,
            canceled: root.canceled,
            calculated: root.calculated,
            executed: root.executed,
            metadata,
            policy: zdao.quorum_policy,
            total_supply: zdao.total_supply_of_voting_token,
            tally,
            state: ProposalState::Pending,
            can_execute: false,
        }
    }

    /// Derive `state` and `can_execute` for the given time and execution flag.
    pub fn derive(mut self, now: u64, executed_flag: bool) -> Self {
        self.can_execute = can_execute(&self);
        self.state = map_state(&self, now, executed_flag);
        self
    }

    pub fn is_synced(&self) -> bool {
        self.tally.is_some()
    }

    pub fn tally(&self) -> Option<&SyncedTally> {
        self.tally.as_ref()
    }

    pub fn scores(&self) -> Option<&[u128]> {
        self.tally.as_ref().map(|t| t.scores.as_slice())
    }

    pub fn voters(&self) -> Option<u64> {
        self.tally.as_ref().map(|t| t.voters)
    }

    pub fn start(&self) -> Option<u64> {
        self.tally.as_ref().map(|t| t.start)
    }

    pub fn end(&self) -> Option<u64> {
        self.tally.as_ref().map(|t| t.end)
    }

    pub fn snapshot(&self) -> Option<u64> {
        self.tally.as_ref().map(|t| t.snapshot)
    }

    pub fn state(&self) -> ProposalState {
        self.state
    }

    pub fn can_execute(&self) -> bool {
        self.can_execute
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_unsynced_view_has_no_tally_fields() {
        let v = view(relative(5001), 0, root(1), None).derive(1_000, false);
        assert!(!v.is_synced());
        assert_eq!(v.scores(), None);
        assert_eq!(v.voters(), None);
        assert_eq!(v.start(), None);
        assert_eq!(v.end(), None);
        assert_eq!(v.snapshot(), None);
        assert_eq!(v.state(), ProposalState::Pending);
    }

    #[test]
    fn test_child_with_other_id_is_not_synced() {
        let v = view(relative(5001), 0, root(1), Some(child(2, 100, vec![5, 1])));
        assert!(!v.is_synced());
        assert_eq!(v.scores(), None);
    }

    #[test]
    fn test_synced_view_exposes_tally() {
        let v = view(relative(5001), 0, root(1), Some(child(1, 100, vec![5, 0])));
        assert!(v.is_synced());
        assert_eq!(v.scores(), Some(&[5u128, 0][..]));
        assert_eq!(v.voters(), Some(1));
        assert_eq!(v.end(), Some(100));
        assert_eq!(v.snapshot(), Some(42));
    }

    #[test]
    fn test_zero_votes_synced_is_zero_not_absent() {
        let v = view(relative(5001), 0, root(1), Some(child(1, 100, vec![0, 0])));
        assert_eq!(v.scores(), Some(&[0u128, 0][..]));
        assert_eq!(v.voters(), Some(0));
    }

    #[test]
    fn test_view_serializes_for_host_apps() {
        let v = view(relative(5001), 0, root(1), None).derive(0, false);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["state"], "PENDING");
        assert!(json["tally"].is_null());
    }
}
