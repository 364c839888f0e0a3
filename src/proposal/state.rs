//! Proposal state machine.

use super::view::ProposalView;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete state of a proposal across both chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalState {
    /// Canceled on the root chain.
    Canceled,
    /// Not yet mirrored to the child chain.
    Pending,
    /// Voting window open.
    Active,
    /// Voting closed, child chain has not tallied.
    AwaitingCalculation,
    /// Child chain tallied, tally not yet relayed to root.
    AwaitingFinalization,
    /// Root accepted a passing tally, treasury not yet executed.
    AwaitingExecution,
    Executed,
    /// Root accepted a failing tally.
    Failed,
}

impl ProposalState {
    /// States [`map_state`] never moves out of by itself.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalState::Canceled
                | ProposalState::Pending
                | ProposalState::Executed
                | ProposalState::Failed
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProposalState::Canceled => "canceled",
            ProposalState::Pending => "pending",
            ProposalState::Active => "active",
            ProposalState::AwaitingCalculation => "awaiting-calculation",
            ProposalState::AwaitingFinalization => "awaiting-finalization",
            ProposalState::AwaitingExecution => "awaiting-execution",
            ProposalState::Executed => "executed",
            ProposalState::Failed => "failed",
        }
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Derive the state of a proposal.
///
/// Rules are evaluated in this order and the first match wins:
/// 1. canceled on root → `Canceled`
/// 2. not synced → `Pending`
/// 3. `now <= end` → `Active`
/// 4. `executed_flag` → `Executed`
/// 5. root calculated → `AwaitingExecution` if the tally passes, else `Failed`
/// 6. child calculated → `AwaitingFinalization`
/// 7. otherwise → `AwaitingCalculation`
///
/// `executed_flag` comes from the treasury, not from the records.
pub fn map_state(view: &ProposalView, now: u64, executed_flag: bool) -> ProposalState {
    if view.canceled {
        return ProposalState::Canceled;
    }

    let Some(tally) = view.tally() else {
        return ProposalState::Pending;
    };

    if now <= tally.end {
        return ProposalState::Active;
    }

    if executed_flag {
        return ProposalState::Executed;
    }

    if view.calculated {
        return if super::majority::can_execute(view) {
            ProposalState::AwaitingExecution
        } else {
            ProposalState::Failed
        };
    }

    if tally.calculated {
        return ProposalState::AwaitingFinalization;
    }

    ProposalState::AwaitingCalculation
}
