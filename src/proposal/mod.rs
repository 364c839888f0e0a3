//! Proposal view, state machine and lifecycle.
//!
//! A proposal lives on two chains. The root registry holds who created it,
//! its metadata and its cancel/calculate/execute flags; the child chain holds
//! the voting window and the tally. [`ProposalResolver`] merges both into a
//! [`ProposalView`] and derives its [`ProposalState`] on every read.

pub mod lifecycle;
pub mod majority;
pub mod resolver;
pub mod state;
pub mod view;

#[cfg(test)]
mod proptests;

pub use lifecycle::{CreateProposalPayload, ExecutionReceipt, ProposalLifecycle};
pub use majority::{can_execute, passes};
pub use resolver::ProposalResolver;
pub use state::{map_state, ProposalState};
pub use view::{ProposalView, SyncedTally};
