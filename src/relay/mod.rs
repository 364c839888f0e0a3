//! Checkpoint relay from the child chain back to the root chain.
//!
//! A tally computed on the child chain reaches the root chain in three steps:
//! wait for the bridge to checkpoint the child transaction, build the exit
//! proof for its message-sent event, and submit the proof to the root
//! message receiver. Only the last step writes, and it is idempotent.

pub mod checkpoint;
pub mod coordinator;
pub mod mock;
pub mod traits;

pub use checkpoint::{
    cancel_pair, CancelHandle, CancelToken, CheckpointProofService, PollSchedule,
    MESSAGE_SENT_EVENT_SIG, MIN_POLL_INTERVAL,
};
pub use coordinator::{RelayCoordinator, RelayOutcome};
pub use traits::{BridgeClient, BridgeError, BridgeResult};
