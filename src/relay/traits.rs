//! Bridge collaborator trait.

use crate::error::ZdaoError;
use crate::types::TxHash;
use async_trait::async_trait;

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge (checkpoint / proof API) errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Transport failure; worth asking again.
    #[error("Bridge network error: {0}")]
    Network(String),

    /// The bridge does not know the transaction.
    #[error("Bridge does not know transaction {0}")]
    UnknownTransaction(String),

    /// No event with the requested signature in the transaction's logs.
    #[error("Event {0} not emitted by transaction")]
    EventNotFound(String),

    #[error("Bridge proof error: {0}")]
    Proof(String),
}

impl BridgeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::Network(_))
    }
}

impl From<BridgeError> for ZdaoError {
    fn from(err: BridgeError) -> Self {
        ZdaoError::FailedTx(err.to_string())
    }
}

/// Checkpoint bridge between the child chain and the root chain.
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Whether the child-chain transaction is included in a checkpoint
    /// submitted to the root chain.
    async fn is_checkpointed(&self, tx_hash: &TxHash) -> BridgeResult<bool>;

    /// Build the exit proof for the log with `event_signature` emitted by
    /// `tx_hash`.
    async fn build_exit_proof(&self, tx_hash: &TxHash, event_signature: &str)
        -> BridgeResult<Vec<u8>>;
}
