//! Idempotent submission of exit proofs to the root chain.

use crate::error::ZdaoResult;
use crate::gateway::{GatewayError, RootChainGateway};
use crate::types::{RelayProof, TxHash, TxReceipt};
use tracing::info;

/// Revert reason fragment of a root tunnel that already consumed an exit.
pub const EXIT_ALREADY_PROCESSED: &str = "EXIT_ALREADY_PROCESSED";

/// Result of relaying one proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// This call delivered the proof.
    Relayed(TxReceipt),
    /// The root chain had already consumed the proof for `tx_hash`.
    AlreadyRelayed { tx_hash: TxHash },
}

impl RelayOutcome {
    /// Child-chain transaction the relayed proof is for.
    pub fn proven_tx(&self, proof: &RelayProof) -> TxHash {
        match self {
            RelayOutcome::Relayed(_) => proof.tx_hash,
            RelayOutcome::AlreadyRelayed { tx_hash } => *tx_hash,
        }
    }

    pub fn is_already_relayed(&self) -> bool {
        matches!(self, RelayOutcome::AlreadyRelayed { .. })
    }
}

/// Whether a root-chain revert means the exit was consumed earlier.
pub fn is_exit_replay(err: &GatewayError) -> bool {
    matches!(err, GatewayError::Reverted(reason) if reason.contains(EXIT_ALREADY_PROCESSED))
}

/// Submits proofs to the root message receiver.
///
/// Safe to call any number of times with the same proof: a replay rejection
/// is reported as [`RelayOutcome::AlreadyRelayed`], never as an error. A
/// transport failure is returned as `FailedTx` without resubmitting.
#[derive(Clone)]
pub struct RelayCoordinator {
    root: RootChainGateway,
}

impl RelayCoordinator {
    pub fn new(root: RootChainGateway) -> Self {
        Self { root }
    }

    pub async fn relay(&self, proof: &RelayProof) -> ZdaoResult<RelayOutcome> {
        match self.root.receive_message(proof.payload.clone()).await {
            Ok(receipt) => {
                info!(
                    tx = %proof.tx_hash,
                    root_tx = %receipt.tx_hash,
                    "exit proof relayed"
                );
                Ok(RelayOutcome::Relayed(receipt))
            }
            Err(e) if is_exit_replay(&e) => {
                info!(tx = %proof.tx_hash, "exit proof already consumed");
                Ok(RelayOutcome::AlreadyRelayed {
                    tx_hash: proof.tx_hash,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
