//! Treasury execution collaborator.
//!
//! Executed proposals move funds through a multisig module transaction. The
//! engine only needs to ask whether a proposal was already executed and to
//! propose the transfer; both are keyed by a deterministic execution hash.

pub mod mock;

use crate::error::ZdaoError;
use crate::types::{Address, ProposalId, TxHash, ZdaoId};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Result type for treasury operations.
pub type TreasuryResult<T> = Result<T, TreasuryError>;

/// Treasury backend errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreasuryError {
    #[error("Treasury network error: {0}")]
    Network(String),

    #[error("Treasury rejected transaction: {0}")]
    Rejected(String),
}

impl From<TreasuryError> for ZdaoError {
    fn from(err: TreasuryError) -> Self {
        ZdaoError::FailedTx(err.to_string())
    }
}

/// Hash identifying one proposal's treasury execution.
///
/// SHA-256 over `platform_type || zdao_id || proposal_id`, all big-endian.
pub fn execution_hash(platform_type: u32, zdao_id: ZdaoId, proposal_id: ProposalId) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(platform_type.to_be_bytes());
    hasher.update(zdao_id.0.to_be_bytes());
    hasher.update(proposal_id.0.to_be_bytes());
    hasher.finalize().into()
}

/// Module transaction the treasury is asked to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub platform_type: u32,
    pub zdao_id: ZdaoId,
    pub proposal_id: ProposalId,
    pub treasury: Address,
    pub token: Address,
    pub recipient: Address,
    pub amount: u128,
}

impl TransferRequest {
    pub fn execution_hash(&self) -> [u8; 32] {
        execution_hash(self.platform_type, self.zdao_id, self.proposal_id)
    }
}

/// Safe-style treasury backend.
#[async_trait]
pub trait TreasuryExecutor: Send + Sync {
    /// Whether the transfer behind `execution_hash` was already executed.
    async fn is_executed(&self, execution_hash: &[u8; 32]) -> TreasuryResult<bool>;

    /// Propose and execute the module transaction.
    async fn propose_transfer(&self, request: &TransferRequest) -> TreasuryResult<TxHash>;
}
