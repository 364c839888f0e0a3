//! Trait abstractions for root- and child-chain RPC.
//!
//! Contract ABI encoding and signing live behind these traits; the engine
//! only sees typed records. Mock implementations in [`super::mock`] back
//! every test.

use crate::error::ZdaoError;
use crate::types::{
    Address, ChildProposalRecord, ProposalId, QuorumPolicy, RootProposalRecord, Token, TxReceipt,
    ZdaoId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for chain RPC operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Chain RPC errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Record does not exist on chain.
    #[error("Record not found")]
    NotFound,

    /// Transport failure (timeout, connection refused).
    #[error("Network error: {0}")]
    Network(String),

    /// Contract rejected the call; carries the revert reason.
    #[error("{0}")]
    Reverted(String),

    /// Node answered with something that does not decode.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<GatewayError> for ZdaoError {
    fn from(err: GatewayError) -> Self {
        ZdaoError::FailedTx(err.to_string())
    }
}

/// Write call against a governance contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractCall {
    CreateProposal {
        zdao_id: ZdaoId,
        created_by: Address,
        metadata_ref: String,
    },
    CancelProposal {
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
        caller: Address,
    },
    ExecuteProposal {
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
    },
    CalculateProposal {
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
    },
    /// Deliver a checkpoint exit proof to the root message receiver.
    ReceiveMessage { proof: Vec<u8> },
    AddNewDao { params: NewZdaoParams },
}

impl ContractCall {
    /// Method name, for logs.
    pub fn method(&self) -> &'static str {
        match self {
            ContractCall::CreateProposal { .. } => "createProposal",
            ContractCall::CancelProposal { .. } => "cancelProposal",
            ContractCall::ExecuteProposal { .. } => "executeProposal",
            ContractCall::CalculateProposal { .. } => "calculateProposal",
            ContractCall::ReceiveMessage { .. } => "receiveMessage",
            ContractCall::AddNewDao { .. } => "addNewDAO",
        }
    }
}

/// Parameters for registering a new zDAO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewZdaoParams {
    pub name: String,
    pub created_by: Address,
    pub treasury_address: Address,
    pub voting_token: Token,
    pub quorum_policy: QuorumPolicy,
    pub voting_duration_secs: u64,
}

/// zDAO as stored in the registry, before name resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZdaoRecord {
    pub id: ZdaoId,
    pub root_contract: Address,
    pub child_contract: Address,
    pub treasury_address: Address,
    pub voting_token: Token,
    pub total_supply_of_voting_token: u128,
    pub quorum_policy: QuorumPolicy,
    pub voting_duration_secs: u64,
    pub destroyed: bool,
}

/// Gas estimation and submission, shared by both chains.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Estimate gas for a call.
    async fn estimate_gas(&self, call: &ContractCall) -> GatewayResult<u64>;

    /// Sign and send a call with an explicit gas limit, wait for the receipt.
    async fn send_transaction(&self, call: &ContractCall, gas_limit: u64)
        -> GatewayResult<TxReceipt>;
}

/// Root-chain registry RPC.
#[async_trait]
pub trait RootChainRpc: TransactionSender {
    /// Get a proposal record of a zDAO.
    async fn get_proposal(
        &self,
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
    ) -> GatewayResult<RootProposalRecord>;

    /// List proposal records starting at `offset`, at most `limit` of them.
    async fn list_proposals(
        &self,
        zdao_id: ZdaoId,
        offset: u64,
        limit: u32,
    ) -> GatewayResult<Vec<RootProposalRecord>>;

    /// Registry entry for a zDAO, `None` if never registered.
    async fn get_zdao_record(&self, zdao_id: ZdaoId) -> GatewayResult<Option<ZdaoRecord>>;

    /// Names pointing at a zDAO, as stored (may contain duplicates).
    async fn zdao_names(&self, zdao_id: ZdaoId) -> GatewayResult<Vec<String>>;

    /// Registered zDAO ids, paged.
    async fn list_zdao_ids(&self, offset: u64, limit: u32) -> GatewayResult<Vec<ZdaoId>>;
}

/// Child-chain voting contract RPC.
#[async_trait]
pub trait ChildChainRpc: TransactionSender {
    /// Get a child proposal record. Unmirrored proposals come back either as
    /// `NotFound` or as a zero-id record depending on the node.
    async fn get_proposal(
        &self,
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
    ) -> GatewayResult<ChildProposalRecord>;

    /// Whether the zDAO has been mirrored to the child chain.
    async fn is_zdao_synced(&self, zdao_id: ZdaoId) -> GatewayResult<bool>;
}

/// Maps human-readable names to zDAO ids.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> GatewayResult<Option<ZdaoId>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverted_message_kept_verbatim() {
        let err: ZdaoError = GatewayError::Reverted("ZDAO: not owner".to_string()).into();
        assert_eq!(err, ZdaoError::FailedTx("ZDAO: not owner".to_string()));
    }

    #[test]
    fn test_network_error_maps_to_failed_tx() {
        let err: ZdaoError = GatewayError::Network("timeout".to_string()).into();
        assert_eq!(err.kind(), crate::error::ErrorKind::FailedTx);
        assert_eq!(err.to_string(), "Network error: timeout");
    }

    #[test]
    fn test_call_method_names() {
        let call = ContractCall::ReceiveMessage { proof: vec![1] };
        assert_eq!(call.method(), "receiveMessage");
    }
}
