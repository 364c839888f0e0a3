//! Root-chain registry facade.

use super::traits::{
    ContractCall, GatewayError, GatewayResult, NewZdaoParams, RootChainRpc, TransactionSender,
    ZdaoRecord,
};
use crate::types::{Address, ProposalId, RootProposalRecord, TxReceipt, ZdaoId};
use std::sync::Arc;
use tracing::debug;

/// Apply the 10% safety margin to a gas estimate.
pub fn with_gas_margin(estimated: u64) -> u64 {
    let padded = u128::from(estimated) * 11 / 10;
    u64::try_from(padded).unwrap_or(u64::MAX)
}

/// Estimate, pad, submit.
pub(crate) async fn submit_with_margin<S>(
    sender: &S,
    call: &ContractCall,
) -> GatewayResult<TxReceipt>
where
    S: TransactionSender + ?Sized,
{
    let estimated = sender.estimate_gas(call).await?;
    let gas_limit = with_gas_margin(estimated);
    debug!(
        method = call.method(),
        estimated, gas_limit, "submitting contract call"
    );
    sender.send_transaction(call, gas_limit).await
}

/// Read/write facade over the root-chain proposal registry.
#[derive(Clone)]
pub struct RootChainGateway {
    rpc: Arc<dyn RootChainRpc>,
}

impl RootChainGateway {
    pub fn new(rpc: Arc<dyn RootChainRpc>) -> Self {
        Self { rpc }
    }

    pub async fn get_proposal(
        &self,
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
    ) -> GatewayResult<RootProposalRecord> {
        self.rpc.get_proposal(zdao_id, proposal_id).await
    }

    pub async fn list_proposals(
        &self,
        zdao_id: ZdaoId,
        offset: u64,
        limit: u32,
    ) -> GatewayResult<Vec<RootProposalRecord>> {
        self.rpc.list_proposals(zdao_id, offset, limit).await
    }

    /// Registry entry; the zero-id entry some nodes return is mapped to `None`.
    pub async fn get_zdao_record(&self, zdao_id: ZdaoId) -> GatewayResult<Option<ZdaoRecord>> {
        match self.rpc.get_zdao_record(zdao_id).await {
            Ok(Some(record)) if record.id.0 == 0 || record.root_contract.is_zero() => Ok(None),
            Ok(record) => Ok(record),
            Err(GatewayError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn zdao_names(&self, zdao_id: ZdaoId) -> GatewayResult<Vec<String>> {
        self.rpc.zdao_names(zdao_id).await
    }

    pub async fn list_zdao_ids(&self, offset: u64, limit: u32) -> GatewayResult<Vec<ZdaoId>> {
        self.rpc.list_zdao_ids(offset, limit).await
    }

    pub async fn create_proposal(
        &self,
        zdao_id: ZdaoId,
        created_by: Address,
        metadata_ref: String,
    ) -> GatewayResult<TxReceipt> {
        let call = ContractCall::CreateProposal {
            zdao_id,
            created_by,
            metadata_ref,
        };
        submit_with_margin(self.rpc.as_ref(), &call).await
    }

    pub async fn cancel_proposal(
        &self,
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
        caller: Address,
    ) -> GatewayResult<TxReceipt> {
        let call = ContractCall::CancelProposal {
            zdao_id,
            proposal_id,
            caller,
        };
        submit_with_margin(self.rpc.as_ref(), &call).await
    }

    pub async fn execute_proposal(
        &self,
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
    ) -> GatewayResult<TxReceipt> {
        let call = ContractCall::ExecuteProposal {
            zdao_id,
            proposal_id,
        };
        submit_with_margin(self.rpc.as_ref(), &call).await
    }

    /// Submit an exit proof to the root message receiver.
    pub async fn receive_message(&self, proof: Vec<u8>) -> GatewayResult<TxReceipt> {
        let call = ContractCall::ReceiveMessage { proof };
        submit_with_margin(self.rpc.as_ref(), &call).await
    }

    pub async fn add_new_dao(&self, params: NewZdaoParams) -> GatewayResult<TxReceipt> {
        let call = ContractCall::AddNewDao { params };
        submit_with_margin(self.rpc.as_ref(), &call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockRootChain;

    #[test]
    fn test_gas_margin_integer_math() {
        assert_eq!(with_gas_margin(100_000), 110_000);
        assert_eq!(with_gas_margin(21_001), 23_101);
        assert_eq!(with_gas_margin(0), 0);
        assert_eq!(with_gas_margin(u64::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn test_writes_use_padded_gas_limit() {
        let mock = MockRootChain::new();
        mock.set_gas_estimate(200_000);
        let gateway = RootChainGateway::new(Arc::new(mock.clone()));

        gateway
            .create_proposal(ZdaoId(1), Address::from_bytes([9; 20]), "ipfs://Qm1".into())
            .await
            .unwrap();

        let sent = mock.sent_calls();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, 220_000);
        assert_eq!(sent[0].0.method(), "createProposal");
    }

    #[tokio::test]
    async fn test_missing_zdao_record_is_none() {
        let mock = MockRootChain::new();
        let gateway = RootChainGateway::new(Arc::new(mock));
        assert!(gateway.get_zdao_record(ZdaoId(42)).await.unwrap().is_none());
    }
}
