//! Child-chain voting contract facade.

use super::root::submit_with_margin;
use super::traits::{ChildChainRpc, ContractCall, GatewayError, GatewayResult};
use crate::types::{ChildProposalRecord, ProposalId, TxReceipt, ZdaoId};
use std::sync::Arc;

/// Read facade over the child-chain voting contract.
#[derive(Clone)]
pub struct ChildChainGateway {
    rpc: Arc<dyn ChildChainRpc>,
}

impl ChildChainGateway {
    pub fn new(rpc: Arc<dyn ChildChainRpc>) -> Self {
        Self { rpc }
    }

    /// Child record, or `None` while the proposal is not mirrored yet.
    ///
    /// A zero-id record and `NotFound` both mean "not mirrored"; every other
    /// RPC failure is an error.
    pub async fn get_proposal(
        &self,
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
    ) -> GatewayResult<Option<ChildProposalRecord>> {
        match self.rpc.get_proposal(zdao_id, proposal_id).await {
            Ok(record) if record.id.is_zero() => Ok(None),
            Ok(record) => Ok(Some(record)),
            Err(GatewayError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn is_zdao_synced(&self, zdao_id: ZdaoId) -> GatewayResult<bool> {
        self.rpc.is_zdao_synced(zdao_id).await
    }

    /// Ask the child chain to finalize its local tally. The receipt hash is
    /// the transaction later proven to the root chain.
    pub async fn calculate_proposal(
        &self,
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
    ) -> GatewayResult<TxReceipt> {
        let call = ContractCall::CalculateProposal {
            zdao_id,
            proposal_id,
        };
        submit_with_margin(self.rpc.as_ref(), &call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockChildChain;

    fn record(id: u64) -> ChildProposalRecord {
        ChildProposalRecord {
            id: ProposalId(id),
            start_timestamp: 100,
            end_timestamp: 200,
            snapshot_block: 7,
            tally: vec![1, 2],
            voters: 2,
            calculated: false,
        }
    }

    #[tokio::test]
    async fn test_missing_record_is_none() {
        let mock = MockChildChain::new();
        let gateway = ChildChainGateway::new(Arc::new(mock));
        let got = gateway.get_proposal(ZdaoId(1), ProposalId(3)).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_zero_id_record_is_none() {
        let mock = MockChildChain::new();
        mock.put_proposal(ZdaoId(1), ProposalId(3), record(0));
        let gateway = ChildChainGateway::new(Arc::new(mock));
        let got = gateway.get_proposal(ZdaoId(1), ProposalId(3)).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mock = MockChildChain::new();
        mock.fail_next_read(GatewayError::Network("connection reset".into()));
        let gateway = ChildChainGateway::new(Arc::new(mock));
        let err = gateway
            .get_proposal(ZdaoId(1), ProposalId(3))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Network("connection reset".into()));
    }

    #[tokio::test]
    async fn test_calculate_marks_record() {
        let mock = MockChildChain::new();
        mock.put_proposal(ZdaoId(1), ProposalId(3), record(3));
        let gateway = ChildChainGateway::new(Arc::new(mock.clone()));

        let receipt = gateway
            .calculate_proposal(ZdaoId(1), ProposalId(3))
            .await
            .unwrap();
        assert!(!receipt.tx_hash.is_zero());

        let got = gateway
            .get_proposal(ZdaoId(1), ProposalId(3))
            .await
            .unwrap()
            .unwrap();
        assert!(got.calculated);
    }
}
