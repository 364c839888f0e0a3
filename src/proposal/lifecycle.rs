//! Write operations that move a proposal through its states.
//!
//! Every operation resolves the proposal fresh and checks the derived state
//! before sending anything, so a call that cannot succeed on chain fails
//! locally with a typed error instead of a revert.

use super::resolver::ProposalResolver;
use super::state::ProposalState;
use crate::error::{ZdaoError, ZdaoResult};
use crate::relay::{CancelToken, CheckpointProofService, PollSchedule, RelayCoordinator, RelayOutcome};
use crate::treasury::TransferRequest;
use crate::types::{Address, ProposalId, ProposalMetadata, TransferIntent, TxHash, Zdao};
use tracing::{info, instrument};

/// Input of [`ProposalLifecycle::create_proposal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProposalPayload {
    pub title: String,
    pub body: String,
    pub transfer: Option<TransferIntent>,
}

/// Transactions sent by [`ProposalLifecycle::execute_proposal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReceipt {
    /// `None` when the treasury had already executed the transfer and only
    /// the root record was left to mark.
    pub treasury_tx: Option<TxHash>,
    pub root_tx: TxHash,
}

#[derive(Clone)]
pub struct ProposalLifecycle {
    resolver: ProposalResolver,
    checkpoints: CheckpointProofService,
    relay: RelayCoordinator,
    schedule: PollSchedule,
}

impl ProposalLifecycle {
    pub fn new(
        resolver: ProposalResolver,
        checkpoints: CheckpointProofService,
        relay: RelayCoordinator,
        schedule: PollSchedule,
    ) -> Self {
        Self {
            resolver,
            checkpoints,
            relay,
            schedule,
        }
    }

    /// Upload the metadata and register the proposal on the root chain.
    #[instrument(skip(self, zdao, payload), fields(zdao = %zdao.id))]
    pub async fn create_proposal(
        &self,
        zdao: &Zdao,
        creator: Address,
        payload: CreateProposalPayload,
    ) -> ZdaoResult<ProposalId> {
        zdao.ensure_active()?;

        if payload.title.trim().is_empty() {
            return Err(ZdaoError::invalid("proposal title is empty"));
        }
        if let Some(transfer) = &payload.transfer {
            transfer.amount_value()?;
            if transfer.recipient.is_zero() {
                return Err(ZdaoError::invalid("transfer recipient is the zero address"));
            }
        }

        let metadata = ProposalMetadata {
            title: payload.title,
            body: payload.body,
            transfer: payload.transfer,
        };
        let metadata_ref = self.resolver.metadata().upload(&metadata).await?;

        let receipt = self
            .resolver
            .root()
            .create_proposal(zdao.id, creator, metadata_ref.clone())
            .await?;
        let id = receipt.emitted_id.map(ProposalId).ok_or_else(|| {
            ZdaoError::FailedTx(format!(
                "transaction {} emitted no proposal id",
                receipt.tx_hash
            ))
        })?;

        info!(proposal = %id, %metadata_ref, tx = %receipt.tx_hash, "proposal created");
        Ok(id)
    }

    /// Cancel a live proposal. Only its creator may do so.
    #[instrument(skip(self, zdao), fields(zdao = %zdao.id))]
    pub async fn cancel_proposal(
        &self,
        zdao: &Zdao,
        proposal_id: ProposalId,
        caller: Address,
    ) -> ZdaoResult<TxHash> {
        zdao.ensure_active()?;
        let view = self.resolver.resolve(zdao, proposal_id).await?;

        if view.created_by != caller {
            return Err(ZdaoError::invalid(format!(
                "only the creator {} can cancel proposal {}",
                view.created_by, proposal_id
            )));
        }
        if view.canceled {
            return Err(ZdaoError::invalid(format!(
                "proposal {} is already canceled",
                proposal_id
            )));
        }
        if view.executed || view.calculated {
            return Err(ZdaoError::invalid(format!(
                "proposal {} is already {}",
                proposal_id,
                view.state()
            )));
        }

        let receipt = self
            .resolver
            .root()
            .cancel_proposal(zdao.id, proposal_id, caller)
            .await?;
        info!(proposal = %proposal_id, tx = %receipt.tx_hash, "proposal canceled");
        Ok(receipt.tx_hash)
    }

    /// Ask the child chain to tally a closed proposal.
    ///
    /// Returns the child-chain transaction hash, which is what
    /// [`finalize_proposal`](Self::finalize_proposal) later proves.
    #[instrument(skip(self, zdao), fields(zdao = %zdao.id))]
    pub async fn calculate_proposal(
        &self,
        zdao: &Zdao,
        proposal_id: ProposalId,
    ) -> ZdaoResult<TxHash> {
        zdao.ensure_active()?;
        let view = self.resolver.resolve(zdao, proposal_id).await?;

        match view.state() {
            ProposalState::AwaitingCalculation => {}
            ProposalState::Pending => {
                return Err(ZdaoError::NotSyncState(format!(
                    "proposal {} is not mirrored to the child chain",
                    proposal_id
                )))
            }
            ProposalState::Active => {
                return Err(ZdaoError::invalid(format!(
                    "voting on proposal {} is open until {}",
                    proposal_id,
                    view.end().unwrap_or_default()
                )))
            }
            other => {
                return Err(ZdaoError::invalid(format!(
                    "proposal {} is {}, nothing to calculate",
                    proposal_id, other
                )))
            }
        }

        let receipt = self
            .resolver
            .child()
            .calculate_proposal(zdao.id, proposal_id)
            .await?;
        info!(proposal = %proposal_id, tx = %receipt.tx_hash, "tally calculation submitted");
        Ok(receipt.tx_hash)
    }

    /// Wait for the calculation transaction to be checkpointed, then relay
    /// its proof to the root chain.
    pub async fn finalize_proposal(
        &self,
        tx_hash: &TxHash,
        cancel: &CancelToken,
    ) -> ZdaoResult<RelayOutcome> {
        let proof = self
            .checkpoints
            .wait_for_checkpoint(tx_hash, &self.schedule, cancel)
            .await?;
        self.relay.relay(&proof).await
    }

    /// Make the treasury transfer of a passed proposal and mark it executed.
    ///
    /// When the treasury already moved the funds but the root record was
    /// never marked, only the root write is sent.
    #[instrument(skip(self, zdao), fields(zdao = %zdao.id))]
    pub async fn execute_proposal(
        &self,
        zdao: &Zdao,
        proposal_id: ProposalId,
    ) -> ZdaoResult<ExecutionReceipt> {
        zdao.ensure_active()?;
        let view = self.resolver.resolve(zdao, proposal_id).await?;

        let treasury_tx = match view.state() {
            ProposalState::AwaitingExecution => {
                let transfer = view.metadata.transfer.as_ref().ok_or_else(|| {
                    ZdaoError::invalid(format!("proposal {} has no transfer", proposal_id))
                })?;
                let request = TransferRequest {
                    platform_type: self.resolver.platform_type(),
                    zdao_id: zdao.id,
                    proposal_id,
                    treasury: zdao.treasury_address,
                    token: transfer.token,
                    recipient: transfer.recipient,
                    amount: transfer.amount_value()?,
                };
                Some(self.resolver.treasury().propose_transfer(&request).await?)
            }
            ProposalState::Executed if !view.executed => None,
            other => {
                return Err(ZdaoError::invalid(format!(
                    "proposal {} is {}, not awaiting execution",
                    proposal_id, other
                )))
            }
        };

        let receipt = self
            .resolver
            .root()
            .execute_proposal(zdao.id, proposal_id)
            .await?;
        info!(
            proposal = %proposal_id,
            treasury_tx = ?treasury_tx.map(|t| t.to_string()),
            root_tx = %receipt.tx_hash,
            "proposal executed"
        );
        Ok(ExecutionReceipt {
            treasury_tx,
            root_tx: receipt.tx_hash,
        })
    }

    pub async fn is_checkpointed(&self, tx_hash: &TxHash) -> ZdaoResult<bool> {
        self.checkpoints.is_checkpointed(tx_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::view::fixtures;
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::ErrorKind;
    use crate::gateway::mock::{ExitMessage, MockChildChain, MockRootChain};
    use crate::gateway::{ChildChainGateway, GatewayError, RootChainGateway};
    use crate::metadata::mock::MockMetadataStore;
    use crate::metadata::MetadataResolver;
    use crate::relay::mock::MockBridge;
    use crate::treasury::mock::MockTreasury;
    use crate::types::ZdaoId;
    use std::sync::Arc;
    use std::time::Duration;

    const CREATOR: Address = Address::from_bytes([1; 20]);

    struct Rig {
        root: MockRootChain,
        child: MockChildChain,
        bridge: MockBridge,
        treasury: MockTreasury,
        clock: FixedClock,
        resolver: ProposalResolver,
        lifecycle: ProposalLifecycle,
    }

    fn rig() -> Rig {
        let root = MockRootChain::new();
        let child = MockChildChain::new();
        let bridge = MockBridge::new();
        let treasury = MockTreasury::new();
        let clock = FixedClock::new(50);
        let root_gateway = RootChainGateway::new(Arc::new(root.clone()));

        let resolver = ProposalResolver::new(
            root_gateway.clone(),
            ChildChainGateway::new(Arc::new(child.clone())),
            MetadataResolver::new(Arc::new(MockMetadataStore::new()), "gw.test"),
            Arc::new(treasury.clone()),
            Arc::new(clock.clone()),
            1,
        );
        let lifecycle = ProposalLifecycle::new(
            resolver.clone(),
            CheckpointProofService::new(Arc::new(bridge.clone())),
            RelayCoordinator::new(root_gateway),
            PollSchedule::fixed(Duration::from_millis(1)),
        );

        Rig {
            root,
            child,
            bridge,
            treasury,
            clock,
            resolver,
            lifecycle,
        }
    }

    fn dao() -> Zdao {
        fixtures::zdao(fixtures::relative(5001), 0)
    }

    fn payload() -> CreateProposalPayload {
        CreateProposalPayload {
            title: "Fund the builders".to_string(),
            body: "Pay 1000 tokens".to_string(),
            transfer: Some(TransferIntent {
                sender: Address::from_bytes([0x30; 20]),
                recipient: Address::from_bytes([0x50; 20]),
                token: Address::from_bytes([0x40; 20]),
                decimals: 18,
                symbol: "WILD".to_string(),
                amount: "1000".to_string(),
            }),
        }
    }

    /// Create proposal 1 and mirror it with `tally`, voting ending at 100.
    async fn mirrored(rig: &Rig, tally: Vec<u128>) -> ProposalId {
        let id = rig
            .lifecycle
            .create_proposal(&dao(), CREATOR, payload())
            .await
            .unwrap();
        rig.child
            .put_proposal(ZdaoId(1), id, fixtures::child(id.0, 100, tally));
        id
    }

    async fn state(rig: &Rig, id: ProposalId) -> ProposalState {
        rig.resolver.resolve(&dao(), id).await.unwrap().state()
    }

    #[tokio::test]
    async fn test_create_uploads_metadata() {
        let rig = rig();
        let id = rig
            .lifecycle
            .create_proposal(&dao(), CREATOR, payload())
            .await
            .unwrap();
        assert_eq!(id, ProposalId(1));

        let view = rig.resolver.resolve(&dao(), id).await.unwrap();
        assert_eq!(view.title(), "Fund the builders");
        assert_eq!(view.created_by, CREATOR);
        assert!(view.metadata_ref.starts_with("ipfs://Qm"));
        assert_eq!(view.state(), ProposalState::Pending);
    }

    #[tokio::test]
    async fn test_create_validates_payload() {
        let rig = rig();

        let mut p = payload();
        p.title = "   ".into();
        let err = rig.lifecycle.create_proposal(&dao(), CREATOR, p).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let mut p = payload();
        if let Some(t) = p.transfer.as_mut() {
            t.amount = "0".into();
        }
        let err = rig.lifecycle.create_proposal(&dao(), CREATOR, p).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        assert!(rig.root.sent_calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_on_destroyed_dao() {
        let rig = rig();
        let mut zdao = dao();
        zdao.destroyed = true;
        let err = rig
            .lifecycle
            .create_proposal(&zdao, CREATOR, payload())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyDestroyed);
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let rig = rig();
        let id = mirrored(&rig, vec![1, 0]).await;
        let stranger = Address::from_bytes([9; 20]);

        let err = rig
            .lifecycle
            .cancel_proposal(&dao(), id, stranger)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        rig.lifecycle.cancel_proposal(&dao(), id, CREATOR).await.unwrap();
        assert_eq!(state(&rig, id).await, ProposalState::Canceled);

        let err = rig
            .lifecycle
            .cancel_proposal(&dao(), id, CREATOR)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn test_calculate_requires_sync_and_closed_window() {
        let rig = rig();
        let id = rig
            .lifecycle
            .create_proposal(&dao(), CREATOR, payload())
            .await
            .unwrap();

        let err = rig.lifecycle.calculate_proposal(&dao(), id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSyncState);

        rig.child
            .put_proposal(ZdaoId(1), id, fixtures::child(id.0, 100, vec![1, 0]));
        let err = rig.lifecycle.calculate_proposal(&dao(), id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        rig.clock.set(101);
        let tx = rig.lifecycle.calculate_proposal(&dao(), id).await.unwrap();
        assert_eq!(tx.as_bytes()[0], 0x02);
        assert_eq!(state(&rig, id).await, ProposalState::AwaitingFinalization);
    }

    #[tokio::test]
    async fn test_full_flow_to_execution() {
        let rig = rig();
        let id = mirrored(&rig, vec![6000, 4000]).await;
        rig.clock.set(101);

        let tx = rig.lifecycle.calculate_proposal(&dao(), id).await.unwrap();
        let exit = ExitMessage {
            zdao_id: ZdaoId(1),
            proposal_id: id,
        };
        rig.bridge.register_tx(tx, exit.encode(), 2);
        assert!(!rig.lifecycle.is_checkpointed(&tx).await.unwrap());

        let outcome = rig
            .lifecycle
            .finalize_proposal(&tx, &CancelToken::never())
            .await
            .unwrap();
        assert!(matches!(outcome, RelayOutcome::Relayed(_)));
        assert_eq!(state(&rig, id).await, ProposalState::AwaitingExecution);

        let receipt = rig.lifecycle.execute_proposal(&dao(), id).await.unwrap();
        assert!(receipt.treasury_tx.is_some());
        assert_eq!(state(&rig, id).await, ProposalState::Executed);

        let transfers = rig.treasury.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount, 1000);
        assert_eq!(transfers[0].treasury, dao().treasury_address);

        // Relaying the same proof again is not an error.
        let again = rig
            .lifecycle
            .finalize_proposal(&tx, &CancelToken::never())
            .await
            .unwrap();
        assert!(again.is_already_relayed());
    }

    #[tokio::test]
    async fn test_failed_proposal_cannot_execute() {
        let rig = rig();
        let id = mirrored(&rig, vec![5000, 5000]).await;
        rig.clock.set(101);

        let tx = rig.lifecycle.calculate_proposal(&dao(), id).await.unwrap();
        rig.bridge.register_tx(
            tx,
            ExitMessage {
                zdao_id: ZdaoId(1),
                proposal_id: id,
            }
            .encode(),
            0,
        );
        rig.lifecycle
            .finalize_proposal(&tx, &CancelToken::never())
            .await
            .unwrap();
        assert_eq!(state(&rig, id).await, ProposalState::Failed);

        let err = rig.lifecycle.execute_proposal(&dao(), id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert!(rig.treasury.transfers().is_empty());
    }

    #[tokio::test]
    async fn test_execute_completes_root_after_partial_failure() {
        let rig = rig();
        let id = mirrored(&rig, vec![9, 1]).await;
        rig.clock.set(101);
        let tx = rig.lifecycle.calculate_proposal(&dao(), id).await.unwrap();
        rig.bridge.register_tx(
            tx,
            ExitMessage {
                zdao_id: ZdaoId(1),
                proposal_id: id,
            }
            .encode(),
            0,
        );
        rig.lifecycle
            .finalize_proposal(&tx, &CancelToken::never())
            .await
            .unwrap();

        rig.root
            .fail_next_send(GatewayError::Reverted("out of gas".into()));
        assert!(rig.lifecycle.execute_proposal(&dao(), id).await.is_err());
        assert_eq!(rig.treasury.transfers().len(), 1);

        let receipt = rig.lifecycle.execute_proposal(&dao(), id).await.unwrap();
        assert_eq!(receipt.treasury_tx, None);
        assert!(rig.root.proposal(ZdaoId(1), id).unwrap().executed);

        let err = rig.lifecycle.execute_proposal(&dao(), id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }
}
