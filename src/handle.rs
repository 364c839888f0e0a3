//! Per-zDAO convenience handle.

use crate::context::ZdaoContext;
use crate::error::ZdaoResult;
use crate::proposal::{
    CreateProposalPayload, ExecutionReceipt, ProposalState, ProposalView,
};
use crate::relay::{CancelToken, RelayOutcome};
use crate::types::{Address, ProposalId, TxHash, Zdao, ZdaoId};
use futures::Stream;

/// A resolved zDAO bound to a context.
///
/// The zDAO snapshot is taken at construction; call
/// [`refresh`](Self::refresh) to pick up registry changes such as the DAO
/// becoming synced.
#[derive(Clone)]
pub struct ZdaoHandle {
    ctx: ZdaoContext,
    zdao: Zdao,
}

impl ZdaoHandle {
    /// Bind an already resolved zDAO. Performs no I/O.
    pub fn new(ctx: ZdaoContext, zdao: Zdao) -> Self {
        Self { ctx, zdao }
    }

    /// Resolve `zdao_id` through the registry and bind it.
    pub async fn create_instance(ctx: ZdaoContext, zdao_id: ZdaoId) -> ZdaoResult<Self> {
        let zdao = ctx.registry().get_zdao(zdao_id).await?;
        Ok(Self::new(ctx, zdao))
    }

    /// Re-resolve the zDAO.
    pub async fn refresh(&self) -> ZdaoResult<Self> {
        Self::create_instance(self.ctx.clone(), self.zdao.id).await
    }

    pub fn zdao(&self) -> &Zdao {
        &self.zdao
    }

    pub fn id(&self) -> ZdaoId {
        self.zdao.id
    }

    pub async fn proposal(&self, proposal_id: ProposalId) -> ZdaoResult<ProposalView> {
        self.ctx.resolver().resolve(&self.zdao, proposal_id).await
    }

    pub fn proposals(&self) -> impl Stream<Item = ZdaoResult<ProposalView>> + '_ {
        self.ctx.resolver().list(&self.zdao, self.ctx.page_size())
    }

    pub async fn list_proposals(&self) -> ZdaoResult<Vec<ProposalView>> {
        self.ctx
            .resolver()
            .list_all(&self.zdao, self.ctx.page_size())
            .await
    }

    pub async fn proposals_in_state(&self, state: ProposalState) -> ZdaoResult<Vec<ProposalView>> {
        self.ctx
            .resolver()
            .list_by_state(&self.zdao, self.ctx.page_size(), state)
            .await
    }

    pub async fn create_proposal(
        &self,
        creator: Address,
        payload: CreateProposalPayload,
    ) -> ZdaoResult<ProposalId> {
        self.ctx
            .lifecycle()
            .create_proposal(&self.zdao, creator, payload)
            .await
    }

    pub async fn cancel_proposal(
        &self,
        proposal_id: ProposalId,
        caller: Address,
    ) -> ZdaoResult<TxHash> {
        self.ctx
            .lifecycle()
            .cancel_proposal(&self.zdao, proposal_id, caller)
            .await
    }

    pub async fn calculate_proposal(&self, proposal_id: ProposalId) -> ZdaoResult<TxHash> {
        self.ctx
            .lifecycle()
            .calculate_proposal(&self.zdao, proposal_id)
            .await
    }

    pub async fn finalize_proposal(
        &self,
        tx_hash: &TxHash,
        cancel: &CancelToken,
    ) -> ZdaoResult<RelayOutcome> {
        self.ctx.lifecycle().finalize_proposal(tx_hash, cancel).await
    }

    pub async fn execute_proposal(&self, proposal_id: ProposalId) -> ZdaoResult<ExecutionReceipt> {
        self.ctx
            .lifecycle()
            .execute_proposal(&self.zdao, proposal_id)
            .await
    }

    pub async fn is_checkpointed(&self, tx_hash: &TxHash) -> ZdaoResult<bool> {
        self.ctx.lifecycle().is_checkpointed(tx_hash).await
    }
}
