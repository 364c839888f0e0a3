//! Merges root and child records into [`ProposalView`]s.

use super::state::ProposalState;
use super::view::ProposalView;
use crate::clock::Clock;
use crate::error::{ZdaoError, ZdaoResult};
use crate::gateway::{ChildChainGateway, GatewayError, RootChainGateway};
use crate::metadata::MetadataResolver;
use crate::pagination::paged;
use crate::treasury::{execution_hash, TreasuryExecutor};
use crate::types::{ChildProposalRecord, ProposalId, RootProposalRecord, Zdao};
use futures::future::try_join_all;
use futures::{Stream, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Resolves proposals of a zDAO. Cheap to clone; holds only shared handles.
#[derive(Clone)]
pub struct ProposalResolver {
    root: RootChainGateway,
    child: ChildChainGateway,
    metadata: MetadataResolver,
    treasury: Arc<dyn TreasuryExecutor>,
    clock: Arc<dyn Clock>,
    platform_type: u32,
}

impl ProposalResolver {
    pub fn new(
        root: RootChainGateway,
        child: ChildChainGateway,
        metadata: MetadataResolver,
        treasury: Arc<dyn TreasuryExecutor>,
        clock: Arc<dyn Clock>,
        platform_type: u32,
    ) -> Self {
        Self {
            root,
            child,
            metadata,
            treasury,
            clock,
            platform_type,
        }
    }

    pub(crate) fn root(&self) -> &RootChainGateway {
        &self.root
    }

    pub(crate) fn child(&self) -> &ChildChainGateway {
        &self.child
    }

    pub(crate) fn metadata(&self) -> &MetadataResolver {
        &self.metadata
    }

    pub(crate) fn treasury(&self) -> &dyn TreasuryExecutor {
        self.treasury.as_ref()
    }

    pub(crate) fn platform_type(&self) -> u32 {
        self.platform_type
    }

    /// Resolve one proposal.
    ///
    /// Fails with `NotFound` when the registry returns a record with another
    /// id than the one asked for.
    #[instrument(skip(self, zdao), fields(zdao = %zdao.id))]
    pub async fn resolve(&self, zdao: &Zdao, proposal_id: ProposalId) -> ZdaoResult<ProposalView> {
        let record = match self.root.get_proposal(zdao.id, proposal_id).await {
            Ok(record) => record,
            Err(GatewayError::NotFound) => {
                return Err(ZdaoError::not_found(format!(
                    "proposal {} of zDAO {}",
                    proposal_id, zdao.id
                )))
            }
            Err(e) => return Err(e.into()),
        };

        if record.id != proposal_id {
            return Err(ZdaoError::not_found(format!(
                "registry returned proposal {} when asked for {}",
                record.id, proposal_id
            )));
        }

        self.resolve_record(zdao, record).await
    }

    /// Lazily list every proposal of `zdao`, page by page.
    ///
    /// Items inside a page resolve concurrently; pages run in order.
    pub fn list<'a>(
        &'a self,
        zdao: &'a Zdao,
        page_size: u32,
    ) -> impl Stream<Item = ZdaoResult<ProposalView>> + 'a {
        paged(page_size, move |offset, limit| self.list_page(zdao, offset, limit))
    }

    /// Collect [`list`](Self::list) into a vector.
    pub async fn list_all(&self, zdao: &Zdao, page_size: u32) -> ZdaoResult<Vec<ProposalView>> {
        self.list(zdao, page_size).try_collect().await
    }

    /// Resolve one page of proposals.
    pub async fn list_page(
        &self,
        zdao: &Zdao,
        offset: u64,
        limit: u32,
    ) -> ZdaoResult<Vec<ProposalView>> {
        let records = self.root.list_proposals(zdao.id, offset, limit).await?;
        try_join_all(
            records
                .into_iter()
                .map(|record| self.resolve_record(zdao, record)),
        )
        .await
    }

    /// Merge an already-fetched root record with its child record and
    /// metadata.
    pub async fn resolve_record(
        &self,
        zdao: &Zdao,
        record: RootProposalRecord,
    ) -> ZdaoResult<ProposalView> {
        let (child, metadata) = tokio::try_join!(
            self.fetch_child(zdao, record.id),
            self.metadata.resolve(&record.metadata_ref),
        )?;

        let now = self.clock.now();
        let merged = ProposalView::merge(zdao, record, child, metadata);

        let executed_flag = if self.needs_execution_flag(&merged, now) {
            self.is_executed(&merged).await?
        } else {
            false
        };

        let view = merged.derive(now, executed_flag);
        debug!(proposal = %view.id, state = %view.state(), "resolved proposal");
        Ok(view)
    }

    async fn fetch_child(
        &self,
        zdao: &Zdao,
        proposal_id: ProposalId,
    ) -> ZdaoResult<Option<ChildProposalRecord>> {
        if !zdao.is_synced {
            return Ok(None);
        }
        Ok(self.child.get_proposal(zdao.id, proposal_id).await?)
    }

    /// The executed flag only matters once rules 1-3 have not matched.
    fn needs_execution_flag(&self, view: &ProposalView, now: u64) -> bool {
        !view.canceled && view.end().is_some_and(|end| now > end)
    }

    async fn is_executed(&self, view: &ProposalView) -> ZdaoResult<bool> {
        if view.executed {
            return Ok(true);
        }
        let hash = execution_hash(self.platform_type, view.zdao_id, view.id);
        Ok(self.treasury.is_executed(&hash).await?)
    }

    /// Proposals of `zdao` currently in `state`.
    pub async fn list_by_state(
        &self,
        zdao: &Zdao,
        page_size: u32,
        state: ProposalState,
    ) -> ZdaoResult<Vec<ProposalView>> {
        self.list(zdao, page_size)
            .try_filter(|view| futures::future::ready(view.state() == state))
            .try_collect()
            .await
    }
}
