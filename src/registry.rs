//! zDAO registry: id and name resolution, listing, creation.
//!
//! A zDAO is resolved lazily from the root-chain registry and the child
//! chain's sync flag. Nothing is persisted; a [`RegistrySession`] caches
//! resolved zDAOs for the duration of one request.

use crate::error::{ZdaoError, ZdaoResult};
use crate::gateway::{ChildChainGateway, NameResolver, NewZdaoParams, RootChainGateway};
use crate::pagination::paged;
use crate::proposal::majority::BASIS_POINTS;
use crate::types::{dedupe_names, Zdao, ZdaoId};
use futures::future::try_join_all;
use futures::{Stream, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves zDAO ids and names to their configuration.
#[derive(Clone)]
pub struct DaoRegistry {
    root: RootChainGateway,
    child: ChildChainGateway,
    names: Arc<dyn NameResolver>,
}

impl DaoRegistry {
    pub fn new(
        root: RootChainGateway,
        child: ChildChainGateway,
        names: Arc<dyn NameResolver>,
    ) -> Self {
        Self { root, child, names }
    }

    /// Resolve a zDAO by id.
    pub async fn get_zdao(&self, zdao_id: ZdaoId) -> ZdaoResult<Zdao> {
        let (record, names, is_synced) = tokio::try_join!(
            self.root.get_zdao_record(zdao_id),
            self.root.zdao_names(zdao_id),
            self.child.is_zdao_synced(zdao_id),
        )?;

        let record =
            record.ok_or_else(|| ZdaoError::not_found(format!("zDAO {}", zdao_id)))?;
        if record.id != zdao_id {
            return Err(ZdaoError::not_found(format!(
                "registry returned zDAO {} when asked for {}",
                record.id, zdao_id
            )));
        }

        debug!(zdao = %zdao_id, names = names.len(), is_synced, "resolved zDAO");

        Ok(Zdao {
            id: record.id,
            associated_names: dedupe_names(names),
            root_contract: record.root_contract,
            child_contract: record.child_contract,
            treasury_address: record.treasury_address,
            voting_token: record.voting_token,
            total_supply_of_voting_token: record.total_supply_of_voting_token,
            quorum_policy: record.quorum_policy,
            voting_duration_secs: record.voting_duration_secs,
            is_synced,
            destroyed: record.destroyed,
        })
    }

    /// Map a human-readable name to a zDAO id.
    pub async fn resolve_name(&self, name: &str) -> ZdaoResult<ZdaoId> {
        self.names
            .resolve(name)
            .await?
            .ok_or_else(|| ZdaoError::not_found(format!("no zDAO is named '{}'", name)))
    }

    /// Resolve a zDAO by one of its names.
    pub async fn get_zdao_by_name(&self, name: &str) -> ZdaoResult<Zdao> {
        let id = self.resolve_name(name).await?;
        self.get_zdao(id).await
    }

    /// Lazily list every registered zDAO.
    pub fn list_zdaos(&self, page_size: u32) -> impl Stream<Item = ZdaoResult<Zdao>> + '_ {
        paged(page_size, move |offset, limit| async move {
            let ids = self.root.list_zdao_ids(offset, limit).await?;
            try_join_all(ids.into_iter().map(|id| self.get_zdao(id))).await
        })
    }

    /// Collect [`list_zdaos`](Self::list_zdaos) into a vector.
    pub async fn list_all_zdaos(&self, page_size: u32) -> ZdaoResult<Vec<Zdao>> {
        self.list_zdaos(page_size).try_collect().await
    }

    /// Register a new zDAO and return it resolved.
    pub async fn create_zdao(&self, params: NewZdaoParams) -> ZdaoResult<Zdao> {
        validate_new_zdao(&params)?;

        if let Some(existing) = self.names.resolve(&params.name).await? {
            return Err(ZdaoError::AlreadyExist(format!(
                "name '{}' already points at zDAO {}",
                params.name, existing
            )));
        }

        let name = params.name.clone();
        let receipt = self.root.add_new_dao(params).await?;
        let id = receipt.emitted_id.map(ZdaoId).ok_or_else(|| {
            ZdaoError::FailedTx(format!(
                "transaction {} emitted no zDAO id",
                receipt.tx_hash
            ))
        })?;

        info!(zdao = %id, %name, tx = %receipt.tx_hash, "zDAO created");
        self.get_zdao(id).await
    }

    /// Start a request-scoped cache.
    pub fn session(&self) -> RegistrySession<'_> {
        RegistrySession {
            registry: self,
            cache: HashMap::new(),
        }
    }
}

fn validate_new_zdao(params: &NewZdaoParams) -> ZdaoResult<()> {
    if params.name.trim().is_empty() {
        return Err(ZdaoError::invalid("zDAO name is empty"));
    }
    if u128::from(params.quorum_policy.voting_threshold_bp) > BASIS_POINTS {
        return Err(ZdaoError::invalid(format!(
            "voting threshold {}bp exceeds 10000bp",
            params.quorum_policy.voting_threshold_bp
        )));
    }
    if params.voting_duration_secs == 0 {
        return Err(ZdaoError::invalid("voting duration must be non-zero"));
    }
    if params.treasury_address.is_zero() || params.voting_token.address.is_zero() {
        return Err(ZdaoError::invalid(
            "treasury and voting token addresses are required",
        ));
    }
    Ok(())
}

impl Zdao {
    /// Fail with `AlreadyDestroyed` on a destroyed zDAO.
    pub fn ensure_active(&self) -> ZdaoResult<()> {
        if self.destroyed {
            return Err(ZdaoError::AlreadyDestroyed(format!("zDAO {}", self.id)));
        }
        Ok(())
    }
}

/// Per-request zDAO cache.
pub struct RegistrySession<'a> {
    registry: &'a DaoRegistry,
    cache: HashMap<ZdaoId, Zdao>,
}

impl RegistrySession<'_> {
    /// Resolve a zDAO, fetching it at most once per session.
    pub async fn get(&mut self, zdao_id: ZdaoId) -> ZdaoResult<&Zdao> {
        if !self.cache.contains_key(&zdao_id) {
            let zdao = self.registry.get_zdao(zdao_id).await?;
            self.cache.insert(zdao_id, zdao);
        }
        self.cache
            .get(&zdao_id)
            .ok_or_else(|| ZdaoError::not_found(format!("zDAO {}", zdao_id)))
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
