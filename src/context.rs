//! Shared engine context.
//!
//! Built once from a validated [`SdkConfig`] and the collaborator
//! implementations, then shared read-only. Cloning is cheap: every service
//! inside only holds `Arc`s.

use crate::clock::{Clock, SystemClock};
use crate::config::SdkConfig;
use crate::error::ZdaoResult;
use crate::gateway::{ChildChainGateway, ChildChainRpc, NameResolver, RootChainGateway, RootChainRpc};
use crate::handle::ZdaoHandle;
use crate::metadata::{MetadataResolver, MetadataStore};
use crate::proposal::{ProposalLifecycle, ProposalResolver};
use crate::registry::DaoRegistry;
use crate::relay::{BridgeClient, CheckpointProofService, PollSchedule, RelayCoordinator};
use crate::treasury::TreasuryExecutor;
use crate::types::{Zdao, ZdaoId};
use std::sync::Arc;
use tracing::info;

/// Collaborator implementations the engine runs against.
#[derive(Clone)]
pub struct ContextParts {
    pub root: Arc<dyn RootChainRpc>,
    pub child: Arc<dyn ChildChainRpc>,
    pub names: Arc<dyn NameResolver>,
    pub metadata: Arc<dyn MetadataStore>,
    pub bridge: Arc<dyn BridgeClient>,
    pub treasury: Arc<dyn TreasuryExecutor>,
    pub clock: Arc<dyn Clock>,
}

impl ContextParts {
    /// Parts using the system clock.
    pub fn new(
        root: Arc<dyn RootChainRpc>,
        child: Arc<dyn ChildChainRpc>,
        names: Arc<dyn NameResolver>,
        metadata: Arc<dyn MetadataStore>,
        bridge: Arc<dyn BridgeClient>,
        treasury: Arc<dyn TreasuryExecutor>,
    ) -> Self {
        Self {
            root,
            child,
            names,
            metadata,
            bridge,
            treasury,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Immutable engine context.
#[derive(Clone)]
pub struct ZdaoContext {
    config: Arc<SdkConfig>,
    registry: DaoRegistry,
    resolver: ProposalResolver,
    checkpoints: CheckpointProofService,
    relay: RelayCoordinator,
    lifecycle: ProposalLifecycle,
}

impl ZdaoContext {
    /// Validate `config` and wire the services.
    pub fn new(config: SdkConfig, parts: ContextParts) -> ZdaoResult<Self> {
        config.validate()?;
        let schedule = PollSchedule::from_config(&config.bridge)?;

        let root = RootChainGateway::new(parts.root);
        let child = ChildChainGateway::new(parts.child);
        let metadata = MetadataResolver::new(parts.metadata, config.metadata.gateway.clone());

        let registry = DaoRegistry::new(root.clone(), child.clone(), parts.names);
        let resolver = ProposalResolver::new(
            root.clone(),
            child,
            metadata,
            parts.treasury,
            parts.clock,
            config.platform_type,
        );
        let checkpoints = CheckpointProofService::new(parts.bridge);
        let relay = RelayCoordinator::new(root);
        let lifecycle =
            ProposalLifecycle::new(resolver.clone(), checkpoints.clone(), relay.clone(), schedule);

        info!(
            root_chain = config.root.chain_id,
            child_chain = config.child.chain_id,
            platform_type = config.platform_type,
            "zDAO context ready"
        );

        Ok(Self {
            config: Arc::new(config),
            registry,
            resolver,
            checkpoints,
            relay,
            lifecycle,
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Configured listing page size.
    pub fn page_size(&self) -> u32 {
        self.config.listing.page_size
    }

    pub fn registry(&self) -> &DaoRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &ProposalResolver {
        &self.resolver
    }

    pub fn checkpoints(&self) -> &CheckpointProofService {
        &self.checkpoints
    }

    pub fn relay(&self) -> &RelayCoordinator {
        &self.relay
    }

    pub fn lifecycle(&self) -> &ProposalLifecycle {
        &self.lifecycle
    }

    /// Handle on one zDAO, resolved now.
    pub async fn zdao(&self, zdao_id: ZdaoId) -> ZdaoResult<ZdaoHandle> {
        ZdaoHandle::create_instance(self.clone(), zdao_id).await
    }

    pub async fn zdao_by_name(&self, name: &str) -> ZdaoResult<ZdaoHandle> {
        let zdao_id = self.registry.resolve_name(name).await?;
        self.zdao(zdao_id).await
    }

    pub async fn list_zdaos(&self) -> ZdaoResult<Vec<Zdao>> {
        self.registry.list_all_zdaos(self.page_size()).await
    }
}
