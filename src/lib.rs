//! zdao-sync - cross-chain proposal lifecycle for zDAOs
//!
//! A zDAO proposal is created on a root chain, voted on a child chain, and
//! executed back on the root chain once its tally has been relayed through a
//! checkpoint bridge. This crate merges both halves into one view, derives
//! the proposal's state, decides pass/fail, and drives the relay.
//!
//! Key principles:
//! - No cached state: every read re-derives the proposal state
//! - Chains, bridge, metadata store and treasury are traits; mocks back every test
//! - One immutable [`ZdaoContext`] per deployment, shared by reference
//!
//! ```rust,ignore
//! let config = SdkConfig::load(Path::new("zdao.toml"))?;
//! logging::init(&config.logging);
//! let ctx = ZdaoContext::new(config, parts)?;
//! let dao = ctx.zdao_by_name("wilder.eth").await?;
//! for view in dao.list_proposals().await? {
//!     println!("{} {}", view.id, view.state());
//! }
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod handle;
pub mod logging;
pub mod metadata;
pub mod pagination;
pub mod proposal;
pub mod registry;
pub mod relay;
pub mod treasury;
pub mod types;

pub use config::SdkConfig;
pub use context::{ContextParts, ZdaoContext};
pub use error::{ErrorKind, ZdaoError, ZdaoResult};
pub use handle::ZdaoHandle;
pub use proposal::{ProposalState, ProposalView};
pub use registry::DaoRegistry;
pub use types::{ProposalId, Zdao, ZdaoId};
