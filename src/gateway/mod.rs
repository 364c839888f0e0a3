//! Root- and child-chain gateways.
//!
//! Each gateway is a thin facade over an RPC trait: reads are passed through
//! with "missing" responses normalized, writes are gas-estimated and padded
//! by 10% before submission.

pub mod child;
pub mod mock;
pub mod root;
pub mod traits;

pub use child::ChildChainGateway;
pub use root::{with_gas_margin, RootChainGateway};
pub use traits::{
    ChildChainRpc, ContractCall, GatewayError, GatewayResult, NameResolver, NewZdaoParams,
    RootChainRpc, TransactionSender, ZdaoRecord,
};
