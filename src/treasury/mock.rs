//! Mock treasury for testing.

use super::{TransferRequest, TreasuryError, TreasuryExecutor, TreasuryResult};
use crate::types::TxHash;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockTreasury {
    state: Arc<Mutex<TreasuryState>>,
}

#[derive(Default)]
struct TreasuryState {
    executed: HashSet<[u8; 32]>,
    transfers: Vec<TransferRequest>,
    reject_next: Option<String>,
}

impl MockTreasury {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an execution hash as already executed (for test setup).
    pub fn mark_executed(&self, hash: [u8; 32]) {
        self.state.lock().unwrap().executed.insert(hash);
    }

    pub fn reject_next(&self, reason: &str) {
        self.state.lock().unwrap().reject_next = Some(reason.to_string());
    }

    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.state.lock().unwrap().transfers.clone()
    }
}

#[async_trait]
impl TreasuryExecutor for MockTreasury {
    async fn is_executed(&self, execution_hash: &[u8; 32]) -> TreasuryResult<bool> {
        Ok(self.state.lock().unwrap().executed.contains(execution_hash))
    }

    async fn propose_transfer(&self, request: &TransferRequest) -> TreasuryResult<TxHash> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.reject_next.take() {
            return Err(TreasuryError::Rejected(reason));
        }
        let hash = request.execution_hash();
        if !state.executed.insert(hash) {
            return Err(TreasuryError::Rejected("already executed".to_string()));
        }
        state.transfers.push(request.clone());
        Ok(TxHash::from_bytes(hash))
    }
}
