//! Mock checkpoint bridge for testing.

use super::checkpoint::MESSAGE_SENT_EVENT_SIG;
use super::traits::{BridgeClient, BridgeError, BridgeResult};
use crate::types::TxHash;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory bridge. Each registered transaction becomes checkpointed after
/// a configurable number of polls.
#[derive(Clone, Default)]
pub struct MockBridge {
    state: Arc<Mutex<BridgeState>>,
}

#[derive(Default)]
struct BridgeState {
    exits: HashMap<TxHash, PendingExit>,
    polls: u32,
    proof_requests: Vec<(TxHash, String)>,
    fail_next_poll: Option<BridgeError>,
    fail_next_proof: Option<BridgeError>,
}

struct PendingExit {
    payload: Vec<u8>,
    pending_polls: u32,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a child-chain transaction whose exit proof is `payload`.
    /// The first `pending_polls` checkpoint polls answer "not yet".
    pub fn register_tx(&self, tx_hash: TxHash, payload: Vec<u8>, pending_polls: u32) {
        self.state.lock().unwrap().exits.insert(
            tx_hash,
            PendingExit {
                payload,
                pending_polls,
            },
        );
    }

    pub fn fail_next_poll(&self, err: BridgeError) {
        self.state.lock().unwrap().fail_next_poll = Some(err);
    }

    pub fn fail_next_proof(&self, err: BridgeError) {
        self.state.lock().unwrap().fail_next_proof = Some(err);
    }

    /// Number of checkpoint polls received, failed ones included.
    pub fn poll_count(&self) -> u32 {
        self.state.lock().unwrap().polls
    }

    pub fn proof_requests(&self) -> Vec<(TxHash, String)> {
        self.state.lock().unwrap().proof_requests.clone()
    }
}

#[async_trait]
impl BridgeClient for MockBridge {
    async fn is_checkpointed(&self, tx_hash: &TxHash) -> BridgeResult<bool> {
        let mut state = self.state.lock().unwrap();
        state.polls += 1;
        if let Some(err) = state.fail_next_poll.take() {
            return Err(err);
        }
        match state.exits.get_mut(tx_hash) {
            Some(exit) if exit.pending_polls > 0 => {
                exit.pending_polls -= 1;
                Ok(false)
            }
            Some(_) => Ok(true),
            // Not indexed yet.
            None => Ok(false),
        }
    }

    async fn build_exit_proof(
        &self,
        tx_hash: &TxHash,
        event_signature: &str,
    ) -> BridgeResult<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        state
            .proof_requests
            .push((*tx_hash, event_signature.to_string()));
        if let Some(err) = state.fail_next_proof.take() {
            return Err(err);
        }
        if event_signature != MESSAGE_SENT_EVENT_SIG {
            return Err(BridgeError::EventNotFound(event_signature.to_string()));
        }
        match state.exits.get(tx_hash) {
            Some(exit) if exit.pending_polls == 0 => Ok(exit.payload.clone()),
            Some(_) => Err(BridgeError::Proof(format!(
                "{} is not checkpointed",
                tx_hash
            ))),
            None => Err(BridgeError::UnknownTransaction(tx_hash.to_string())),
        }
    }
}
