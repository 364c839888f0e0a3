//! In-memory chains for testing.
//!
//! Both mocks keep their state behind `Arc<Mutex<_>>` so a test can hold a
//! clone for setup and inspection while the gateway owns another.

use super::traits::*;
use crate::types::{
    Address, ChildProposalRecord, ProposalId, RootProposalRecord, TxHash, TxReceipt, ZdaoId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Revert reason the mock root chain gives for a replayed exit.
pub const MOCK_EXIT_REPLAY_REASON: &str = "FxRootTunnel: EXIT_ALREADY_PROCESSED";

/// Message carried inside mock exit proofs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitMessage {
    pub zdao_id: ZdaoId,
    pub proposal_id: ProposalId,
}

impl ExitMessage {
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

fn tx_hash(chain_tag: u8, counter: u64) -> TxHash {
    let mut bytes = [0u8; 32];
    bytes[0] = chain_tag;
    bytes[24..].copy_from_slice(&counter.to_be_bytes());
    TxHash::from_bytes(bytes)
}

/// Mock root-chain registry.
#[derive(Clone)]
pub struct MockRootChain {
    state: Arc<Mutex<RootState>>,
}

struct RootState {
    proposals: BTreeMap<(ZdaoId, ProposalId), RootProposalRecord>,
    zdaos: BTreeMap<ZdaoId, ZdaoRecord>,
    names: HashMap<ZdaoId, Vec<String>>,
    consumed_exits: HashSet<Vec<u8>>,
    sent: Vec<(ContractCall, u64)>,
    list_requests: Vec<(u64, u32)>,
    gas_estimate: u64,
    now: u64,
    tx_counter: u64,
    fail_next_read: Option<GatewayError>,
    fail_next_send: Option<GatewayError>,
}

impl MockRootChain {
    /// Create new mock root chain.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RootState {
                proposals: BTreeMap::new(),
                zdaos: BTreeMap::new(),
                names: HashMap::new(),
                consumed_exits: HashSet::new(),
                sent: Vec::new(),
                list_requests: Vec::new(),
                gas_estimate: 100_000,
                now: 0,
                tx_counter: 0,
                fail_next_read: None,
                fail_next_send: None,
            })),
        }
    }

    /// Put a proposal record under its own id (for test setup).
    pub fn put_proposal(&self, zdao_id: ZdaoId, record: RootProposalRecord) {
        let id = record.id;
        self.put_proposal_at(zdao_id, id, record);
    }

    /// Put a proposal record under an arbitrary slot, e.g. to simulate a
    /// registry returning the wrong record.
    pub fn put_proposal_at(&self, zdao_id: ZdaoId, slot: ProposalId, record: RootProposalRecord) {
        let mut s = self.state.lock().unwrap();
        s.proposals.insert((zdao_id, slot), record);
    }

    /// Register a zDAO record and its stored names (for test setup).
    pub fn put_zdao(&self, record: ZdaoRecord, names: Vec<String>) {
        let mut s = self.state.lock().unwrap();
        s.names.insert(record.id, names);
        s.zdaos.insert(record.id, record);
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.state.lock().unwrap().gas_estimate = gas;
    }

    /// Timestamp stamped on created proposals.
    pub fn set_now(&self, now: u64) {
        self.state.lock().unwrap().now = now;
    }

    pub fn fail_next_read(&self, err: GatewayError) {
        self.state.lock().unwrap().fail_next_read = Some(err);
    }

    pub fn fail_next_send(&self, err: GatewayError) {
        self.state.lock().unwrap().fail_next_send = Some(err);
    }

    /// Submitted calls with the gas limit each was sent with.
    pub fn sent_calls(&self) -> Vec<(ContractCall, u64)> {
        self.state.lock().unwrap().sent.clone()
    }

    /// `(offset, limit)` of every `list_proposals` request.
    pub fn list_requests(&self) -> Vec<(u64, u32)> {
        self.state.lock().unwrap().list_requests.clone()
    }

    pub fn proposal(&self, zdao_id: ZdaoId, id: ProposalId) -> Option<RootProposalRecord> {
        self.state
            .lock()
            .unwrap()
            .proposals
            .get(&(zdao_id, id))
            .cloned()
    }

    fn take_read_failure(&self) -> GatewayResult<()> {
        match self.state.lock().unwrap().fail_next_read.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for MockRootChain {
    fn default() -> Self {
        Self::new()
    }
}

impl RootState {
    fn next_receipt(&mut self, emitted_id: Option<u64>) -> TxReceipt {
        self.tx_counter += 1;
        TxReceipt {
            tx_hash: tx_hash(0x01, self.tx_counter),
            block_number: self.tx_counter,
            gas_used: self.gas_estimate,
            emitted_id,
        }
    }

    fn proposal_mut(
        &mut self,
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
    ) -> GatewayResult<&mut RootProposalRecord> {
        self.proposals
            .get_mut(&(zdao_id, proposal_id))
            .ok_or_else(|| GatewayError::Reverted("ZDAO: invalid proposal id".to_string()))
    }

    fn apply(&mut self, call: &ContractCall) -> GatewayResult<TxReceipt> {
        match call {
            ContractCall::CreateProposal {
                zdao_id,
                created_by,
                metadata_ref,
            } => {
                let next = self.proposals.keys().filter(|(z, _)| z == zdao_id).count() as u64 + 1;
                let id = ProposalId(next);
                let record = RootProposalRecord {
                    id,
                    created_by: *created_by,
                    metadata_ref: metadata_ref.clone(),
                    created_at: self.now,
                    canceled: false,
                    calculated: false,
                    executed: false,
                };
                self.proposals.insert((*zdao_id, id), record);
                Ok(self.next_receipt(Some(next)))
            }
            ContractCall::CancelProposal {
                zdao_id,
                proposal_id,
                caller,
            } => {
                let record = self.proposal_mut(*zdao_id, *proposal_id)?;
                if record.created_by != *caller {
                    return Err(GatewayError::Reverted(
                        "ZDAO: not proposal creator".to_string(),
                    ));
                }
                record.canceled = true;
                Ok(self.next_receipt(None))
            }
            ContractCall::ExecuteProposal {
                zdao_id,
                proposal_id,
            } => {
                let record = self.proposal_mut(*zdao_id, *proposal_id)?;
                if record.executed {
                    return Err(GatewayError::Reverted(
                        "ZDAO: already executed".to_string(),
                    ));
                }
                record.executed = true;
                Ok(self.next_receipt(None))
            }
            ContractCall::ReceiveMessage { proof } => {
                if !self.consumed_exits.insert(proof.clone()) {
                    return Err(GatewayError::Reverted(MOCK_EXIT_REPLAY_REASON.to_string()));
                }
                if let Some(msg) = ExitMessage::decode(proof) {
                    if let Some(record) = self.proposals.get_mut(&(msg.zdao_id, msg.proposal_id)) {
                        record.calculated = true;
                    }
                }
                Ok(self.next_receipt(None))
            }
            ContractCall::AddNewDao { params } => {
                if self
                    .names
                    .values()
                    .any(|names| names.iter().any(|n| n == &params.name))
                {
                    return Err(GatewayError::Reverted(
                        "ZDAO: name already registered".to_string(),
                    ));
                }
                let id = ZdaoId(self.zdaos.keys().map(|k| k.0).max().unwrap_or(0) + 1);
                let record = ZdaoRecord {
                    id,
                    root_contract: Address::from_bytes([0x10; 20]),
                    child_contract: Address::from_bytes([0x20; 20]),
                    treasury_address: params.treasury_address,
                    voting_token: params.voting_token.clone(),
                    total_supply_of_voting_token: 0,
                    quorum_policy: params.quorum_policy,
                    voting_duration_secs: params.voting_duration_secs,
                    destroyed: false,
                };
                self.zdaos.insert(id, record);
                self.names.insert(id, vec![params.name.clone()]);
                Ok(self.next_receipt(Some(id.0)))
            }
            ContractCall::CalculateProposal { .. } => Err(GatewayError::Reverted(
                "calculateProposal is a child-chain call".to_string(),
            )),
        }
    }
}

#[async_trait]
impl TransactionSender for MockRootChain {
    async fn estimate_gas(&self, _call: &ContractCall) -> GatewayResult<u64> {
        Ok(self.state.lock().unwrap().gas_estimate)
    }

    async fn send_transaction(
        &self,
        call: &ContractCall,
        gas_limit: u64,
    ) -> GatewayResult<TxReceipt> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_next_send.take() {
            return Err(err);
        }
        state.sent.push((call.clone(), gas_limit));
        state.apply(call)
    }
}

#[async_trait]
impl RootChainRpc for MockRootChain {
    async fn get_proposal(
        &self,
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
    ) -> GatewayResult<RootProposalRecord> {
        self.take_read_failure()?;
        let state = self.state.lock().unwrap();
        state
            .proposals
            .get(&(zdao_id, proposal_id))
            .cloned()
            .ok_or(GatewayError::NotFound)
    }

    async fn list_proposals(
        &self,
        zdao_id: ZdaoId,
        offset: u64,
        limit: u32,
    ) -> GatewayResult<Vec<RootProposalRecord>> {
        self.take_read_failure()?;
        let mut state = self.state.lock().unwrap();
        state.list_requests.push((offset, limit));
        Ok(state
            .proposals
            .iter()
            .filter(|((z, _), _)| *z == zdao_id)
            .map(|(_, record)| record.clone())
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn get_zdao_record(&self, zdao_id: ZdaoId) -> GatewayResult<Option<ZdaoRecord>> {
        self.take_read_failure()?;
        Ok(self.state.lock().unwrap().zdaos.get(&zdao_id).cloned())
    }

    async fn zdao_names(&self, zdao_id: ZdaoId) -> GatewayResult<Vec<String>> {
        self.take_read_failure()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .names
            .get(&zdao_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_zdao_ids(&self, offset: u64, limit: u32) -> GatewayResult<Vec<ZdaoId>> {
        self.take_read_failure()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .zdaos
            .keys()
            .skip(offset as usize)
            .take(limit as usize)
            .copied()
            .collect())
    }
}

#[async_trait]
impl NameResolver for MockRootChain {
    async fn resolve(&self, name: &str) -> GatewayResult<Option<ZdaoId>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .names
            .iter()
            .find(|(_, names)| names.iter().any(|n| n == name))
            .map(|(id, _)| *id))
    }
}

/// Mock child-chain voting contract.
#[derive(Clone)]
pub struct MockChildChain {
    state: Arc<Mutex<ChildState>>,
}

struct ChildState {
    proposals: HashMap<(ZdaoId, ProposalId), ChildProposalRecord>,
    synced: HashSet<ZdaoId>,
    sent: Vec<(ContractCall, u64)>,
    gas_estimate: u64,
    tx_counter: u64,
    fail_next_read: Option<GatewayError>,
}

impl MockChildChain {
    /// Create new mock child chain.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChildState {
                proposals: HashMap::new(),
                synced: HashSet::new(),
                sent: Vec::new(),
                gas_estimate: 80_000,
                tx_counter: 0,
                fail_next_read: None,
            })),
        }
    }

    /// Put a child record under a slot (for test setup).
    pub fn put_proposal(&self, zdao_id: ZdaoId, slot: ProposalId, record: ChildProposalRecord) {
        let mut s = self.state.lock().unwrap();
        s.synced.insert(zdao_id);
        s.proposals.insert((zdao_id, slot), record);
    }

    /// Mark a zDAO as mirrored without any proposals.
    pub fn sync_zdao(&self, zdao_id: ZdaoId) {
        self.state.lock().unwrap().synced.insert(zdao_id);
    }

    pub fn fail_next_read(&self, err: GatewayError) {
        self.state.lock().unwrap().fail_next_read = Some(err);
    }

    pub fn sent_calls(&self) -> Vec<(ContractCall, u64)> {
        self.state.lock().unwrap().sent.clone()
    }
}

impl Default for MockChildChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionSender for MockChildChain {
    async fn estimate_gas(&self, _call: &ContractCall) -> GatewayResult<u64> {
        Ok(self.state.lock().unwrap().gas_estimate)
    }

    async fn send_transaction(
        &self,
        call: &ContractCall,
        gas_limit: u64,
    ) -> GatewayResult<TxReceipt> {
        let mut state = self.state.lock().unwrap();
        state.sent.push((call.clone(), gas_limit));
        match call {
            ContractCall::CalculateProposal {
                zdao_id,
                proposal_id,
            } => {
                let record = state
                    .proposals
                    .get_mut(&(*zdao_id, *proposal_id))
                    .ok_or_else(|| {
                        GatewayError::Reverted("ZDAO: proposal not synchronized".to_string())
                    })?;
                if record.calculated {
                    return Err(GatewayError::Reverted(
                        "ZDAO: already calculated".to_string(),
                    ));
                }
                record.calculated = true;
                state.tx_counter += 1;
                Ok(TxReceipt {
                    tx_hash: tx_hash(0x02, state.tx_counter),
                    block_number: state.tx_counter,
                    gas_used: state.gas_estimate,
                    emitted_id: None,
                })
            }
            other => Err(GatewayError::Reverted(format!(
                "{} is not a child-chain call",
                other.method()
            ))),
        }
    }
}

#[async_trait]
impl ChildChainRpc for MockChildChain {
    async fn get_proposal(
        &self,
        zdao_id: ZdaoId,
        proposal_id: ProposalId,
    ) -> GatewayResult<ChildProposalRecord> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_next_read.take() {
            return Err(err);
        }
        state
            .proposals
            .get(&(zdao_id, proposal_id))
            .cloned()
            .ok_or(GatewayError::NotFound)
    }

    async fn is_zdao_synced(&self, zdao_id: ZdaoId) -> GatewayResult<bool> {
        Ok(self.state.lock().unwrap().synced.contains(&zdao_id))
    }
}
