//! Core data model shared by gateways, resolver and relay.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Reason a hex identifier failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexParseError {
    #[error("invalid hex: {0}")]
    Hex(String),
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

fn parse_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexParseError> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(trimmed).map_err(|e| HexParseError::Hex(e.to_string()))?;
    if bytes.len() != N {
        return Err(HexParseError::Length {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

macro_rules! hex_identifier {
    ($name:ident, $len:expr) => {
        impl $name {
            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Get bytes.
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// True for the all-zero value RPC nodes return for missing entries.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = HexParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_fixed::<$len>(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// 20-byte account or contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);
hex_identifier!(Address, 20);

/// 32-byte transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TxHash([u8; 32]);
hex_identifier!(TxHash, 32);

/// Opaque registry key of a zDAO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZdaoId(pub u64);

impl fmt::Display for ZdaoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proposal identifier, shared by the root and child records of one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProposalId(pub u64);

impl ProposalId {
    /// Id 0 is never assigned; RPC nodes return it for empty slots.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ERC20 token used for voting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
}

/// Pass/fail policy of a zDAO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    /// Relative majority counts cast votes; absolute counts total supply.
    pub is_relative_majority: bool,
    /// Threshold in basis points (10000 = 100%).
    pub voting_threshold_bp: u32,
    pub minimum_voting_participants: u64,
    pub minimum_total_voting_tokens: u128,
}

/// Governance unit resolved from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zdao {
    pub id: ZdaoId,
    /// Human-readable names, deduplicated, first-seen order.
    pub associated_names: Vec<String>,
    pub root_contract: Address,
    pub child_contract: Address,
    pub treasury_address: Address,
    pub voting_token: Token,
    pub total_supply_of_voting_token: u128,
    pub quorum_policy: QuorumPolicy,
    pub voting_duration_secs: u64,
    /// DAO has been mirrored to the child chain.
    pub is_synced: bool,
    pub destroyed: bool,
}

/// Deduplicate names by value, preserving first-seen order.
pub fn dedupe_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let name = name.into();
        if seen.insert(name.clone()) {
            out.push(name);
        }
    }
    out
}

/// Proposal record held by the root-chain registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootProposalRecord {
    pub id: ProposalId,
    pub created_by: Address,
    /// Content address of the metadata JSON.
    pub metadata_ref: String,
    pub created_at: u64,
    pub canceled: bool,
    /// Root chain has accepted a relayed tally.
    pub calculated: bool,
    pub executed: bool,
}

/// Proposal record held by the child-chain voting contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildProposalRecord {
    pub id: ProposalId,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    pub snapshot_block: u64,
    /// Votes per choice, indexed by choice.
    pub tally: Vec<u128>,
    pub voters: u64,
    /// Child chain has finished local tallying.
    pub calculated: bool,
}

/// Transfer the proposal asks the treasury to make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    pub sender: Address,
    pub recipient: Address,
    pub token: Address,
    pub decimals: u8,
    pub symbol: String,
    /// Base-10 integer in token base units.
    pub amount: String,
}

impl TransferIntent {
    /// Parse the amount; it must be a positive integer.
    pub fn amount_value(&self) -> crate::error::ZdaoResult<u128> {
        let value: u128 = self.amount.trim().parse().map_err(|_| {
            crate::error::ZdaoError::invalid(format!("transfer amount '{}'", self.amount))
        })?;
        if value == 0 {
            return Err(crate::error::ZdaoError::invalid(
                "transfer amount must be greater than zero",
            ));
        }
        Ok(value)
    }
}

/// Decoded metadata JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMetadata {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferIntent>,
}

/// Proof that a child-chain transaction was included in a bridge checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayProof {
    pub tx_hash: TxHash,
    pub payload: Vec<u8>,
}

/// Receipt of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    /// Id emitted by a creation event (proposal or zDAO), if any.
    #[serde(default)]
    pub emitted_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_round_trip_display() {
        let addr = Address::from_bytes([0xab; 20]);
        let text = addr.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 42);
        assert_eq!(text.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_tx_hash_rejects_wrong_length() {
        let err = "0x1234".parse::<TxHash>().unwrap_err();
        assert_eq!(
            err,
            HexParseError::Length {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn test_zero_detection() {
        assert!(Address::default().is_zero());
        assert!(!Address::from_bytes([1; 20]).is_zero());
        assert!(ProposalId(0).is_zero());
    }

    #[test]
    fn test_dedupe_names_preserves_first_seen_order() {
        let names = dedupe_names(["a.eth", "b.eth", "a.eth"]);
        assert_eq!(names, vec!["a.eth".to_string(), "b.eth".to_string()]);
    }

    #[test]
    fn test_transfer_amount_validation() {
        let mut intent = TransferIntent {
            sender: Address::default(),
            recipient: Address::from_bytes([2; 20]),
            token: Address::from_bytes([3; 20]),
            decimals: 18,
            symbol: "ZRO".into(),
            amount: "1000".into(),
        };
        assert_eq!(intent.amount_value().unwrap(), 1000);

        intent.amount = "0".into();
        assert!(intent.amount_value().is_err());

        intent.amount = "ten".into();
        assert!(intent.amount_value().is_err());
    }

    #[test]
    fn test_metadata_json_without_transfer() {
        let json = r#"{"title":"Fund","body":"Pay the builders"}"#;
        let meta: ProposalMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.title, "Fund");
        assert!(meta.transfer.is_none());
    }
}
