use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use super::{GENESIS_LOCATION, GENESIS_PREVIOUS_HASH, timestamp};
use crate::transaction::{Payload, Record};

/// Opaque proof material plus the label it is claimed to show.
/// Only used to pick the difficulty a block is proven at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub descriptor: String,
    pub label: String,
}

impl Evidence {
    pub fn new(descriptor: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            label: label.into(),
        }
    }
}

/// A single block in the ledger.
///
/// `hash` is the sealed digest written once the proof is found. It is never
/// part of its own preimage; see [`Block::compute_hash`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub payload: Payload,
    pub evidence: Option<Evidence>,
    /// Leading zero hex digits this block was proven at.
    pub difficulty: u32,
    pub nonce: u64,
    pub previous_hash: String,
    pub hash: String,
}

impl Block {
    /// The fixed sentinel at index 0. Identical on every call.
    pub fn genesis() -> Self {
        let mut data = Map::new();
        data.insert("name".into(), json!("The First Block"));
        data.insert("sender".into(), json!("God"));
        data.insert("recipient".into(), json!("Mankind"));
        data.insert("quantity".into(), json!(0));

        let mut block = Self {
            index: 0,
            timestamp: DateTime::<Utc>::default(),
            location: GENESIS_LOCATION.to_string(),
            payload: Payload::Single(Record::Raw(data)),
            evidence: None,
            difficulty: 0,
            nonce: 0,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Create an unproven candidate. Call `pow::search` to seal it.
    pub fn new(
        index: u64,
        previous_hash: String,
        payload: Payload,
        evidence: Option<Evidence>,
        location: String,
    ) -> Self {
        Self::new_with_timestamp(
            index,
            previous_hash,
            payload,
            evidence,
            location,
            timestamp::now(),
        )
    }

    pub fn new_with_timestamp(
        index: u64,
        previous_hash: String,
        payload: Payload,
        evidence: Option<Evidence>,
        location: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            timestamp,
            location,
            payload,
            evidence,
            difficulty: 0,
            nonce: 0,
            previous_hash,
            hash: String::new(),
        }
    }

    /// SHA-256 over the canonical form of every field except `hash`,
    /// as lowercase hex.
    pub fn compute_hash(&self) -> String {
        Preimage::of(self).digest(self.nonce)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// True once a proof has been written and still matches the fields.
    pub fn is_sealed(&self) -> bool {
        !self.hash.is_empty() && self.hash == self.compute_hash()
    }
}

/// Canonical preimage split around the nonce.
///
/// Keys are in ascending order and `nonce` sits between `location` and
/// `payload`, so the text is `head ‖ nonce ‖ tail`. The search keeps one of
/// these per candidate and only re-renders the nonce.
pub(crate) struct Preimage {
    head: String,
    tail: String,
}

impl Preimage {
    pub(crate) fn of(block: &Block) -> Self {
        let evidence = match &block.evidence {
            Some(ev) => json!({ "descriptor": ev.descriptor, "label": ev.label }),
            None => Value::Null,
        };
        let head = format!(
            r#"{{"difficulty":{},"evidence":{},"index":{},"location":{},"nonce":"#,
            block.difficulty,
            evidence,
            block.index,
            Value::String(block.location.clone()),
        );
        let tail = format!(
            r#","payload":{},"previous_hash":{},"timestamp":{}}}"#,
            block.payload.canonical(),
            Value::String(block.previous_hash.clone()),
            Value::String(timestamp::format(&block.timestamp)),
        );
        Self { head, tail }
    }

    pub(crate) fn digest(&self, nonce: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.head.as_bytes());
        hasher.update(nonce.to_string().as_bytes());
        hasher.update(self.tail.as_bytes());
        hex::encode(hasher.finalize())
    }
}
