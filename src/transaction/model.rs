use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::blockchain::timestamp;
use crate::error::{LedgerError, Result};

/// A transfer of `quantity` from `sender` to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub quantity: u64,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Build a transfer stamped with the current time.
    /// Sender and recipient must be non-blank.
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        quantity: u64,
    ) -> Result<Self> {
        let sender = sender.into();
        let recipient = recipient.into();
        check_parties(&sender, &recipient)?;
        Ok(Self {
            sender,
            recipient,
            quantity,
            timestamp: timestamp::now(),
        })
    }

    fn canonical(&self) -> Value {
        serde_json::json!({
            "quantity": self.quantity,
            "recipient": self.recipient,
            "sender": self.sender,
            "timestamp": timestamp::format(&self.timestamp),
        })
    }
}

fn check_parties(sender: &str, recipient: &str) -> Result<()> {
    if sender.trim().is_empty() {
        return Err(LedgerError::InvalidTransaction("sender is required".into()));
    }
    if recipient.trim().is_empty() {
        return Err(LedgerError::InvalidTransaction(
            "recipient is required".into(),
        ));
    }
    Ok(())
}

/// One pending or committed record: a typed transfer or any JSON object.
///
/// Deserialization goes through [`Record::from_map`], so a record reads back
/// as the same variant it was built as.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Transfer(Transaction),
    Raw(Map<String, Value>),
}

impl Record {
    /// Stamp an arbitrary JSON object with the current time.
    ///
    /// Objects that are exactly a transfer come back as [`Record::Transfer`],
    /// the same shape deserialization would give them.
    pub fn raw(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(LedgerError::InvalidTransaction(
                "raw record must be a JSON object".into(),
            ));
        };
        map.insert(
            "timestamp".to_string(),
            Value::String(timestamp::format(&timestamp::now())),
        );
        Ok(Self::from_map(map))
    }

    /// A map is a transfer only if it has exactly the transfer fields and
    /// both parties are non-blank; anything else stays raw.
    pub(crate) fn from_map(map: Map<String, Value>) -> Self {
        match serde_json::from_value::<Transaction>(Value::Object(map.clone())) {
            Ok(tx) if check_parties(&tx.sender, &tx.recipient).is_ok() => Record::Transfer(tx),
            _ => Record::Raw(map),
        }
    }

    /// Key-sorted JSON used in the block preimage.
    pub(crate) fn canonical(&self) -> Value {
        match self {
            Record::Transfer(tx) => tx.canonical(),
            Record::Raw(map) => canonical_value(&Value::Object(map.clone())),
        }
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(Record::from_map)
    }
}

impl From<Transaction> for Record {
    fn from(tx: Transaction) -> Self {
        Record::Transfer(tx)
    }
}

/// Block contents: a single record or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Batch(Vec<Record>),
    Single(Record),
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Batch(Vec::new())
    }
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Batch(records) if records.is_empty())
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Batch(records) => records.len(),
            Payload::Single(_) => 1,
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Payload::Batch(records) => records,
            Payload::Single(record) => vec![record],
        }
    }

    pub(crate) fn canonical(&self) -> Value {
        match self {
            Payload::Batch(records) => Value::Array(records.iter().map(Record::canonical).collect()),
            Payload::Single(record) => record.canonical(),
        }
    }
}

/// Rebuild every object with its keys in ascending order.
pub(crate) fn canonical_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonical_value(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_value).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transaction_requires_parties() {
        assert!(Transaction::new("alice", "bob", 10).is_ok());
        assert!(matches!(
            Transaction::new("", "bob", 10),
            Err(LedgerError::InvalidTransaction(msg)) if msg.contains("sender")
        ));
        assert!(matches!(
            Transaction::new("alice", "  ", 10),
            Err(LedgerError::InvalidTransaction(msg)) if msg.contains("recipient")
        ));
    }

    #[test]
    fn raw_record_is_stamped() {
        let record = Record::raw(json!({ "memo": "hello", "timestamp": "stale" })).unwrap();
        let Record::Raw(map) = record else {
            panic!("expected raw record");
        };
        assert_eq!(map["memo"], "hello");
        let stamped = map["timestamp"].as_str().unwrap();
        assert!(timestamp::parse(stamped).is_ok());
    }

    #[test]
    fn raw_record_rejects_non_objects() {
        assert!(Record::raw(json!([1, 2, 3])).is_err());
        assert!(Record::raw(json!("text")).is_err());
    }

    #[test]
    fn transfer_shaped_raw_record_normalizes() {
        let record = Record::raw(json!({ "sender": "a", "recipient": "b", "quantity": 3 })).unwrap();
        assert!(matches!(record, Record::Transfer(ref tx) if tx.quantity == 3));

        let extra = Record::raw(json!({ "sender": "a", "recipient": "b", "quantity": 3, "memo": 1 }))
            .unwrap();
        assert!(matches!(extra, Record::Raw(_)));
    }

    #[test]
    fn blank_party_transfer_stays_raw() {
        let record = Record::raw(json!({ "sender": "", "recipient": "b", "quantity": 1 })).unwrap();
        assert!(matches!(record, Record::Raw(ref map) if map["sender"] == ""));

        let record = Record::raw(json!({ "sender": "a", "recipient": "  ", "quantity": 1 })).unwrap();
        assert!(matches!(record, Record::Raw(_)));

        // and it reads back as raw, not as a transfer
        let text = serde_json::to_string(&record).unwrap();
        let back: Record = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn canonical_value_sorts_nested_keys() {
        let value = json!({ "b": { "z": 1, "a": 2 }, "a": [ { "y": 0, "x": 0 } ] });
        assert_eq!(
            canonical_value(&value).to_string(),
            r#"{"a":[{"x":0,"y":0}],"b":{"a":2,"z":1}}"#
        );
    }

    #[test]
    fn payload_shapes_survive_json() {
        let tx = Transaction::new("alice", "bob", 10).unwrap();
        let single = Payload::Single(tx.clone().into());
        let batch = Payload::Batch(vec![tx.into(), Record::raw(json!({ "k": "v" })).unwrap()]);
        for payload in [single, batch, Payload::default()] {
            let text = serde_json::to_string(&payload).unwrap();
            let back: Payload = serde_json::from_str(&text).unwrap();
            assert_eq!(back, payload);
        }
    }
}
