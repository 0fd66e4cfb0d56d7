//! Byte form of a chain for storage or transport.
//!
//! `deserialize` only checks structure. Run `validate_chain` (or use
//! `Ledger::from_chain`) before trusting what comes back.

use super::Block;
use crate::error::Result;

pub fn serialize(chain: &[Block]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(chain)?)
}

pub fn deserialize(bytes: &[u8]) -> Result<Vec<Block>> {
    Ok(serde_json::from_slice(bytes)?)
}
