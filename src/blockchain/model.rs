use log::{debug, info, warn};
use serde_json::Value;

use super::pow::{self, DifficultyPolicy, SearchLimit, difficulty_for};
use super::validation::{check_successor, validate_chain};
use super::{Block, Evidence};
use crate::error::{LedgerError, Result};
use crate::providers::EvidenceOracle;
use crate::transaction::{Payload, Record, TxPool};

/// In-memory append-only chain plus its pool of pending records.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: TxPool,
    policy: DifficultyPolicy,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(DifficultyPolicy::default())
    }
}

impl Ledger {
    /// Initialize a new ledger holding only the genesis block.
    pub fn new(policy: DifficultyPolicy) -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: TxPool::new(),
            policy,
        }
    }

    /// Adopt a chain received from elsewhere, provided it validates.
    pub fn from_chain(chain: Vec<Block>, policy: DifficultyPolicy) -> Result<Self> {
        validate_chain(&chain, &policy)?;
        Ok(Self {
            chain,
            pending: TxPool::new(),
            policy,
        })
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        // never empty: built with genesis, only ever appended to
        &self.chain[self.chain.len() - 1]
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn policy(&self) -> DifficultyPolicy {
        self.policy
    }

    pub fn pool(&self) -> &TxPool {
        &self.pending
    }

    pub fn pool_mut(&mut self) -> &mut TxPool {
        &mut self.pending
    }

    pub fn enqueue(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        quantity: u64,
    ) -> Result<&Record> {
        self.pending.enqueue(sender, recipient, quantity)
    }

    pub fn enqueue_raw(&mut self, value: Value) -> Result<&Record> {
        self.pending.enqueue_raw(value)
    }

    /// Candidate for the next position: current time, linked to the tip,
    /// nonce 0 and unsealed.
    pub fn new_block(
        &self,
        payload: Payload,
        evidence: Option<Evidence>,
        location: String,
    ) -> Block {
        Block::new(
            self.chain.len() as u64,
            self.last_block().hash.clone(),
            payload,
            evidence,
            location,
        )
    }

    /// Drain up to `max_records` pending records into a new candidate.
    pub fn assemble_block(
        &mut self,
        max_records: usize,
        evidence: Option<Evidence>,
        location: String,
    ) -> Block {
        let records = self.pending.drain(max_records);
        debug!(
            "LEDGER - assembling block #{} with {} records ({} still pending)",
            self.chain.len(),
            records.len(),
            self.pending.len()
        );
        self.new_block(Payload::Batch(records), evidence, location)
    }

    /// Validate a proven block against the tip and append it.
    /// On error the chain is unchanged.
    pub fn append(&mut self, block: Block) -> Result<&Block> {
        self.push_checked(block).map_err(|(_, e)| e)?;
        Ok(self.last_block())
    }

    /// Append if `block` extends the tip; otherwise hand it back with the reason.
    fn push_checked(&mut self, block: Block) -> std::result::Result<(), (Block, LedgerError)> {
        if let Err(fault) = check_successor(self.last_block(), &block, &self.policy) {
            warn!("LEDGER - rejected block #{}: {}", block.index, fault);
            return Err((block, LedgerError::InvalidBlock(fault)));
        }
        info!(
            "LEDGER - appended block #{} (hash={}, nonce={}, difficulty={}, records={})",
            block.index,
            block.hash,
            block.nonce,
            block.difficulty,
            block.payload.len()
        );
        self.chain.push(block);
        Ok(())
    }

    /// Assemble, prove and append in one go on the calling thread.
    ///
    /// Drained records go back to the pool if the search or the append fails.
    pub fn mine_block(
        &mut self,
        max_records: usize,
        evidence: Option<Evidence>,
        oracle: &dyn EvidenceOracle,
        location: String,
        limit: &SearchLimit,
    ) -> Result<&Block> {
        let difficulty = difficulty_for(evidence.as_ref(), oracle, &self.policy);
        let mut candidate = self.assemble_block(max_records, evidence, location);

        if let Err(e) = pow::search(&mut candidate, difficulty, limit) {
            self.pending.restore(candidate.payload.into_records());
            return Err(e);
        }
        if let Err((rejected, e)) = self.push_checked(candidate) {
            self.pending.restore(rejected.payload.into_records());
            return Err(e);
        }
        Ok(self.last_block())
    }

    /// Validate the entire chain: genesis, linkage, hashes and PoW.
    pub fn validate(&self) -> Result<()> {
        validate_chain(&self.chain, &self.policy)
    }
}
