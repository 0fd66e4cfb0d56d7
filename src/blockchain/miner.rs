//! Assemble, prove and append against a ledger shared between threads.
//!
//! The ledger lock is held only to snapshot the tip (draining the pool) and
//! to append. The nonce search runs with no lock held; `append` re-checks
//! index and linkage, so a block that lost a race is refused and its records
//! go back to the pool.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use super::pow::{self, SearchLimit, difficulty_for};
use super::{Block, DEFAULT_BLOCK_MAX_TXS, Evidence, Ledger};
use crate::error::Result;
use crate::providers::{DenyAll, EvidenceOracle, LocationProvider, StaticLocation, resolve_location};

fn lock(ledger: &Mutex<Ledger>) -> MutexGuard<'_, Ledger> {
    // every mutation is all-or-nothing, so a poisoned ledger is still consistent
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Miner {
    oracle: Arc<dyn EvidenceOracle>,
    location: Arc<dyn LocationProvider>,
    limit: SearchLimit,
    max_records: usize,
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(
            Arc::new(DenyAll),
            Arc::new(StaticLocation::new(super::UNKNOWN_LOCATION)),
            SearchLimit::default(),
            DEFAULT_BLOCK_MAX_TXS,
        )
    }
}

impl Miner {
    pub fn new(
        oracle: Arc<dyn EvidenceOracle>,
        location: Arc<dyn LocationProvider>,
        limit: SearchLimit,
        max_records: usize,
    ) -> Self {
        Self {
            oracle,
            location,
            limit,
            max_records,
        }
    }

    pub fn limit(&self) -> &SearchLimit {
        &self.limit
    }

    /// Build a candidate for the current tip. Takes the lock briefly.
    pub fn prepare(&self, ledger: &Mutex<Ledger>, evidence: Option<Evidence>) -> (Block, u32) {
        // collaborators may block; ask them before taking the lock
        let location = resolve_location(self.location.as_ref());
        let policy = lock(ledger).policy();
        let difficulty = difficulty_for(evidence.as_ref(), self.oracle.as_ref(), &policy);

        let candidate = lock(ledger).assemble_block(self.max_records, evidence, location);
        debug!(
            "MINER - candidate #{} prev={} records={} difficulty={}",
            candidate.index,
            candidate.previous_hash,
            candidate.payload.len(),
            difficulty
        );
        (candidate, difficulty)
    }

    /// Prove `candidate` without the lock, then append it under the lock.
    /// Drained records are restored on any failure.
    pub fn seal_and_append(
        &self,
        ledger: &Mutex<Ledger>,
        mut candidate: Block,
        difficulty: u32,
        limit: &SearchLimit,
    ) -> Result<Block> {
        if let Err(e) = pow::search(&mut candidate, difficulty, limit) {
            lock(ledger)
                .pool_mut()
                .restore(candidate.payload.into_records());
            return Err(e);
        }

        let mut guard = lock(ledger);
        match guard.append(candidate.clone()) {
            Ok(block) => {
                info!("MINER - sealed block #{} (hash={})", block.index, block.hash);
                Ok(candidate)
            }
            Err(e) => {
                warn!("MINER - block #{} lost the race: {}", candidate.index, e);
                guard.pool_mut().restore(candidate.payload.into_records());
                Err(e)
            }
        }
    }

    /// Full pipeline with the configured search limit.
    pub fn mine_next(&self, ledger: &Mutex<Ledger>, evidence: Option<Evidence>) -> Result<Block> {
        let (candidate, difficulty) = self.prepare(ledger, evidence);
        self.seal_and_append(ledger, candidate, difficulty, &self.limit)
    }
}
