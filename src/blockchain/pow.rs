//! Difficulty selection and the bounded nonce search.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::block::{Block, Evidence, Preimage};
use super::{DEFAULT_BASE_DIFFICULTY, DEFAULT_MAX_ATTEMPTS, DEFAULT_REDUCED_DIFFICULTY};
use crate::error::{LedgerError, Result, SearchHalt};
use crate::providers::EvidenceOracle;

/// Hex characters in a SHA-256 digest.
pub const HEX_DIGEST_LEN: u32 = 64;

/// How often the search looks at its deadline and cancel flag.
const POLL_EVERY: u64 = 1024;

/// Difficulties in force: `base` for ordinary blocks, `reduced` for blocks
/// whose evidence the oracle affirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyPolicy {
    base: u32,
    reduced: u32,
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_DIFFICULTY,
            reduced: DEFAULT_REDUCED_DIFFICULTY,
        }
    }
}

impl DifficultyPolicy {
    pub fn new(base: u32, reduced: u32) -> Result<Self> {
        if base > HEX_DIGEST_LEN {
            return Err(LedgerError::InvalidDifficulty(format!(
                "base difficulty {base} exceeds digest length {HEX_DIGEST_LEN}"
            )));
        }
        if reduced > base {
            return Err(LedgerError::InvalidDifficulty(format!(
                "reduced difficulty {reduced} is above base difficulty {base}"
            )));
        }
        Ok(Self { base, reduced })
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn reduced(&self) -> u32 {
        self.reduced
    }

    /// Lowest difficulty a block with this evidence may carry.
    pub fn minimum_for(&self, evidence: Option<&Evidence>) -> u32 {
        match evidence {
            Some(_) => self.reduced,
            None => self.base,
        }
    }
}

/// True when `hash` starts with at least `difficulty` `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let want = difficulty as usize;
    hash.len() >= want && hash.bytes().take(want).all(|c| c == b'0')
}

/// Pick the difficulty for a block carrying `evidence`.
///
/// Only an explicit `Ok(true)` from the oracle relaxes it; errors and
/// timeouts fall back to the base difficulty.
pub fn difficulty_for(
    evidence: Option<&Evidence>,
    oracle: &dyn EvidenceOracle,
    policy: &DifficultyPolicy,
) -> u32 {
    let Some(evidence) = evidence else {
        return policy.base;
    };
    match oracle.affirms(evidence) {
        Ok(true) => {
            debug!(
                "POW - oracle affirmed label '{}', using reduced difficulty {}",
                evidence.label, policy.reduced
            );
            policy.reduced
        }
        Ok(false) => policy.base,
        Err(e) => {
            warn!("POW - oracle failed ({e}); falling back to base difficulty {}", policy.base);
            policy.base
        }
    }
}

/// Bounds on a single search.
#[derive(Debug, Clone)]
pub struct SearchLimit {
    pub max_attempts: u64,
    pub timeout: Option<Duration>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for SearchLimit {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: None,
            cancel: None,
        }
    }
}

impl SearchLimit {
    pub fn attempts(max_attempts: u64) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }
}

/// Outcome of a successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub nonce: u64,
    pub hash: String,
    pub attempts: u64,
}

/// Find the first nonce from 0 whose hash has `difficulty` leading zeros.
///
/// The candidate's `difficulty` is stamped before hashing since it is part of
/// the preimage. On success `nonce` and `hash` are written; on failure the
/// candidate's proof fields are restored.
pub fn search(candidate: &mut Block, difficulty: u32, limit: &SearchLimit) -> Result<Proof> {
    if difficulty > HEX_DIGEST_LEN {
        return Err(LedgerError::ProofNotFound {
            attempts: 0,
            halt: SearchHalt::Unreachable,
        });
    }

    let saved = (candidate.difficulty, candidate.nonce, candidate.hash.clone());
    candidate.difficulty = difficulty;
    let preimage = Preimage::of(candidate);
    let started = Instant::now();

    let mut attempts = 0u64;
    let halt = loop {
        if attempts >= limit.max_attempts {
            break SearchHalt::AttemptCap;
        }
        if attempts % POLL_EVERY == 0 {
            if limit
                .cancel
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
            {
                break SearchHalt::Cancelled;
            }
            if limit.timeout.is_some_and(|t| started.elapsed() >= t) {
                break SearchHalt::Deadline;
            }
        }

        let nonce = attempts;
        let hash = preimage.digest(nonce);
        attempts += 1;
        if meets_difficulty(&hash, difficulty) {
            candidate.nonce = nonce;
            candidate.hash = hash.clone();
            debug!(
                "POW - block #{} sealed at difficulty {} after {} attempts ({} ms)",
                candidate.index,
                difficulty,
                attempts,
                started.elapsed().as_millis()
            );
            return Ok(Proof {
                nonce,
                hash,
                attempts,
            });
        }
    };

    (candidate.difficulty, candidate.nonce, candidate.hash) = saved;
    warn!(
        "POW - gave up on block #{} at difficulty {} after {} attempts: {}",
        candidate.index, difficulty, attempts, halt
    );
    Err(LedgerError::ProofNotFound { attempts, halt })
}
