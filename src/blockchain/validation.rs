//! Read-only integrity checks over a block or a whole chain.

use super::Block;
use super::pow::{DifficultyPolicy, meets_difficulty};
use crate::error::{BlockFault, LedgerError, Result};

/// Checks a non-genesis `block` against the block it claims to follow.
///
/// Order: index succession, linkage, sealed hash, then location and
/// difficulty. A block whose sealed hash was altered fails on the hash, a block
/// whose `previous_hash` was altered fails on linkage; neither can be blamed
/// on a neighbour.
pub fn check_successor(
    prev: &Block,
    block: &Block,
    policy: &DifficultyPolicy,
) -> std::result::Result<(), BlockFault> {
    let expected = prev.index + 1;
    if block.index != expected {
        return Err(BlockFault::IndexMismatch {
            expected,
            found: block.index,
        });
    }

    if block.previous_hash != prev.hash {
        return Err(BlockFault::LinkageMismatch {
            expected: prev.hash.clone(),
            found: block.previous_hash.clone(),
        });
    }

    let computed = block.compute_hash();
    if block.hash != computed {
        return Err(BlockFault::HashMismatch {
            stored: block.hash.clone(),
            computed,
        });
    }

    if block.location.trim().is_empty() {
        return Err(BlockFault::MissingLocation);
    }

    let required = policy.minimum_for(block.evidence.as_ref());
    if block.difficulty < required {
        return Err(BlockFault::DifficultyBelowPolicy {
            required,
            found: block.difficulty,
        });
    }

    if !meets_difficulty(&computed, block.difficulty) {
        return Err(BlockFault::InsufficientWork {
            hash: computed,
            difficulty: block.difficulty,
        });
    }

    Ok(())
}

/// Walk `chain` from genesis and report the first bad block.
pub fn validate_chain(chain: &[Block], policy: &DifficultyPolicy) -> Result<()> {
    let Some(genesis) = chain.first() else {
        return Err(LedgerError::Validation {
            index: 0,
            reason: BlockFault::MissingGenesis,
        });
    };
    if *genesis != Block::genesis() {
        return Err(LedgerError::Validation {
            index: 0,
            reason: BlockFault::GenesisMismatch,
        });
    }

    for (position, pair) in chain.windows(2).enumerate() {
        check_successor(&pair[0], &pair[1], policy).map_err(|reason| {
            LedgerError::Validation {
                index: position as u64 + 1,
                reason,
            }
        })?;
    }
    Ok(())
}
