use thiserror::Error;

/// Why a single block was refused, either on append or while walking a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockFault {
    #[error("chain is empty (no genesis block)")]
    MissingGenesis,
    #[error("genesis block does not match the fixed sentinel")]
    GenesisMismatch,
    #[error("index mismatch: expected {expected}, found {found}")]
    IndexMismatch { expected: u64, found: u64 },
    #[error("previous_hash {found} does not link to {expected}")]
    LinkageMismatch { expected: String, found: String },
    #[error("hash mismatch: stored {stored}, recomputed {computed}")]
    HashMismatch { stored: String, computed: String },
    #[error("hash {hash} does not satisfy difficulty {difficulty}")]
    InsufficientWork { hash: String, difficulty: u32 },
    #[error("difficulty {found} is below the required minimum {required}")]
    DifficultyBelowPolicy { required: u32, found: u32 },
    #[error("location tag is empty")]
    MissingLocation,
}

/// Reason a bounded nonce search gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchHalt {
    AttemptCap,
    Deadline,
    Cancelled,
    /// Difficulty asks for more zeros than the digest has characters.
    Unreachable,
}

impl std::fmt::Display for SearchHalt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchHalt::AttemptCap => write!(f, "attempt cap reached"),
            SearchHalt::Deadline => write!(f, "deadline exceeded"),
            SearchHalt::Cancelled => write!(f, "cancelled"),
            SearchHalt::Unreachable => write!(f, "difficulty unreachable"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid block: {0}")]
    InvalidBlock(BlockFault),

    #[error("chain invalid at index {index}: {reason}")]
    Validation { index: u64, reason: BlockFault },

    #[error("proof not found after {attempts} attempts ({halt})")]
    ProofNotFound { attempts: u64, halt: SearchHalt },

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("invalid difficulty: {0}")]
    InvalidDifficulty(String),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl LedgerError {
    /// Index of the first bad block, for chain-wide validation failures.
    pub fn failed_index(&self) -> Option<u64> {
        match self {
            LedgerError::Validation { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
