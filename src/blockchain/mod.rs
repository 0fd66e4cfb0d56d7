pub mod block;
pub mod codec;
pub mod miner;
pub mod model;
pub mod pow;
pub mod timestamp;
pub mod validation;

pub use block::{Block, Evidence};
pub use miner::Miner;
pub use model::Ledger;
pub use pow::{DifficultyPolicy, Proof, SearchLimit};
pub use validation::validate_chain;

/// Default Proof-of-Work difficulty (leading zero hex digits).
pub const DEFAULT_BASE_DIFFICULTY: u32 = 4;

/// Difficulty for blocks whose evidence the oracle affirmed.
pub const DEFAULT_REDUCED_DIFFICULTY: u32 = 1;

/// Upper bound on nonces tried per search unless configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 50_000_000;

/// Records drained from the pool into one block by default.
pub const DEFAULT_BLOCK_MAX_TXS: usize = 100;

/// Location tag used when the provider cannot answer.
pub const UNKNOWN_LOCATION: &str = "unknown";

pub const GENESIS_LOCATION: &str = UNKNOWN_LOCATION;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
