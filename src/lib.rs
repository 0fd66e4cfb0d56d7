//! Append-only proof-of-work ledger.
//!
//! The core lives in [`blockchain`], [`transaction`] and [`providers`]; the
//! [`api`] module is the HTTP host used by the `pow_ledger` binary.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod providers;
pub mod transaction;

pub use blockchain::{Block, DifficultyPolicy, Ledger};
pub use error::{BlockFault, LedgerError};
