pub mod model;
pub mod pool;

pub use model::{Payload, Record, Transaction};
pub use pool::TxPool;
