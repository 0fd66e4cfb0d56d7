use std::collections::VecDeque;

use log::debug;
use serde_json::Value;

use super::model::{Record, Transaction};
use crate::error::Result;

/// FIFO queue of records waiting for a block.
#[derive(Debug, Default)]
pub struct TxPool {
    pending: VecDeque<Record>,
}

impl TxPool {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Validate, timestamp and queue a transfer.
    pub fn enqueue(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        quantity: u64,
    ) -> Result<&Record> {
        let tx = Transaction::new(sender, recipient, quantity)?;
        debug!(
            "POOL - queued transfer {} -> {} ({}); size now {}",
            tx.sender,
            tx.recipient,
            tx.quantity,
            self.pending.len() + 1
        );
        Ok(self.push(tx.into()))
    }

    /// Queue an arbitrary JSON object, stamping its `timestamp` field.
    pub fn enqueue_raw(&mut self, value: Value) -> Result<&Record> {
        let record = Record::raw(value)?;
        debug!("POOL - queued raw record; size now {}", self.pending.len() + 1);
        Ok(self.push(record))
    }

    /// Remove and return up to `n` of the oldest records.
    pub fn drain(&mut self, n: usize) -> Vec<Record> {
        let take = n.min(self.pending.len());
        self.pending.drain(..take).collect()
    }

    /// Put drained records back at the head, keeping their order.
    pub fn restore(&mut self, records: Vec<Record>) {
        for record in records.into_iter().rev() {
            self.pending.push_front(record);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.pending.iter()
    }

    fn push(&mut self, record: Record) -> &Record {
        self.pending.push_back(record);
        &self.pending[self.pending.len() - 1]
    }
}
