//! Capabilities the ledger borrows from the outside world.
//!
//! Both are synchronous traits. [`Timed`] bounds any of them with a wall clock
//! by running the call on a helper thread; a call that overruns is abandoned
//! and reported as a timeout. [`CommandOracle`] bounds itself instead, so an
//! overrunning classifier process is killed rather than left behind.

pub mod location;
pub mod oracle;

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub use location::{LocationError, LocationProvider, StaticLocation, resolve_location};
pub use oracle::{CommandOracle, DenyAll, EvidenceOracle, OracleError};

use crate::blockchain::block::Evidence;

/// Wall-clock bound around a provider.
pub struct Timed<P> {
    inner: Arc<P>,
    timeout: Duration,
}

impl<P> Timed<P> {
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }
}

/// Run `f` on its own thread, waiting at most `timeout` for the answer.
fn call_with_timeout<T, F>(timeout: Duration, f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // receiver may be gone after a timeout
        let _ = tx.send(f());
    });
    rx.recv_timeout(timeout).ok()
}

impl<P> EvidenceOracle for Timed<P>
where
    P: EvidenceOracle + 'static,
{
    fn affirms(&self, evidence: &Evidence) -> Result<bool, OracleError> {
        let inner = Arc::clone(&self.inner);
        let evidence = evidence.clone();
        call_with_timeout(self.timeout, move || inner.affirms(&evidence))
            .unwrap_or(Err(OracleError::TimedOut(self.timeout)))
    }
}

impl<P> LocationProvider for Timed<P>
where
    P: LocationProvider + 'static,
{
    fn locate(&self) -> Result<String, LocationError> {
        let inner = Arc::clone(&self.inner);
        call_with_timeout(self.timeout, move || inner.locate())
            .unwrap_or(Err(LocationError::TimedOut(self.timeout)))
    }
}
