//! Pending-call table
//!
//! Maps call ids to the completion handle of the waiting caller. The send path
//! registers, the read loop completes and connection teardown drains; all three may
//! race, so every operation goes through one short critical section.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::oneshot;

use crate::error::ClientError;

pub type CallResult = Result<Value, ClientError>;

#[derive(Default)]
struct Table {
    calls: HashMap<u64, oneshot::Sender<CallResult>>,
    /// Set once the table was drained; later registrations fail immediately
    closed: Option<String>,
}

#[derive(Default)]
pub struct PendingCalls {
    inner: Mutex<Table>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call and return the handle its caller awaits
    pub fn register(&self, id: u64) -> oneshot::Receiver<CallResult> {
        let (tx, rx) = oneshot::channel();
        let mut table = self.inner.lock();
        match &table.closed {
            Some(reason) => {
                let _ = tx.send(Err(ClientError::ConnectionLost(reason.clone())));
            }
            None => {
                table.calls.insert(id, tx);
            }
        }
        rx
    }

    /// Complete a call; returns false when the id is no longer pending
    pub fn complete(&self, id: u64, result: CallResult) -> bool {
        let Some(tx) = self.inner.lock().calls.remove(&id) else {
            return false;
        };
        // The caller may have given up already
        let _ = tx.send(result);
        true
    }

    pub fn remove(&self, id: u64) -> Option<oneshot::Sender<CallResult>> {
        self.inner.lock().calls.remove(&id)
    }

    /// Fail every outstanding call with a connection-lost error
    pub fn drain_all(&self, reason: &str) -> usize {
        let calls: Vec<_> = {
            let mut table = self.inner.lock();
            table.closed = Some(reason.to_string());
            table.calls.drain().collect()
        };

        let count = calls.len();
        for (_, tx) in calls {
            let _ = tx.send(Err(ClientError::ConnectionLost(reason.to_string())));
        }
        count
    }

    pub fn len(&self) -> usize {
        self.inner.lock().calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
