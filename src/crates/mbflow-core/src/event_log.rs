//! Per-execution append-only event log
//!
//! The log is the ordering authority for lifecycle events: `append`
//! assigns the next sequence number (starting at 1, contiguous) under a
//! mutex and the stored order is never mutated afterwards. Consumers read
//! one-shot (`since`) or follow live (`stream`); persistence is the
//! database observer's job downstream of the bus.

use crate::bus::ObserverBus;
use crate::error::{EngineError, Result};
use crate::event::Event;
use futures::Stream;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Poll interval for live streaming.
const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Default)]
struct ExecutionLog {
    events: Vec<Event>,
    closed: bool,
}

/// In-memory, append-only event store keyed by `(execution_id, sequence)`.
#[derive(Debug, Default)]
pub struct EventLog {
    inner: Mutex<HashMap<String, ExecutionLog>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Append an event, assigning the next sequence for its execution.
    /// Returns the stored event. Appending to a closed log is an error;
    /// terminal executions emit nothing further.
    pub fn append(&self, mut event: Event) -> Result<Event> {
        let mut guard = self.inner.lock();
        let log = guard.entry(event.execution_id.clone()).or_default();
        if log.closed {
            return Err(EngineError::EventLog(format!(
                "event log for execution '{}' is closed",
                event.execution_id
            )));
        }
        event.sequence = log.events.len() as i64 + 1;
        log.events.push(event.clone());
        Ok(event)
    }

    /// All events with `sequence > from_sequence`, in order.
    pub fn since(&self, execution_id: &str, from_sequence: i64) -> Vec<Event> {
        let guard = self.inner.lock();
        match guard.get(execution_id) {
            Some(log) => log
                .events
                .iter()
                .filter(|e| e.sequence > from_sequence)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn count(&self, execution_id: &str) -> i64 {
        let guard = self.inner.lock();
        guard
            .get(execution_id)
            .map(|log| log.events.len() as i64)
            .unwrap_or(0)
    }

    /// Whether the log holds any state for an execution.
    pub fn contains(&self, execution_id: &str) -> bool {
        self.inner.lock().contains_key(execution_id)
    }

    /// Close an execution's log. Live streams drain and terminate; further
    /// appends fail.
    pub fn close(&self, execution_id: &str) {
        let mut guard = self.inner.lock();
        guard.entry(execution_id.to_string()).or_default().closed = true;
    }

    pub fn is_closed(&self, execution_id: &str) -> bool {
        self.inner
            .lock()
            .get(execution_id)
            .map(|log| log.closed)
            .unwrap_or(false)
    }

    /// Drop an execution's log entirely (housekeeping after persistence).
    pub fn remove(&self, execution_id: &str) {
        self.inner.lock().remove(execution_id);
    }

    /// Follow an execution's events: the first emissions cover everything
    /// already past `from_sequence`, then new events as they arrive. The
    /// stream ends when the execution's log is closed and drained.
    pub fn stream(
        self: Arc<Self>,
        execution_id: &str,
        from_sequence: i64,
    ) -> Pin<Box<dyn Stream<Item = Event> + Send>> {
        let log = self;
        let execution_id = execution_id.to_string();

        Box::pin(async_stream::stream! {
            let mut cursor = from_sequence;
            loop {
                let batch = log.since(&execution_id, cursor);
                if batch.is_empty() {
                    if log.is_closed(&execution_id) {
                        break;
                    }
                    tokio::time::sleep(STREAM_POLL_INTERVAL).await;
                    continue;
                }
                for event in batch {
                    cursor = event.sequence;
                    yield event;
                }
            }
        })
    }
}

/// Emits events to the log (sequence assignment) and fans them out to the
/// observer bus. Cloneable; one per execution.
#[derive(Clone)]
pub struct EventEmitter {
    log: Arc<EventLog>,
    bus: Arc<ObserverBus>,
    execution_id: String,
}

impl EventEmitter {
    pub fn new(log: Arc<EventLog>, bus: Arc<ObserverBus>, execution_id: impl Into<String>) -> Self {
        Self {
            log,
            bus,
            execution_id: execution_id.into(),
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// Append to the log and publish to the bus. A log failure is fatal to
    /// the owning execution and propagates; bus delivery is best-effort
    /// and never fails the caller.
    pub fn emit(&self, event: Event) -> Result<Event> {
        let stored = self.log.append(event)?;
        self.bus.publish(&stored);
        Ok(stored)
    }
}
