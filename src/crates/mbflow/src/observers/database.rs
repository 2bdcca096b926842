//! Database observer
//!
//! Persists every event it receives, preserving the engine-assigned
//! sequence numbers. Writes are best-effort: a failed insert is logged,
//! the event is retained in a bounded in-memory retry queue, and the
//! queue is drained ahead of the next delivery.

use async_trait::async_trait;
use mbflow_core::{Event, EventFilter, EventRepository, Observer, ObserverError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_RETRY_CAPACITY: usize = 256;

pub struct DatabaseObserver {
    events: Arc<dyn EventRepository>,
    retry_queue: Mutex<VecDeque<Event>>,
    retry_capacity: usize,
}

impl DatabaseObserver {
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self {
            events,
            retry_queue: Mutex::new(VecDeque::new()),
            retry_capacity: DEFAULT_RETRY_CAPACITY,
        }
    }

    pub fn with_retry_capacity(mut self, capacity: usize) -> Self {
        self.retry_capacity = capacity;
        self
    }

    pub fn retained(&self) -> usize {
        self.retry_queue.lock().len()
    }

    fn retain(&self, event: Event) {
        let mut queue = self.retry_queue.lock();
        if queue.len() >= self.retry_capacity {
            queue.pop_front();
            warn!("database observer retry queue full, dropped oldest event");
        }
        queue.push_back(event);
    }
}

#[async_trait]
impl Observer for DatabaseObserver {
    fn name(&self) -> &str {
        "database"
    }

    fn filter(&self) -> EventFilter {
        EventFilter::all()
    }

    async fn on_event(&self, event: &Event) -> Result<(), ObserverError> {
        // Drain retained events first so the store stays as close to
        // in-order as the outage allows.
        let backlog: Vec<Event> = {
            let mut queue = self.retry_queue.lock();
            queue.drain(..).collect()
        };
        for retained in backlog {
            if let Err(e) = self.events.append(&retained).await {
                debug!(error = %e, "retained event still failing, re-queueing");
                self.retain(retained);
            }
        }

        match self.events.append(event).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(
                    execution_id = event.execution_id.as_str(),
                    sequence = event.sequence,
                    error = %e,
                    "event write failed, retaining for retry"
                );
                self.retain(event.clone());
                Err(Box::new(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::repositories::SqliteEventRepository;
    use mbflow_core::error::{EngineError, Result as EngineResult};
    use mbflow_core::EventType;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn event(sequence: i64) -> Event {
        let mut event = Event::new("exec-1", EventType::NodeLog, None, json!({}));
        event.sequence = sequence;
        event
    }

    #[tokio::test]
    async fn test_persists_with_engine_sequences() {
        let db = Arc::new(Database::test_in_memory().await.unwrap());
        let repo = Arc::new(SqliteEventRepository::new(db));
        let observer = DatabaseObserver::new(repo.clone());

        observer.on_event(&event(1)).await.unwrap();
        observer.on_event(&event(2)).await.unwrap();

        use mbflow_core::EventRepository;
        let stored = repo.since("exec-1", 0).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].sequence, 1);
        assert_eq!(stored[1].sequence, 2);
    }

    /// Event store that fails while `broken` is set.
    struct FlakyStore {
        inner: Arc<dyn EventRepository>,
        broken: AtomicBool,
    }

    #[async_trait]
    impl EventRepository for FlakyStore {
        async fn append(&self, event: &Event) -> EngineResult<Event> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(EngineError::Repository("store offline".to_string()));
            }
            self.inner.append(event).await
        }

        async fn since(&self, execution_id: &str, from_sequence: i64) -> EngineResult<Vec<Event>> {
            self.inner.since(execution_id, from_sequence).await
        }

        async fn count(&self, execution_id: &str) -> EngineResult<i64> {
            self.inner.count(execution_id).await
        }
    }

    #[tokio::test]
    async fn test_failed_writes_are_retained_and_replayed() {
        let db = Arc::new(Database::test_in_memory().await.unwrap());
        let sqlite = Arc::new(SqliteEventRepository::new(db));
        let flaky = Arc::new(FlakyStore {
            inner: sqlite.clone(),
            broken: AtomicBool::new(true),
        });
        let observer = DatabaseObserver::new(flaky.clone());

        // Store offline: both deliveries fail and are retained.
        assert!(observer.on_event(&event(1)).await.is_err());
        assert!(observer.on_event(&event(2)).await.is_err());
        assert_eq!(observer.retained(), 2);

        // Store recovers: the next delivery drains the backlog first.
        flaky.broken.store(false, Ordering::SeqCst);
        observer.on_event(&event(3)).await.unwrap();
        assert_eq!(observer.retained(), 0);

        use mbflow_core::EventRepository;
        let stored = sqlite.since("exec-1", 0).await.unwrap();
        let sequences: Vec<i64> = stored.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_retry_queue_is_bounded() {
        let db = Arc::new(Database::test_in_memory().await.unwrap());
        let sqlite = Arc::new(SqliteEventRepository::new(db));
        let flaky = Arc::new(FlakyStore {
            inner: sqlite,
            broken: AtomicBool::new(true),
        });
        let observer = DatabaseObserver::new(flaky).with_retry_capacity(3);

        for sequence in 1..=10 {
            let _ = observer.on_event(&event(sequence)).await;
        }
        assert_eq!(observer.retained(), 3);
    }
}
