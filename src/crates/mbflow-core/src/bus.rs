//! Observer bus
//!
//! A buffered fan-out dispatcher between the engine and its observers.
//! The producing engine never blocks: events land on a bounded main buffer
//! with a drop-oldest policy, a single dispatcher task routes them into
//! per-observer bounded queues, and each observer drains its own queue on
//! a dedicated delivery task. A slow observer therefore only ever delays
//! itself; a failing observer is logged and counted, never propagated.

use crate::event::{Event, EventType};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Error type observers may return from delivery.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Delivery filter attached to an observer registration.
///
/// Present constraints combine with AND; an empty filter matches every
/// event.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub event_types: Option<HashSet<EventType>>,
    pub execution_ids: Option<HashSet<String>>,
}

impl EventFilter {
    /// Match every event.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_event_types(types: impl IntoIterator<Item = EventType>) -> Self {
        Self {
            event_types: Some(types.into_iter().collect()),
            execution_ids: None,
        }
    }

    pub fn for_execution(execution_id: impl Into<String>) -> Self {
        Self {
            event_types: None,
            execution_ids: Some(HashSet::from([execution_id.into()])),
        }
    }

    pub fn with_event_types(mut self, types: impl IntoIterator<Item = EventType>) -> Self {
        self.event_types = Some(types.into_iter().collect());
        self
    }

    pub fn with_execution(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_ids
            .get_or_insert_with(HashSet::new)
            .insert(execution_id.into());
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(types) = &self.event_types {
            if !types.contains(&event.event_type) {
                return false;
            }
        }
        if let Some(ids) = &self.execution_ids {
            if !ids.contains(&event.execution_id) {
                return false;
            }
        }
        true
    }
}

/// A registered consumer of lifecycle events.
#[async_trait]
pub trait Observer: Send + Sync {
    fn name(&self) -> &str;

    /// Delivery filter, sampled once at registration.
    fn filter(&self) -> EventFilter {
        EventFilter::all()
    }

    async fn on_event(&self, event: &Event) -> Result<(), ObserverError>;
}

/// Bus tuning knobs.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Main buffer capacity before drop-oldest kicks in.
    pub buffer_size: usize,
    /// Per-observer queue capacity.
    pub observer_buffer_size: usize,
    /// Upper bound on a single delivery attempt.
    pub delivery_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            buffer_size: 100,
            observer_buffer_size: 100,
            delivery_timeout: Duration::from_secs(10),
        }
    }
}

/// Counter snapshot for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusMetricsSnapshot {
    pub published: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub observer_errors: u64,
}

#[derive(Debug, Default)]
struct BusMetrics {
    published: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    observer_errors: AtomicU64,
}

struct ObserverSlot {
    observer: Arc<dyn Observer>,
    filter: EventFilter,
    queue: Mutex<VecDeque<Event>>,
    notify: Notify,
    in_flight: AtomicUsize,
}

struct BusInner {
    config: BusConfig,
    buffer: Mutex<VecDeque<Event>>,
    notify: Notify,
    observers: RwLock<Vec<Arc<ObserverSlot>>>,
    metrics: BusMetrics,
    closed: AtomicBool,
    /// Events drained from the main buffer but not yet routed into
    /// observer queues. Keeps `pending()` from under-counting mid-route.
    routing: AtomicUsize,
}

impl BusInner {
    fn pending(&self) -> usize {
        let mut pending = self.buffer.lock().len();
        pending += self.routing.load(Ordering::SeqCst);
        for slot in self.observers.read().iter() {
            pending += slot.queue.lock().len();
            pending += slot.in_flight.load(Ordering::SeqCst);
        }
        pending
    }
}

/// Buffered fan-out dispatcher with per-observer delivery.
pub struct ObserverBus {
    inner: Arc<BusInner>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ObserverBus {
    pub fn new(config: BusConfig) -> Arc<Self> {
        let inner = Arc::new(BusInner {
            config,
            buffer: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            observers: RwLock::new(Vec::new()),
            metrics: BusMetrics::default(),
            closed: AtomicBool::new(false),
            routing: AtomicUsize::new(0),
        });

        let bus = Arc::new(Self {
            inner: Arc::clone(&inner),
            tasks: Mutex::new(Vec::new()),
        });

        let dispatcher = tokio::spawn(dispatch_loop(inner));
        bus.tasks.lock().push(dispatcher);
        bus
    }

    pub fn with_defaults() -> Arc<Self> {
        Self::new(BusConfig::default())
    }

    /// Register an observer and start its delivery task. The filter is
    /// sampled once at registration time.
    pub fn register(&self, observer: Arc<dyn Observer>) {
        let slot = Arc::new(ObserverSlot {
            filter: observer.filter(),
            observer,
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            in_flight: AtomicUsize::new(0),
        });

        self.inner.observers.write().push(Arc::clone(&slot));
        let worker = tokio::spawn(delivery_loop(Arc::clone(&self.inner), slot));
        self.tasks.lock().push(worker);
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.read().len()
    }

    /// Enqueue an event for fan-out. Never blocks: when the main buffer is
    /// full the oldest unsent event is dropped and counted.
    pub fn publish(&self, event: &Event) {
        if self.inner.closed.load(Ordering::SeqCst) {
            return;
        }
        self.inner.metrics.published.fetch_add(1, Ordering::SeqCst);
        {
            let mut buffer = self.inner.buffer.lock();
            if buffer.len() >= self.inner.config.buffer_size {
                buffer.pop_front();
                self.inner.metrics.dropped.fetch_add(1, Ordering::SeqCst);
                debug!("bus buffer full, dropped oldest event");
            }
            buffer.push_back(event.clone());
        }
        self.inner.notify.notify_one();
    }

    pub fn metrics(&self) -> BusMetricsSnapshot {
        let m = &self.inner.metrics;
        BusMetricsSnapshot {
            published: m.published.load(Ordering::SeqCst),
            delivered: m.delivered.load(Ordering::SeqCst),
            dropped: m.dropped.load(Ordering::SeqCst),
            observer_errors: m.observer_errors.load(Ordering::SeqCst),
        }
    }

    /// Wait until every buffered event has been delivered (or dropped), up
    /// to `timeout`. Returns whether the bus quiesced.
    pub async fn flush(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.inner.pending() > 0 {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        true
    }

    /// Stop accepting events and let the dispatcher and delivery tasks
    /// drain and exit.
    pub async fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        // notify_one stores a permit when the task is between its
        // empty-check and its await; notify_waiters would not.
        self.inner.notify.notify_one();
        for slot in self.inner.observers.read().iter() {
            slot.notify.notify_one();
        }
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            let _ = task.await;
        }
    }
}

async fn dispatch_loop(inner: Arc<BusInner>) {
    loop {
        let notified = inner.notify.notified();
        let batch: Vec<Event> = {
            let mut buffer = inner.buffer.lock();
            let batch: Vec<Event> = buffer.drain(..).collect();
            inner.routing.store(batch.len(), Ordering::SeqCst);
            batch
        };

        if batch.is_empty() {
            if inner.closed.load(Ordering::SeqCst) {
                break;
            }
            notified.await;
            continue;
        }

        let observers = inner.observers.read().clone();
        for event in batch {
            for slot in &observers {
                if !slot.filter.matches(&event) {
                    continue;
                }
                let mut queue = slot.queue.lock();
                if queue.len() >= inner.config.observer_buffer_size {
                    queue.pop_front();
                    inner.metrics.dropped.fetch_add(1, Ordering::SeqCst);
                    debug!(
                        observer = slot.observer.name(),
                        "observer queue full, dropped oldest event"
                    );
                }
                queue.push_back(event.clone());
                drop(queue);
                slot.notify.notify_one();
            }
            inner.routing.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

async fn delivery_loop(inner: Arc<BusInner>, slot: Arc<ObserverSlot>) {
    loop {
        let notified = slot.notify.notified();
        // The in-flight marker is set under the queue lock so `pending()`
        // never observes the event in neither place.
        let next = {
            let mut queue = slot.queue.lock();
            let item = queue.pop_front();
            if item.is_some() {
                slot.in_flight.store(1, Ordering::SeqCst);
            }
            item
        };

        let Some(event) = next else {
            if inner.closed.load(Ordering::SeqCst) {
                break;
            }
            notified.await;
            continue;
        };

        let outcome =
            tokio::time::timeout(inner.config.delivery_timeout, slot.observer.on_event(&event))
                .await;
        slot.in_flight.store(0, Ordering::SeqCst);

        match outcome {
            Ok(Ok(())) => {
                inner.metrics.delivered.fetch_add(1, Ordering::SeqCst);
            }
            Ok(Err(e)) => {
                inner.metrics.observer_errors.fetch_add(1, Ordering::SeqCst);
                warn!(
                    observer = slot.observer.name(),
                    event_type = event.event_type.as_str(),
                    error = %e,
                    "observer delivery failed"
                );
            }
            Err(_) => {
                inner.metrics.observer_errors.fetch_add(1, Ordering::SeqCst);
                warn!(
                    observer = slot.observer.name(),
                    event_type = event.event_type.as_str(),
                    "observer delivery timed out"
                );
            }
        }
    }
}
