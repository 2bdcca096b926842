//! Websocket fan-out observer
//!
//! Holds a bounded send buffer per connected client; the transport layer
//! (out of scope here) forwards each buffered JSON frame over the actual
//! socket. Slow clients lose frames rather than stalling the bus, and
//! are disconnected after too many consecutive drops.

use crate::bus::{EventFilter, Observer, ObserverError};
use crate::event::Event;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const DEFAULT_CLIENT_BUFFER: usize = 64;
const DEFAULT_MAX_CONSECUTIVE_DROPS: u32 = 8;

struct WsClient {
    sender: mpsc::Sender<String>,
    filter: EventFilter,
    consecutive_drops: AtomicU32,
}

pub struct WebSocketObserver {
    clients: RwLock<HashMap<String, Arc<WsClient>>>,
    client_buffer: usize,
    max_consecutive_drops: u32,
}

impl WebSocketObserver {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            client_buffer: DEFAULT_CLIENT_BUFFER,
            max_consecutive_drops: DEFAULT_MAX_CONSECUTIVE_DROPS,
        }
    }

    pub fn with_limits(client_buffer: usize, max_consecutive_drops: u32) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            client_buffer,
            max_consecutive_drops,
        }
    }

    /// Register a client subscription; the returned receiver yields the
    /// event JSON frames the transport should push to the socket.
    pub fn subscribe(
        &self,
        client_id: impl Into<String>,
        filter: EventFilter,
    ) -> mpsc::Receiver<String> {
        let (sender, receiver) = mpsc::channel(self.client_buffer);
        let client = Arc::new(WsClient {
            sender,
            filter,
            consecutive_drops: AtomicU32::new(0),
        });
        self.clients.write().insert(client_id.into(), client);
        receiver
    }

    pub fn disconnect(&self, client_id: &str) {
        self.clients.write().remove(client_id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

impl Default for WebSocketObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Observer for WebSocketObserver {
    fn name(&self) -> &str {
        "websocket"
    }

    async fn on_event(&self, event: &Event) -> Result<(), ObserverError> {
        let frame = serde_json::to_string(event)?;
        let clients: Vec<(String, Arc<WsClient>)> = self
            .clients
            .read()
            .iter()
            .map(|(id, client)| (id.clone(), Arc::clone(client)))
            .collect();

        let mut stale: Vec<String> = Vec::new();
        for (client_id, client) in clients {
            if !client.filter.matches(event) {
                continue;
            }
            match client.sender.try_send(frame.clone()) {
                Ok(()) => {
                    client.consecutive_drops.store(0, Ordering::SeqCst);
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    let drops = client.consecutive_drops.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!(client_id = client_id.as_str(), drops, "client buffer full, frame dropped");
                    if drops >= self.max_consecutive_drops {
                        warn!(
                            client_id = client_id.as_str(),
                            "client too slow, disconnecting"
                        );
                        stale.push(client_id);
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    stale.push(client_id);
                }
            }
        }

        if !stale.is_empty() {
            let mut guard = self.clients.write();
            for client_id in stale {
                guard.remove(&client_id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use serde_json::json;

    fn event(execution_id: &str) -> Event {
        Event::new(execution_id, EventType::NodeCompleted, None, json!({}))
    }

    #[tokio::test]
    async fn test_subscribed_client_receives_frames() {
        let observer = WebSocketObserver::new();
        let mut receiver = observer.subscribe("client-1", EventFilter::all());

        observer.on_event(&event("exec-1")).await.unwrap();

        let frame = receiver.recv().await.unwrap();
        let parsed: Event = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed.execution_id, "exec-1");
    }

    #[tokio::test]
    async fn test_subscription_filter() {
        let observer = WebSocketObserver::new();
        let mut receiver = observer.subscribe("client-1", EventFilter::for_execution("exec-2"));

        observer.on_event(&event("exec-1")).await.unwrap();
        observer.on_event(&event("exec-2")).await.unwrap();

        let frame = receiver.recv().await.unwrap();
        let parsed: Event = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed.execution_id, "exec-2");
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_slow_client_is_disconnected_after_drops() {
        let observer = WebSocketObserver::with_limits(1, 3);
        // Receiver never drained: buffer of 1 fills after the first frame.
        let _receiver = observer.subscribe("slow", EventFilter::all());

        observer.on_event(&event("exec-1")).await.unwrap();
        assert_eq!(observer.client_count(), 1);

        // Three consecutive drops hit the disconnect threshold.
        for _ in 0..3 {
            observer.on_event(&event("exec-1")).await.unwrap();
        }
        assert_eq!(observer.client_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_receiver_is_pruned() {
        let observer = WebSocketObserver::new();
        let receiver = observer.subscribe("gone", EventFilter::all());
        drop(receiver);

        observer.on_event(&event("exec-1")).await.unwrap();
        assert_eq!(observer.client_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let observer = WebSocketObserver::new();
        let _receiver = observer.subscribe("client-1", EventFilter::all());
        assert_eq!(observer.client_count(), 1);
        observer.disconnect("client-1");
        assert_eq!(observer.client_count(), 0);
    }
}
