//! HTTP callback observer
//!
//! Forwards matching events to an external HTTP sink with exponential
//! backoff retries. Idempotent handling of redelivery is the sink's
//! responsibility.

use crate::bus::{EventFilter, Observer, ObserverError};
use crate::event::Event;
use crate::retry::{with_retry, RetryConfig};
use async_trait::async_trait;
use reqwest::Method;
use std::time::Duration;

pub struct HttpCallbackObserver {
    name: String,
    endpoint: String,
    method: Method,
    client: reqwest::Client,
    retry: RetryConfig,
    attempt_timeout: Duration,
    filter: EventFilter,
}

impl HttpCallbackObserver {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            method: Method::POST,
            client: reqwest::Client::new(),
            retry: RetryConfig::default(),
            attempt_timeout: Duration::from_secs(5),
            filter: EventFilter::all(),
        }
    }

    /// Use PUT instead of POST.
    pub fn with_put(mut self) -> Self {
        self.method = Method::PUT;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }
}

#[async_trait]
impl Observer for HttpCallbackObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn filter(&self) -> EventFilter {
        self.filter.clone()
    }

    async fn on_event(&self, event: &Event) -> Result<(), ObserverError> {
        with_retry(&self.retry, &self.name, || async {
            let response = self
                .client
                .request(self.method.clone(), &self.endpoint)
                .timeout(self.attempt_timeout)
                .json(event)
                .send()
                .await?;
            response.error_for_status()?;
            Ok::<_, reqwest::Error>(())
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn counting_server(fail_first: usize) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let status = if n < fail_first {
                    "HTTP/1.1 500 Internal Server Error"
                } else {
                    "HTTP/1.1 200 OK"
                };
                let reply = format!("{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status);
                let _ = socket.write_all(reply.as_bytes()).await;
            }
        });

        (format!("http://{}/hook", addr), hits)
    }

    fn retry_fast(max_attempts: usize) -> RetryConfig {
        RetryConfig::new(
            max_attempts,
            Duration::from_millis(1),
            Duration::from_millis(5),
            2.0,
        )
    }

    #[tokio::test]
    async fn test_delivers_event() {
        let (endpoint, hits) = counting_server(0).await;
        let observer = HttpCallbackObserver::new("hook", endpoint).with_retry(retry_fast(2));
        let event = Event::new("exec-1", EventType::NodeCompleted, None, json!({"ok": 1}));

        observer.on_event(&event).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let (endpoint, hits) = counting_server(2).await;
        let observer = HttpCallbackObserver::new("hook", endpoint).with_retry(retry_fast(4));
        let event = Event::new("exec-1", EventType::NodeCompleted, None, json!({}));

        observer.on_event(&event).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_the_error() {
        let (endpoint, hits) = counting_server(100).await;
        let observer = HttpCallbackObserver::new("hook", endpoint).with_retry(retry_fast(2));
        let event = Event::new("exec-1", EventType::NodeCompleted, None, json!({}));

        assert!(observer.on_event(&event).await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
