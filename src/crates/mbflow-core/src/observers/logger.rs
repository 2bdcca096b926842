//! Logger observer
//!
//! Writes every matching event to the structured log. Never fails.

use crate::bus::{EventFilter, Observer, ObserverError};
use crate::event::Event;
use async_trait::async_trait;

pub struct LoggerObserver {
    filter: EventFilter,
}

impl LoggerObserver {
    pub fn new() -> Self {
        Self {
            filter: EventFilter::all(),
        }
    }

    pub fn with_filter(filter: EventFilter) -> Self {
        Self { filter }
    }
}

impl Default for LoggerObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Observer for LoggerObserver {
    fn name(&self) -> &str {
        "logger"
    }

    fn filter(&self) -> EventFilter {
        self.filter.clone()
    }

    async fn on_event(&self, event: &Event) -> Result<(), ObserverError> {
        tracing::info!(
            execution_id = event.execution_id.as_str(),
            sequence = event.sequence,
            event_type = event.event_type.as_str(),
            node_id = event.node_id.as_deref().unwrap_or(""),
            "lifecycle event"
        );
        Ok(())
    }
}
