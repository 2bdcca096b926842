//! Built-in node executors
//!
//! The engine ships executors for the standard node types; user-defined
//! types plug into the same [`ExecutorRegistry`](crate::registry::ExecutorRegistry).

pub mod conditional;
pub mod delay;
pub mod http;
pub mod merge;
pub mod passthrough;
pub mod transform;

pub use conditional::ConditionalExecutor;
pub use delay::DelayExecutor;
pub use http::HttpExecutor;
pub use merge::MergeExecutor;
pub use passthrough::PassthroughExecutor;
pub use transform::TransformExecutor;

use crate::registry::ExecutorRegistry;
use std::sync::Arc;

/// Registry pre-populated with every built-in executor.
pub fn builtin_registry() -> Arc<ExecutorRegistry> {
    let registry = ExecutorRegistry::new();
    registry
        .register(Arc::new(HttpExecutor::new()))
        .expect("builtin registration");
    registry
        .register(Arc::new(TransformExecutor))
        .expect("builtin registration");
    registry
        .register(Arc::new(ConditionalExecutor))
        .expect("builtin registration");
    registry
        .register(Arc::new(MergeExecutor))
        .expect("builtin registration");
    registry
        .register(Arc::new(PassthroughExecutor))
        .expect("builtin registration");
    registry
        .register(Arc::new(DelayExecutor))
        .expect("builtin registration");
    Arc::new(registry)
}
