//! Built-in observers
//!
//! Consumers of the observer bus that ship with the engine. The database
//! observer lives in the service crate with the persistence layer.

pub mod http;
pub mod logger;
pub mod websocket;

pub use http::HttpCallbackObserver;
pub use logger::LoggerObserver;
pub use websocket::WebSocketObserver;
