//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty console output
//! - Rolling JSON log files
//! - A status observer that logs task transitions

pub mod logger;
pub mod observer;

pub use logger::LoggerImpl;
pub use observer::TracingObserver;
