//! Infrastructure: configuration, logging and graph files.

pub mod config;
pub mod graph_file;
pub mod logging;

pub use config::{ConfigError, ConfigLoader};
pub use graph_file::{GraphFile, LoadedGraph};
pub use logging::{LoggerImpl, TracingObserver};
