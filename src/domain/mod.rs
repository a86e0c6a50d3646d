//! Domain layer for the taskweave engine
//!
//! This module contains the task model, result shapes, and the ports
//! through which external collaborators plug in.

pub mod errors;
pub mod fingerprint;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainResult, TaskError, ToolCallError, ValidationError};
