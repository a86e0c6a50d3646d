//! Port trait definitions (Hexagonal Architecture)
//!
//! Interfaces for the collaborators the task engine relies on but does
//! not implement:
//! - Orchestrator: drives agents through ready tasks
//! - StatusObserver: live status display notified on transitions
//! - PromptRenderer: renders a task into prompt text

pub mod orchestrator;
pub mod prompt_renderer;
pub mod status_observer;

pub use orchestrator::{Orchestrator, RunOptions};
pub use prompt_renderer::PromptRenderer;
pub use status_observer::StatusObserver;
