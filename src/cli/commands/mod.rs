//! CLI command implementations.

pub mod call;
pub mod inspect;
pub mod tools;
