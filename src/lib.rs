//! npipe - line-oriented bridge between a named pipe and a TCP connection
//!
//! A local process talks to a network service by writing lines into a named
//! pipe and reading the service's replies from a plain file.

pub mod bridge;
pub mod cli;
pub mod commands;
pub mod common;
pub mod daemon;

// Re-export commonly used types for tests
pub use bridge::{Bridge, Readiness};
pub use common::{Error, Result};
