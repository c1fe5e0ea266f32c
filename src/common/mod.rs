//! Common utilities shared by the bridge and the launcher

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;
pub mod signal;

pub use error::{Error, Result};
