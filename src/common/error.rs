//! Error types for npipe
//!
//! Every variant that reaches `main` is fatal: the process prints the message
//! and exits non-zero. The one recoverable condition, a named pipe losing its
//! last writer, is handled inside the bridge and never becomes an `Error`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for npipe
#[derive(Error, Debug)]
pub enum Error {
    // === Startup Errors ===
    #[error("cannot resolve hostname '{host}' (port '{port}'): {reason}")]
    Resolution {
        host: String,
        port: String,
        reason: String,
    },

    #[error("cannot connect to host '{host}' on port '{port}'")]
    Connection { host: String, port: String },

    #[error("fork() failed: {0}")]
    Fork(#[source] io::Error),

    // === Named Pipe Errors ===
    #[error("cannot create FIFO {path}: {source}")]
    PipeCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open FIFO {path}: {source}")]
    PipeOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to reopen {path}: {source}")]
    PipeReopen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to read from pipe: {0}")]
    PipeRead(#[source] io::Error),

    // === Output Sink Errors ===
    #[error("cannot create file {path}: {source}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to write to out: {0}")]
    OutputWrite(#[source] io::Error),

    // === Remote Stream Errors ===
    #[error("remote host closed the connection")]
    RemoteClosed,

    #[error("unable to read from host: {0}")]
    RemoteRead(#[source] io::Error),

    #[error("unable to send to host: {0}")]
    RemoteWrite(#[source] io::Error),

    // === Event Loop Errors ===
    #[error("readiness wait failed: {0}")]
    Multiplex(#[source] io::Error),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a resolution error for a host/port pair
    pub fn resolution(host: &str, port: &str, reason: impl ToString) -> Self {
        Self::Resolution {
            host: host.to_string(),
            port: port.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a connection error for a host/port pair
    pub fn connection(host: &str, port: &str) -> Self {
        Self::Connection {
            host: host.to_string(),
            port: port.to_string(),
        }
    }
}
