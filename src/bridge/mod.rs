//! Channel bridge - relays lines between the named pipe and the remote host
//!
//! The bridge owns three descriptors for its whole life: the TCP stream to
//! the remote host, the read end of the named pipe, and the output file.
//! Each wakeup services every ready source once, remote first, then goes
//! back to waiting. Reads never wait: a record cut short by a stalled writer
//! is kept and finished on a later wakeup. Losing the remote host ends the
//! bridge; losing the last pipe writer only reopens the pipe.

pub mod endpoint;
pub mod fifo;
pub mod line;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use futures_util::FutureExt;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::net::{unix::pipe, TcpStream};

use crate::common::config::BridgeConfig;
use crate::common::{Error, Result};
use line::{LineError, LineReader};

/// Prefix for mirrored lines received from the remote host
pub const REMOTE_PREFIX: &[u8] = b"< ";

/// Prefix for mirrored lines sent to the remote host
pub const PIPE_PREFIX: &[u8] = b"> ";

/// Which sources a wakeup found ready
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    pub remote: bool,
    pub pipe: bool,
}

/// Bridge context: every live descriptor plus the relay settings
pub struct Bridge<E = io::Stdout> {
    /// Connection to the remote host; never recreated
    remote: TcpStream,
    /// Current read end of the named pipe; replaced on every writer hangup
    pipe: pipe::Receiver,
    pipe_path: PathBuf,
    /// Receives everything the remote host sends
    sink: File,
    /// Verbose mirror target, `None` when not verbose
    echo: Option<E>,
    /// Record in progress from the remote host
    remote_line: LineReader,
    /// Record in progress from the pipe; dropped when the writer hangs up
    pipe_line: LineReader,
    reopens: u64,
}

impl<E: Write> Bridge<E> {
    /// Set up the pipe and the output file around an established connection
    ///
    /// Creates the named pipe if it is missing and opens its read end without
    /// waiting for a writer, then opens (creating if needed) the output file
    /// for appending.
    pub async fn open(remote: TcpStream, config: &BridgeConfig, echo: Option<E>) -> Result<Self> {
        fifo::ensure_fifo(&config.input, config.fifo_mode).map_err(|source| {
            Error::PipeCreate {
                path: config.input.clone(),
                source,
            }
        })?;
        let pipe = fifo::open_reader(&config.input).map_err(|source| Error::PipeOpen {
            path: config.input.clone(),
            source,
        })?;

        let sink = OpenOptions::new()
            .create(true)
            .append(true)
            .mode(0o600)
            .open(&config.output)
            .await
            .map_err(|source| Error::OutputOpen {
                path: config.output.clone(),
                source,
            })?;

        tracing::info!(
            input = %config.input.display(),
            output = %config.output.display(),
            capacity = config.line_capacity,
            "Bridge ready"
        );

        Ok(Self {
            remote,
            pipe,
            pipe_path: config.input.clone(),
            sink,
            echo,
            remote_line: LineReader::new(config.line_capacity),
            pipe_line: LineReader::new(config.line_capacity),
            reopens: 0,
        })
    }

    /// Relay lines until a fatal error
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.step().await?;
        }
    }

    /// Wait for one wakeup and service every source it found ready
    ///
    /// The remote stream is always serviced before the pipe so the output
    /// file and the mirrored `< ` lines stay ahead of pipe churn.
    pub async fn step(&mut self) -> Result<Readiness> {
        // The reactor restarts epoll_wait on EINTR itself, so every error
        // that surfaces here is fatal.
        let ready = self.wait_ready().await.map_err(Error::Multiplex)?;

        if ready.remote {
            self.service_remote().await?;
        }
        if ready.pipe {
            self.service_pipe().await?;
        }

        Ok(ready)
    }

    /// Number of times the pipe has been reopened after losing its writers
    pub fn reopens(&self) -> u64 {
        self.reopens
    }

    /// Path of the named pipe being read
    pub fn pipe_path(&self) -> &Path {
        &self.pipe_path
    }

    /// Block until the remote stream or the pipe is readable
    ///
    /// When the remote side wins, the pipe is polled once without waiting so a
    /// single wakeup can report both.
    async fn wait_ready(&self) -> io::Result<Readiness> {
        tokio::select! {
            biased;

            ready = self.remote.readable() => {
                ready?;
                let pipe = matches!(self.pipe.readable().now_or_never(), Some(Ok(())));
                Ok(Readiness { remote: true, pipe })
            }
            ready = self.pipe.readable() => {
                ready?;
                Ok(Readiness { remote: false, pipe: true })
            }
        }
    }

    async fn service_remote(&mut self) -> Result<()> {
        let line = match self.remote_line.read_line(&self.remote) {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(()),
            Err(LineError::EndOfInput) => return Err(Error::RemoteClosed),
            Err(LineError::Fault(e)) => return Err(Error::RemoteRead(e)),
        };

        self.sink.write_all(&line).await.map_err(Error::OutputWrite)?;
        self.sink.flush().await.map_err(Error::OutputWrite)?;
        tracing::trace!(bytes = line.len(), "Remote -> out");

        self.mirror(REMOTE_PREFIX, &line);
        Ok(())
    }

    async fn service_pipe(&mut self) -> Result<()> {
        let read = self.pipe_line.read_line(&self.pipe);
        let line = match pipe_event(read)? {
            PipeEvent::Line(line) => line,
            PipeEvent::Idle => {
                if !self.pipe_line.pending().is_empty() {
                    tracing::trace!(
                        bytes = self.pipe_line.pending().len(),
                        "Pipe record incomplete, waiting for more"
                    );
                }
                return Ok(());
            }
            PipeEvent::Hangup => return self.reopen_pipe(),
        };

        self.remote.write_all(&line).await.map_err(Error::RemoteWrite)?;
        tracing::trace!(bytes = line.len(), "Pipe -> remote");

        self.mirror(PIPE_PREFIX, &line);
        Ok(())
    }

    /// Replace the pipe's read end after its last writer went away
    fn reopen_pipe(&mut self) -> Result<()> {
        // The new handle is opened before the old one closes, so a writer
        // blocked in open() always has a reader to pair with.
        let fresh = fifo::open_reader(&self.pipe_path).map_err(|source| Error::PipeReopen {
            path: self.pipe_path.clone(),
            source,
        })?;
        self.pipe = fresh;
        self.reopens += 1;

        tracing::debug!(reopens = self.reopens, "Pipe writer disconnected, reopened");
        Ok(())
    }

    fn mirror(&mut self, prefix: &[u8], line: &[u8]) {
        if let Some(echo) = self.echo.as_mut() {
            if let Err(e) = write_mirrored(echo, prefix, line) {
                tracing::warn!("Failed to mirror line: {}", e);
            }
        }
    }
}

/// What a pipe read asks the bridge to do
#[derive(Debug, PartialEq, Eq)]
enum PipeEvent {
    /// A complete record to send to the remote host
    Line(Vec<u8>),
    /// Nothing complete yet
    Idle,
    /// Every writer went away; the pipe has to be reopened
    Hangup,
}

/// Classify a pipe read: only end-of-input is recoverable
fn pipe_event(read: std::result::Result<Option<Vec<u8>>, LineError>) -> Result<PipeEvent> {
    match read {
        Ok(Some(line)) => Ok(PipeEvent::Line(line)),
        Ok(None) => Ok(PipeEvent::Idle),
        Err(LineError::EndOfInput) => Ok(PipeEvent::Hangup),
        Err(LineError::Fault(e)) => Err(Error::PipeRead(e)),
    }
}

fn write_mirrored<W: Write>(out: &mut W, prefix: &[u8], line: &[u8]) -> io::Result<()> {
    out.write_all(prefix)?;
    out.write_all(line)?;
    out.flush()
}
