//! Line framing
//!
//! A record is everything up to and including the next `\n`, or `capacity`
//! bytes if no newline shows up first. Bytes are pulled one at a time and
//! never waited for: when a source runs dry mid-record, the bytes read so far
//! stay in the [`LineReader`] and the record is resumed on the next wakeup.
//! A quiet or stalled writer therefore never holds up the other side.

use std::io;
use tokio::net::{unix::pipe, TcpStream};

/// Why a record could not be read
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    /// The read returned zero bytes: the peer hung up or the pipe has no writer
    #[error("end of input")]
    EndOfInput,

    /// Any other read failure
    #[error("read failed: {0}")]
    Fault(#[source] io::Error),
}

/// A source that can be read without waiting
pub trait TryRead {
    /// Read into `buf` if data is available right now; `WouldBlock` otherwise
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize>;
}

impl TryRead for TcpStream {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        TcpStream::try_read(self, buf)
    }
}

impl TryRead for pipe::Receiver {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        pipe::Receiver::try_read(self, buf)
    }
}

/// Record assembler for one source, holding at most one partial record
#[derive(Debug)]
pub struct LineReader {
    partial: Vec<u8>,
    capacity: usize,
}

impl LineReader {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "line capacity must be positive");
        Self {
            partial: Vec::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    /// Bytes of the record in progress
    pub fn pending(&self) -> &[u8] {
        &self.partial
    }

    /// Continue the current record with whatever `source` has right now
    ///
    /// Returns `Ok(Some(record))` once a newline arrives or the record reaches
    /// `capacity`, and `Ok(None)` when the source runs dry first; the bytes
    /// read so far are kept for the next call. A zero-byte read yields
    /// [`LineError::EndOfInput`] and discards the partial record.
    pub fn read_line<S: TryRead + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<Option<Vec<u8>>, LineError> {
        let mut byte = [0u8; 1];

        while self.partial.len() < self.capacity {
            match source.try_read(&mut byte) {
                Ok(0) => {
                    self.partial.clear();
                    return Err(LineError::EndOfInput);
                }
                Ok(_) => {
                    self.partial.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) => return Err(LineError::Fault(e)),
            }
        }

        Ok(Some(std::mem::take(&mut self.partial)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Source replaying a fixed script of reads; `WouldBlock` once exhausted
    pub(crate) struct Scripted(RefCell<VecDeque<io::Result<u8>>>);

    impl Scripted {
        pub(crate) fn bytes(data: &[u8]) -> Self {
            Self(RefCell::new(data.iter().map(|b| Ok(*b)).collect()))
        }

        pub(crate) fn then(self, step: io::Result<u8>) -> Self {
            self.0.borrow_mut().push_back(step);
            self
        }

        pub(crate) fn push(&self, data: &[u8]) {
            self.0.borrow_mut().extend(data.iter().map(|b| Ok(*b)));
        }
    }

    /// Zero-byte read marker for scripts
    pub(crate) fn eof() -> io::Result<u8> {
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"))
    }

    impl TryRead for Scripted {
        fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.borrow_mut().pop_front() {
                None => Err(io::ErrorKind::WouldBlock.into()),
                Some(Ok(b)) => {
                    buf[0] = b;
                    Ok(1)
                }
                Some(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(0),
                Some(Err(e)) => Err(e),
            }
        }
    }

    #[test]
    fn test_reads_through_newline() {
        let source = Scripted::bytes(b"PING\nPONG\n");
        let mut reader = LineReader::new(4096);

        assert_eq!(reader.read_line(&source).unwrap().unwrap(), b"PING\n");
        assert_eq!(reader.read_line(&source).unwrap().unwrap(), b"PONG\n");
        assert!(reader.read_line(&source).unwrap().is_none());
    }

    #[test]
    fn test_capacity_without_newline_is_one_record() {
        let source = Scripted::bytes(b"abcdefgh\n");
        let mut reader = LineReader::new(4);

        assert_eq!(reader.read_line(&source).unwrap().unwrap(), b"abcd");
        assert_eq!(reader.read_line(&source).unwrap().unwrap(), b"efgh");
        assert_eq!(reader.read_line(&source).unwrap().unwrap(), b"\n");
    }

    #[test]
    fn test_newline_exactly_at_capacity() {
        let source = Scripted::bytes(b"abc\nxyz");
        let mut reader = LineReader::new(4);
        assert_eq!(reader.read_line(&source).unwrap().unwrap(), b"abc\n");
    }

    #[test]
    fn test_partial_record_resumes_on_next_call() {
        let source = Scripted::bytes(b"ab");
        let mut reader = LineReader::new(16);

        assert!(reader.read_line(&source).unwrap().is_none());
        assert_eq!(reader.pending(), b"ab");

        source.push(b"c\n");
        assert_eq!(reader.read_line(&source).unwrap().unwrap(), b"abc\n");
        assert!(reader.pending().is_empty());
    }

    #[test]
    fn test_empty_read_is_end_of_input() {
        let source = Scripted::bytes(b"").then(eof());
        let mut reader = LineReader::new(16);
        assert!(matches!(
            reader.read_line(&source),
            Err(LineError::EndOfInput)
        ));
    }

    #[test]
    fn test_end_of_input_discards_partial_record() {
        let source = Scripted::bytes(b"half").then(eof());
        let mut reader = LineReader::new(16);

        assert!(matches!(
            reader.read_line(&source),
            Err(LineError::EndOfInput)
        ));
        assert!(reader.pending().is_empty());
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        let source = Scripted::bytes(b"o")
            .then(Err(io::ErrorKind::Interrupted.into()))
            .then(Ok(b'k'))
            .then(Ok(b'\n'));
        let mut reader = LineReader::new(8);
        assert_eq!(reader.read_line(&source).unwrap().unwrap(), b"ok\n");
    }

    #[test]
    fn test_other_errors_are_faults() {
        let source = Scripted::bytes(b"ok").then(Err(io::ErrorKind::ConnectionReset.into()));
        let mut reader = LineReader::new(8);
        match reader.read_line(&source) {
            Err(LineError::Fault(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("Expected Fault, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pipe_receiver_as_source() {
        use tokio::io::AsyncWriteExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in");
        super::super::fifo::ensure_fifo(&path, 0o700).unwrap();

        let receiver = super::super::fifo::open_reader(&path).unwrap();
        let mut sender = pipe::OpenOptions::new().open_sender(&path).unwrap();
        sender.write_all(b"hello\n").await.unwrap();
        receiver.readable().await.unwrap();

        let mut reader = LineReader::new(16);
        assert_eq!(reader.read_line(&receiver).unwrap().unwrap(), b"hello\n");
        assert!(reader.read_line(&receiver).unwrap().is_none());
    }
}
