//! Named pipe creation and non-blocking read handles

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

use tokio::net::unix::pipe;

/// Create the named pipe at `path` unless one already exists
///
/// An existing FIFO is reused as is. Any other kind of file at `path` is an
/// `AlreadyExists` error.
pub fn ensure_fifo(path: &Path, mode: u32) -> io::Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), mode as libc::mode_t) };
    if rc == 0 {
        tracing::debug!(path = %path.display(), mode = %format!("{:o}", mode), "Created FIFO");
        return Ok(());
    }

    let err = io::Error::last_os_error();
    if err.kind() != io::ErrorKind::AlreadyExists {
        return Err(err);
    }

    if std::fs::metadata(path)?.file_type().is_fifo() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a FIFO", path.display()),
        ))
    }
}

/// Open the read end of the named pipe without waiting for a writer
pub fn open_reader(path: &Path) -> io::Result<pipe::Receiver> {
    pipe::OpenOptions::new().open_receiver(path)
}
