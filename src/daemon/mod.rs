//! Session launcher - optional fork-and-detach before any descriptor is opened
//!
//! The parent prints the child's pid and exits successfully; the child
//! carries on into the bridge in a new session, with no tie to the invoking
//! terminal. Parent and child never talk to each other again.

use std::io::{self, Write};

use crate::common::{Error, Result};

/// Which side of the fork this process ended up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The invoking process; `child` is the detached daemon's pid
    Parent { child: u32 },
    /// The detached daemon
    Child,
}

/// Split the process in two
///
/// Must run before the async runtime or any logging thread exists: only the
/// calling thread survives in the child.
pub fn fork_detached() -> Result<Role> {
    let pid = unsafe { libc::fork() };

    match pid {
        -1 => Err(Error::Fork(io::Error::last_os_error())),
        0 => {
            if unsafe { libc::setsid() } == -1 {
                // Already a group leader; the child still runs detached from
                // the parent, just in the old session.
                eprintln!(
                    "Warning: setsid() failed: {}",
                    io::Error::last_os_error()
                );
            }
            Ok(Role::Child)
        }
        child => {
            // Nobody will wait() for the daemon
            unsafe {
                libc::signal(libc::SIGCHLD, libc::SIG_IGN);
            }
            Ok(Role::Parent {
                child: child as u32,
            })
        }
    }
}

/// Report the daemon's pid the way the parent prints it: one decimal line
pub fn report_child<W: Write>(out: &mut W, child: u32) -> io::Result<()> {
    writeln!(out, "{}", child)?;
    out.flush()
}

/// Detach into the background
///
/// Returns in the child only. The parent prints the child's pid on stdout
/// and exits with status 0.
pub fn daemonize() -> Result<()> {
    match fork_detached()? {
        Role::Child => Ok(()),
        Role::Parent { child } => {
            report_child(&mut io::stdout().lock(), child)?;
            std::process::exit(0);
        }
    }
}
