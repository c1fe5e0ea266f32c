//! Remote endpoint resolution and connection

use std::ffi::CString;
use std::io;
use std::ptr;

use tokio::net::{lookup_host, TcpStream};

use crate::common::{Error, Result};

/// Resolve `host`/`port` and connect to the first address that accepts
///
/// `port` is either a number or a service name such as `http`. Candidates
/// are tried in resolver order. There is no retry: running out of
/// candidates is a [`Error::Connection`], finding none is an
/// [`Error::Resolution`].
pub async fn dial(host: &str, port: &str) -> Result<TcpStream> {
    let port_num = resolve_port(host, port).await?;

    let candidates: Vec<_> = lookup_host((host, port_num))
        .await
        .map_err(|e| Error::resolution(host, port, e))?
        .collect();

    if candidates.is_empty() {
        return Err(Error::resolution(host, port, "no addresses found"));
    }

    for addr in candidates {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                tracing::info!(%addr, "Connected to remote host");
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%addr, error = %e, "Connection attempt failed");
            }
        }
    }

    Err(Error::connection(host, port))
}

/// Turn a port string into a port number, looking up service names
async fn resolve_port(host: &str, port: &str) -> Result<u16> {
    let port = port.trim();
    if let Ok(num) = port.parse::<u16>() {
        return Ok(num);
    }

    let service = port.to_string();
    let found = tokio::task::spawn_blocking(move || service_port(&service))
        .await
        .map_err(|e| Error::resolution(host, port, e))?
        .map_err(|e| Error::resolution(host, port, e))?;

    found.ok_or_else(|| Error::resolution(host, port, "unknown service"))
}

/// Look up a TCP service name in the system services database
///
/// Returns `Ok(None)` when the name is unknown.
fn service_port(service: &str) -> io::Result<Option<u16>> {
    let c_service = CString::new(service)?;

    let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
    hints.ai_family = libc::AF_UNSPEC;
    hints.ai_socktype = libc::SOCK_STREAM;
    hints.ai_flags = libc::AI_PASSIVE;

    let mut res: *mut libc::addrinfo = ptr::null_mut();
    let rc = unsafe { libc::getaddrinfo(ptr::null(), c_service.as_ptr(), &hints, &mut res) };
    if rc != 0 {
        return Ok(None);
    }

    let mut port = None;
    let mut cursor = res;
    while !cursor.is_null() && port.is_none() {
        let info = unsafe { &*cursor };
        port = match info.ai_family {
            _ if info.ai_addr.is_null() => None,
            libc::AF_INET => {
                let addr = unsafe { &*(info.ai_addr as *const libc::sockaddr_in) };
                Some(u16::from_be(addr.sin_port))
            }
            libc::AF_INET6 => {
                let addr = unsafe { &*(info.ai_addr as *const libc::sockaddr_in6) };
                Some(u16::from_be(addr.sin6_port))
            }
            _ => None,
        };
        cursor = info.ai_next;
    }

    unsafe { libc::freeaddrinfo(res) };
    Ok(port)
}
