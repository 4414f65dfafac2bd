//! Stream connections and transfer
//!
//! A stream transfer may complete partially. Both directions loop until the
//! request is satisfied or the socket reports a condition the caller has to
//! act on, and every outcome carries the cumulative byte count.

use socket2::SockAddr;
use std::io::Read;
use std::net::{Ipv4Addr, SocketAddrV4};

use crate::context::SockContext;
use crate::error::{OsCondition, Result, TransferError, TransferResult, VosError};
use crate::network::retry::{retry_interrupted, retry_transient};
use crate::network::{SockHandle, SockKind};
use crate::platform::{self, SEND_FLAGS};

/// Connection taken from a listening socket
#[derive(Debug)]
pub struct Accepted {
    pub handle: SockHandle,
    pub peer: SocketAddrV4,
}

impl SockHandle {
    /// Mark a bound TCP socket as passive
    pub fn listen(&self, backlog: u32) -> Result<()> {
        let backlog = i32::try_from(backlog).unwrap_or(i32::MAX);
        self.socket().listen(backlog).map_err(|e| {
            tracing::error!("listen() failed (Err: {})", e);
            VosError::Io
        })
    }

    /// Connect to `ip_address:port`.
    ///
    /// An already connected socket succeeds. A connect that has started but
    /// not finished reports [`VosError::Block`]; call again to poll it.
    pub fn connect(&self, ip_address: impl Into<Ipv4Addr>, port: u16) -> Result<()> {
        let dest = SocketAddrV4::new(ip_address.into(), port);

        match self.socket().connect(&SockAddr::from(dest)) {
            Ok(()) => Ok(()),
            Err(e) => match OsCondition::of(&e) {
                OsCondition::InProgress | OsCondition::WouldBlock => Err(VosError::Block),
                OsCondition::AlreadyConnected => Ok(()),
                _ => {
                    tracing::warn!("connect() to {} failed (Err: {})", dest, e);
                    Err(VosError::Io)
                }
            },
        }
    }

    /// Write all of `buf`, returning the number of bytes written.
    ///
    /// On failure the error carries the bytes already handed to the OS.
    pub fn send_tcp(&self, buf: &[u8]) -> TransferResult<usize> {
        let mut sent = 0;

        while sent < buf.len() {
            let written =
                retry_interrupted(|| self.socket().send_with_flags(&buf[sent..], SEND_FLAGS));
            match written {
                Ok(0) => {
                    tracing::warn!("send() accepted no data after {} bytes", sent);
                    return Err(TransferError::new(VosError::Io, sent));
                }
                Ok(n) => sent += n,
                Err(e) => {
                    return Err(match OsCondition::of(&e) {
                        OsCondition::WouldBlock => TransferError::new(VosError::Block, sent),
                        _ => {
                            tracing::warn!("send() failed (Err: {})", e);
                            TransferError::new(VosError::Io, sent)
                        }
                    });
                }
            }
        }

        Ok(sent)
    }

    /// Read into `buf` until it is full or no more data is available.
    ///
    /// A short read is a complete result: once some bytes have arrived, a
    /// would-block or a peer close ends the call successfully.
    pub fn receive_tcp(&self, buf: &mut [u8]) -> TransferResult<usize> {
        if buf.is_empty() {
            return Err(TransferError::new(VosError::Param, 0));
        }

        let mut received = 0;
        let mut sock = self.socket();

        while received < buf.len() {
            match retry_interrupted(|| sock.read(&mut buf[received..])) {
                Ok(0) => break,
                Ok(n) => received += n,
                Err(e) => {
                    return match OsCondition::of(&e) {
                        OsCondition::WouldBlock if received == 0 => {
                            Err(TransferError::new(VosError::Block, 0))
                        }
                        OsCondition::WouldBlock => Ok(received),
                        OsCondition::MessageSize if received == 0 => {
                            Err(TransferError::new(VosError::Mem, 0))
                        }
                        OsCondition::MessageSize => Ok(received),
                        _ => {
                            tracing::warn!("receive() failed (Err: {})", e);
                            Err(TransferError::new(VosError::Io, received))
                        }
                    };
                }
            }
        }

        if received == 0 {
            Err(TransferError::new(VosError::NoData, 0))
        } else {
            Ok(received)
        }
    }
}

impl SockContext {
    /// Accept one pending connection on a listening socket.
    ///
    /// Returns `Ok(None)` when a non-blocking listener has nothing queued.
    /// The accepted handle is counted like an opened one.
    pub fn accept(&self, listener: &SockHandle) -> Result<Option<Accepted>> {
        self.ensure_initialized()?;

        let accepted = retry_transient(
            |c| {
                matches!(
                    c,
                    OsCondition::Interrupted | OsCondition::ConnectionAborted | OsCondition::Protocol
                )
            },
            || listener.socket().accept(),
        );

        match accepted {
            Ok((socket, addr)) => {
                let peer = addr
                    .as_socket_ipv4()
                    .unwrap_or_else(|| SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
                if let Err(e) = platform::suppress_sigpipe(&socket) {
                    tracing::error!("setsockopt() SO_NOSIGPIPE failed (Err: {})", e);
                }
                let handle = SockHandle::new(socket, SockKind::Tcp);
                self.register_open();
                tracing::debug!("Accepted {} on socket {} from {}", handle.id(), listener.id(), peer);
                Ok(Some(Accepted { handle, peer }))
            }
            Err(e) if OsCondition::of(&e) == OsCondition::WouldBlock => Ok(None),
            Err(e) => {
                tracing::error!("accept() listenFd({}) failed (Err: {})", listener.id(), e);
                Err(VosError::Unknown)
            }
        }
    }
}
