//! Datagram transfer
//!
//! One call moves at most one datagram, so there is no partial-transfer
//! ambiguity: a failure always reports zero bytes.

use socket2::SockAddr;
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddrV4};

use crate::error::{OsCondition, TransferError, TransferResult, VosError};
use crate::network::retry::retry_interrupted;
use crate::network::SockHandle;

/// View an initialized buffer as the uninitialized one socket2 expects
fn as_uninit(buf: &mut [u8]) -> &mut [MaybeUninit<u8>] {
    // SAFETY: `MaybeUninit<u8>` has the layout of `u8`, and the socket only
    // ever writes initialized bytes into it.
    unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) }
}

impl SockHandle {
    /// Send one datagram to `ip_address:port`, returning the bytes sent
    pub fn send_udp(
        &self,
        buf: &[u8],
        ip_address: impl Into<Ipv4Addr>,
        port: u16,
    ) -> TransferResult<usize> {
        let dest = SocketAddrV4::new(ip_address.into(), port);
        let addr = SockAddr::from(dest);

        retry_interrupted(|| self.socket().send_to(buf, &addr)).map_err(|e| {
            match OsCondition::of(&e) {
                OsCondition::WouldBlock => TransferError::new(VosError::Block, 0),
                _ => {
                    tracing::error!("sendto() to {} failed (Err: {})", dest, e);
                    TransferError::new(VosError::Io, 0)
                }
            }
        })
    }

    /// Receive one datagram into `buf`, returning its length and source.
    ///
    /// A zero-length datagram is reported as [`VosError::NoData`].
    pub fn receive_udp(&self, buf: &mut [u8]) -> TransferResult<(usize, SocketAddrV4)> {
        let (len, src) = retry_interrupted(|| self.socket().recv_from(as_uninit(&mut *buf)))
            .map_err(|e| match OsCondition::of(&e) {
                OsCondition::WouldBlock => TransferError::new(VosError::Block, 0),
                _ => {
                    tracing::error!("recvfrom() failed (Err: {})", e);
                    TransferError::new(VosError::Io, 0)
                }
            })?;

        if len == 0 {
            return Err(TransferError::new(VosError::NoData, 0));
        }

        let src = src
            .as_socket_ipv4()
            .unwrap_or_else(|| SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
        Ok((len.min(buf.len()), src))
    }
}
