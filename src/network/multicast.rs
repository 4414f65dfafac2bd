//! Multicast group membership on UDP sockets
//!
//! Membership is not tracked here; the OS is the only record. Joining a
//! group twice succeeds both times.

use std::net::Ipv4Addr;

use crate::byte_order::is_multicast;
use crate::context::SockContext;
use crate::error::{OsCondition, Result, VosError};
use crate::network::SockHandle;

impl SockContext {
    /// Join `group` on the interface with address `iface` (0 for any)
    pub fn join(
        &self,
        handle: &SockHandle,
        group: impl Into<Ipv4Addr>,
        iface: impl Into<Ipv4Addr>,
    ) -> Result<()> {
        self.ensure_initialized()?;
        let (group, iface) = (group.into(), iface.into());
        if !is_multicast(u32::from(group)) {
            tracing::error!("join: {} is not a multicast address", group);
            return Err(VosError::Param);
        }

        tracing::info!("joining MC: {} on iface {}", group, iface);
        match handle.socket().join_multicast_v4(&group, &iface) {
            Ok(()) => Ok(()),
            Err(e) if OsCondition::of(&e) == OsCondition::AddrInUse => {
                tracing::debug!("already a member of {} on socket {}", group, handle.id());
                Ok(())
            }
            Err(e) => {
                tracing::error!("setsockopt() IP_ADD_MEMBERSHIP failed (Err: {})", e);
                Err(VosError::Sock)
            }
        }
    }

    /// Leave `group` on the interface with address `iface` (0 for any)
    pub fn leave(
        &self,
        handle: &SockHandle,
        group: impl Into<Ipv4Addr>,
        iface: impl Into<Ipv4Addr>,
    ) -> Result<()> {
        self.ensure_initialized()?;
        let (group, iface) = (group.into(), iface.into());
        if !is_multicast(u32::from(group)) {
            tracing::error!("leave: {} is not a multicast address", group);
            return Err(VosError::Param);
        }

        tracing::info!("leaving MC: {} on iface {}", group, iface);
        handle
            .socket()
            .leave_multicast_v4(&group, &iface)
            .map_err(|e| {
                tracing::error!("setsockopt() IP_DROP_MEMBERSHIP failed (Err: {})", e);
                VosError::Sock
            })
    }

    /// Select the egress interface for multicast sends on this socket
    pub fn set_multicast_interface(
        &self,
        handle: &SockHandle,
        iface: impl Into<Ipv4Addr>,
    ) -> Result<()> {
        self.ensure_initialized()?;
        let iface = iface.into();
        handle.socket().set_multicast_if_v4(&iface).map_err(|e| {
            tracing::warn!("setsockopt() IP_MULTICAST_IF failed (Err: {})", e);
            VosError::Sock
        })
    }
}
