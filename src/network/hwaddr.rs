//! Hardware address lookup through SIOCGIFHWADDR

use crate::context::MacAddress;
use crate::error::{Result, VosError};

#[cfg(any(target_os = "linux", target_os = "android"))]
mod imp {
    use socket2::{Domain, Socket, Type};
    use std::io;
    use std::os::unix::io::AsRawFd;

    use super::*;

    /// `struct ifreq` with the hardware address member of its union
    #[repr(C)]
    struct HwAddrRequest {
        name: [libc::c_char; libc::IFNAMSIZ],
        hwaddr: libc::sockaddr,
        _pad: [u8; 8],
    }

    pub(super) fn query(iface: &str) -> Result<MacAddress> {
        let sock = Socket::new(Domain::IPV4, Type::DGRAM, None).map_err(|e| {
            tracing::error!("socket() for hardware address query failed (Err: {})", e);
            VosError::Sock
        })?;

        // SAFETY: all-zero is a valid bit pattern for this plain C struct.
        let mut req: HwAddrRequest = unsafe { std::mem::zeroed() };
        req.hwaddr.sa_family = libc::AF_INET as libc::sa_family_t;
        for (dst, src) in req
            .name
            .iter_mut()
            .zip(iface.bytes().take(libc::IFNAMSIZ - 1))
        {
            *dst = src as libc::c_char;
        }

        // SAFETY: `req` is a properly sized ifreq that outlives the call, and
        // the descriptor is owned by `sock`.
        let rc = unsafe { libc::ioctl(sock.as_raw_fd(), libc::SIOCGIFHWADDR as _, &mut req) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            tracing::error!("Could not fetch IFHW address on {} (Err: {})", iface, err);
            return Err(VosError::Sock);
        }

        let mut mac = [0u8; 6];
        for (dst, src) in mac.iter_mut().zip(req.hwaddr.sa_data.iter()) {
            *dst = *src as u8;
        }
        Ok(MacAddress(mac))
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
mod imp {
    use super::*;

    pub(super) fn query(iface: &str) -> Result<MacAddress> {
        tracing::error!("Hardware address query for {} not supported on this platform", iface);
        Err(VosError::Sock)
    }
}

/// Ask the OS for the hardware address of `iface`
pub(crate) fn query_hw_addr(iface: &str) -> Result<MacAddress> {
    imp::query(iface)
}
