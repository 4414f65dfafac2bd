//! Build-time platform capabilities
//!
//! Option availability differs between targets. Each capability is resolved
//! once here with `cfg` so call sites never branch on the platform.

use socket2::Socket;
use std::io;

/// Socket option used for the reuse-address/port flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReuseOption {
    /// SO_REUSEPORT, several sockets may bind the same address and port
    ReusePort,
    /// SO_REUSEADDR fallback where SO_REUSEPORT is unavailable
    ReuseAddr,
}

#[cfg(all(
    unix,
    not(any(target_os = "solaris", target_os = "illumos", target_os = "cygwin"))
))]
pub const REUSE_OPTION: ReuseOption = ReuseOption::ReusePort;

#[cfg(not(all(
    unix,
    not(any(target_os = "solaris", target_os = "illumos", target_os = "cygwin"))
)))]
pub const REUSE_OPTION: ReuseOption = ReuseOption::ReuseAddr;

/// Whether the hardware address can be queried through SIOCGIFHWADDR
pub const HW_ADDR_QUERY: bool = cfg!(any(target_os = "linux", target_os = "android"));

/// Apply the platform's reuse option
pub(crate) fn set_reuse(socket: &Socket, reuse: bool) -> io::Result<()> {
    #[cfg(all(
        unix,
        not(any(target_os = "solaris", target_os = "illumos", target_os = "cygwin"))
    ))]
    {
        socket.set_reuse_port(reuse)
    }

    #[cfg(not(all(
        unix,
        not(any(target_os = "solaris", target_os = "illumos", target_os = "cygwin"))
    )))]
    {
        socket.set_reuse_address(reuse)
    }
}

/// Flags for every stream send; a write to a reset peer must not raise SIGPIPE
#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) const SEND_FLAGS: i32 = libc::MSG_NOSIGNAL;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub(crate) const SEND_FLAGS: i32 = 0;

/// Per-socket SIGPIPE suppression for targets without MSG_NOSIGNAL
pub(crate) fn suppress_sigpipe(socket: &Socket) -> io::Result<()> {
    #[cfg(target_vendor = "apple")]
    {
        socket.set_nosigpipe(true)
    }

    #[cfg(not(target_vendor = "apple"))]
    {
        let _ = socket;
        Ok(())
    }
}

impl ReuseOption {
    /// Name of the underlying socket option, for log messages
    pub fn name(self) -> &'static str {
        match self {
            ReuseOption::ReusePort => "SO_REUSEPORT",
            ReuseOption::ReuseAddr => "SO_REUSEADDR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_capabilities() {
        assert_eq!(REUSE_OPTION, ReuseOption::ReusePort);
        assert!(HW_ADDR_QUERY);
        assert_eq!(SEND_FLAGS, libc::MSG_NOSIGNAL);
    }

    #[test]
    fn test_option_names() {
        assert_eq!(ReuseOption::ReusePort.name(), "SO_REUSEPORT");
        assert_eq!(ReuseOption::ReuseAddr.name(), "SO_REUSEADDR");
    }
}
