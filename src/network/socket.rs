//! Socket lifecycle: open, option application, bind and close

use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
#[cfg(unix)]
use std::os::fd::{AsFd, BorrowedFd};
#[cfg(unix)]
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};

use crate::constants::TOS_LOCAL_USE;
use crate::context::SockContext;
use crate::error::{Result, VosError};
use crate::platform::{self, REUSE_OPTION};

/// Transport of a socket handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SockKind {
    Udp,
    Tcp,
}

impl SockKind {
    fn socket_type(self) -> Type {
        match self {
            SockKind::Udp => Type::DGRAM,
            SockKind::Tcp => Type::STREAM,
        }
    }

    fn protocol(self) -> Protocol {
        match self {
            SockKind::Udp => Protocol::UDP,
            SockKind::Tcp => Protocol::TCP,
        }
    }
}

impl fmt::Display for SockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SockKind::Udp => write!(f, "UDP"),
            SockKind::Tcp => write!(f, "TCP"),
        }
    }
}

/// Options applied when a socket is opened or reconfigured.
///
/// Zero TTLs and a `None` QoS class leave the OS defaults untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SockOptions {
    /// Allow several sockets on the same address/port
    pub reuse_addr_port: bool,
    /// Return [`VosError::Block`] instead of suspending the caller
    pub non_blocking: bool,
    /// Type-of-service class 0..=7; class 0 keeps the OS default TOS
    pub qos: Option<u8>,
    /// Unicast time to live
    pub ttl: u8,
    /// Multicast time to live
    pub ttl_multicast: u8,
}

impl SockOptions {
    /// Options for a non-blocking socket, everything else at OS defaults
    pub fn non_blocking() -> Self {
        Self {
            non_blocking: true,
            ..Default::default()
        }
    }

    /// IP_TOS byte for a QoS class: precedence in bits 7..5, local-use bit set
    pub fn tos_for_class(qos: u8) -> u32 {
        (u32::from(qos) << 5) | TOS_LOCAL_USE
    }
}

/// Apply `options` to `socket`.
///
/// Every option is attempted. Only a failure to switch to non-blocking mode
/// is reported; the others are logged, since platforms differ in what they
/// support.
pub(crate) fn apply_options(socket: &Socket, options: &SockOptions) -> Result<()> {
    if options.reuse_addr_port {
        if let Err(e) = platform::set_reuse(socket, true) {
            tracing::error!("setsockopt() {} failed (Err: {})", REUSE_OPTION.name(), e);
        }
    }

    if options.non_blocking {
        if let Err(e) = socket.set_nonblocking(true) {
            tracing::error!("setsockopt() O_NONBLOCK failed (Err: {})", e);
            return Err(VosError::Sock);
        }
    }

    match options.qos {
        Some(0) | None => {}
        Some(qos) if qos < 8 => {
            if let Err(e) = socket.set_tos(SockOptions::tos_for_class(qos)) {
                tracing::error!("setsockopt() IP_TOS failed (Err: {})", e);
            }
        }
        Some(qos) => tracing::error!("QoS class {} out of range 0..=7, not applied", qos),
    }

    if options.ttl > 0 {
        if let Err(e) = socket.set_ttl(u32::from(options.ttl)) {
            tracing::error!("setsockopt() IP_TTL failed (Err: {})", e);
        }
    }

    if options.ttl_multicast > 0 {
        if let Err(e) = socket.set_multicast_ttl_v4(u32::from(options.ttl_multicast)) {
            tracing::error!("setsockopt() IP_MULTICAST_TTL failed (Err: {})", e);
        }
    }

    Ok(())
}

/// An open UDP or TCP endpoint.
///
/// Owned by whoever opened or accepted it and released by
/// [`SockContext::close`]. Dropping a handle closes the descriptor without
/// updating the context's live count.
pub struct SockHandle {
    socket: Socket,
    kind: SockKind,
}

impl SockHandle {
    pub(crate) fn new(socket: Socket, kind: SockKind) -> Self {
        Self { socket, kind }
    }

    pub fn kind(&self) -> SockKind {
        self.kind
    }

    /// Process-unique identifier (the OS descriptor)
    pub fn id(&self) -> i64 {
        #[cfg(unix)]
        {
            i64::from(self.socket.as_raw_fd())
        }

        #[cfg(windows)]
        {
            use std::os::windows::io::AsRawSocket;
            self.socket.as_raw_socket() as i64
        }
    }

    pub(crate) fn socket(&self) -> &Socket {
        &self.socket
    }

    /// Local endpoint this socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddrV4> {
        self.socket
            .local_addr()
            .ok()
            .and_then(|addr| addr.as_socket_ipv4())
            .ok_or(VosError::Sock)
    }

    /// Bind to a local endpoint; `0.0.0.0` binds to every interface
    pub fn bind(&self, ip_address: impl Into<Ipv4Addr>, port: u16) -> Result<()> {
        let addr = SocketAddrV4::new(ip_address.into(), port);
        tracing::info!("binding to: {}", addr);

        self.socket.bind(&SockAddr::from(addr)).map_err(|e| {
            tracing::error!("bind() failed (Err: {})", e);
            VosError::Sock
        })
    }

    /// Close the descriptor, reporting what the OS says
    fn release(self) -> io::Result<()> {
        #[cfg(unix)]
        {
            let fd = self.socket.into_raw_fd();
            // SAFETY: `fd` was just taken out of the socket and is closed exactly once here.
            if unsafe { libc::close(fd) } == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }

        #[cfg(not(unix))]
        {
            drop(self.socket);
            Ok(())
        }
    }
}

impl fmt::Debug for SockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SockHandle")
            .field("id", &self.id())
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(unix)]
impl AsRawFd for SockHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

#[cfg(unix)]
impl AsFd for SockHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

impl SockContext {
    /// Open a socket of the requested kind and apply `options`
    pub fn open(&self, kind: SockKind, options: Option<&SockOptions>) -> Result<SockHandle> {
        self.ensure_initialized()?;

        let socket = Socket::new(Domain::IPV4, kind.socket_type(), Some(kind.protocol()))
            .map_err(|e| {
                tracing::error!("socket() failed (Err: {})", e);
                VosError::Sock
            })?;

        if let Err(e) = platform::suppress_sigpipe(&socket) {
            tracing::error!("setsockopt() SO_NOSIGPIPE failed (Err: {})", e);
        }

        if let Some(options) = options {
            // the socket is dropped, and so closed, on failure
            apply_options(&socket, options)?;
        }

        let handle = SockHandle::new(socket, kind);
        self.register_open();
        tracing::debug!("Opened {} socket {} ({} open)", kind, handle.id(), self.open_sockets());
        Ok(handle)
    }

    /// Open a UDP socket
    pub fn open_udp(&self, options: Option<&SockOptions>) -> Result<SockHandle> {
        self.open(SockKind::Udp, options)
    }

    /// Open a TCP socket
    pub fn open_tcp(&self, options: Option<&SockOptions>) -> Result<SockHandle> {
        self.open(SockKind::Tcp, options)
    }

    /// Reapply options to an open socket
    pub fn set_options(&self, handle: &SockHandle, options: &SockOptions) -> Result<()> {
        self.ensure_initialized()?;
        apply_options(handle.socket(), options)
    }

    /// Release a socket
    pub fn close(&self, handle: SockHandle) -> Result<()> {
        self.ensure_initialized()?;

        let id = handle.id();
        handle.release().map_err(|e| {
            tracing::error!("close() called with unknown descriptor {} (Err: {})", id, e);
            VosError::Param
        })?;

        self.register_close();
        tracing::debug!("Closed socket {} ({} open)", id, self.open_sockets());
        Ok(())
    }
}
