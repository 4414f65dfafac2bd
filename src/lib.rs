//! # TCN Socket Layer
//!
//! Portable UDP/TCP socket primitives for real-time train communication
//! stacks. Protocol engines above this crate (cyclic process data,
//! request/reply messaging) drive every transfer through these calls and
//! decide retry, backoff or abort from the returned [`VosError`] kind.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │              Protocol engines (process data / messages)               │
//! └──────────────┬───────────────────────┬───────────────────┬────────────┘
//!                │ open/close/options    │ send/receive      │ startup
//!                ▼                       ▼                   ▼
//! ┌──────────────────────────┐ ┌───────────────────────┐ ┌──────────────────┐
//! │ SockContext              │ │ I/O engine            │ │ interfaces       │
//! │  init gate, live count,  │ │  network::udp         │ │  list_interfaces │
//! │  MAC cache               │ │  network::tcp         │ │ hwaddr           │
//! │ network::socket          │ │  network::select      │ │  get_mac         │
//! │ network::multicast       │ │                       │ │                  │
//! └────────────┬─────────────┘ └───────────┬───────────┘ └────────┬─────────┘
//!              │  network::retry (interrupted calls never surface) │
//!              ▼                           ▼                       ▼
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                 socket2 / libc (platform socket API)                  │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use tcn_sock::{SockContext, SockOptions};
//!
//! let ctx = SockContext::new();
//! ctx.init();
//!
//! let sock = ctx.open_udp(Some(&SockOptions::default())).unwrap();
//! sock.bind(0u32, 17224).unwrap();
//!
//! let mut buf = [0u8; 1472];
//! match sock.receive_udp(&mut buf) {
//!     Ok((len, src)) => println!("{} bytes from {}", len, src),
//!     Err(e) if e.kind.is_recoverable() => {}
//!     Err(e) => eprintln!("receive failed: {}", e),
//! }
//! ctx.close(sock).unwrap();
//! ```

pub mod byte_order;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod network;
pub mod platform;

pub use context::{MacAddress, SockContext};
pub use error::{ConfigError, Result, TransferError, TransferResult, VosError};
pub use network::{
    list_interfaces, Accepted, InterfaceRecord, SockHandle, SockKind, SockOptions,
};

/// Stack-wide constants
pub mod constants {
    /// Interface queried for the node's hardware address
    pub const DEFAULT_IFACE: &str = "eth0";

    /// Interface name buffer size, including the terminator
    pub const MAX_IF_NAME_SIZE: usize = 16;

    /// Default upper bound for interface enumeration
    pub const MAX_INTERFACES: usize = 8;

    /// Process data UDP port
    pub const PD_UDP_PORT: u16 = 17224;

    /// Message data UDP/TCP port
    pub const MD_PORT: u16 = 17225;

    /// Bit 2 of IP_TOS, set on every marked packet for local use
    pub const TOS_LOCAL_USE: u32 = 0x04;
}
