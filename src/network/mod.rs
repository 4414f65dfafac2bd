//! Socket primitives: lifecycle, multicast, UDP/TCP I/O and readiness

pub(crate) mod hwaddr;
pub mod interfaces;
pub mod multicast;
pub(crate) mod retry;
#[cfg(unix)]
pub mod select;
pub mod socket;
pub mod tcp;
pub mod udp;

pub use interfaces::{fill_interfaces, list_interfaces, InterfaceRecord};
#[cfg(unix)]
pub use select::{select, FdSet};
pub use socket::{SockHandle, SockKind, SockOptions};
pub use tcp::Accepted;
