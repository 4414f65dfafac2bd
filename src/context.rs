//! Caller-owned socket context
//!
//! Holds the state every lifecycle call consults: the initialization gate,
//! the live socket count and the cached hardware address. Embedding
//! applications create one context and pass it to every open, close and
//! option call; tests create as many as they like.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::StackConfig;
use crate::constants::DEFAULT_IFACE;
use crate::error::{Result, VosError};
use crate::network::hwaddr;

/// 6-byte Ethernet hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

/// Socket layer state owned by the embedding application
pub struct SockContext {
    initialized: AtomicBool,
    open_sockets: AtomicU32,
    default_iface: String,
    /// Resolved hardware address, only ever set to a non-zero value
    mac: Mutex<Option<MacAddress>>,
}

impl SockContext {
    /// Create an uninitialized context using the default interface name
    pub fn new() -> Self {
        Self::with_default_iface(DEFAULT_IFACE)
    }

    /// Create an uninitialized context reading the MAC from `iface`
    pub fn with_default_iface(iface: impl Into<String>) -> Self {
        Self {
            initialized: AtomicBool::new(false),
            open_sockets: AtomicU32::new(0),
            default_iface: iface.into(),
            mac: Mutex::new(None),
        }
    }

    /// Create an uninitialized context from stack configuration
    pub fn from_config(config: &StackConfig) -> Self {
        Self::with_default_iface(config.default_iface.clone())
    }

    /// Open the gate for socket calls. Calling it again has no effect.
    pub fn init(&self) {
        if !self.initialized.swap(true, Ordering::AcqRel) {
            tracing::debug!("Socket layer initialized (default iface {})", self.default_iface);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Number of sockets opened or accepted and not yet closed
    pub fn open_sockets(&self) -> u32 {
        self.open_sockets.load(Ordering::Relaxed)
    }

    pub fn default_iface(&self) -> &str {
        &self.default_iface
    }

    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(VosError::Init)
        }
    }

    pub(crate) fn register_open(&self) {
        self.open_sockets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn register_close(&self) {
        let _ = self
            .open_sockets
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)));
    }

    /// Hardware address of the default interface.
    ///
    /// Resolved on first use and cached for the lifetime of the context. An
    /// all-zero answer is returned but not cached.
    pub fn get_mac(&self) -> Result<MacAddress> {
        self.ensure_initialized()?;

        let mut cached = self.mac.lock();
        if let Some(mac) = *cached {
            return Ok(mac);
        }

        let mac = hwaddr::query_hw_addr(&self.default_iface)?;
        if !mac.is_zero() {
            *cached = Some(mac);
        }
        Ok(mac)
    }
}

impl Default for SockContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SockContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SockContext")
            .field("initialized", &self.is_initialized())
            .field("open_sockets", &self.open_sockets())
            .field("default_iface", &self.default_iface)
            .finish()
    }
}
