//! Error types for the socket abstraction layer
//!
//! Every operation reports one of the kinds in [`VosError`]. Raw platform
//! error codes never leave this crate; they are classified here and logged
//! at the call site.

use std::io;
use thiserror::Error;

/// Closed set of failure kinds returned by every socket operation.
///
/// Success is `Ok`. [`VosError::Block`] and [`VosError::NoData`] are expected
/// outcomes that callers use for polling and backoff, not faults.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VosError {
    #[error("Parameter error")]
    Param,

    #[error("Socket layer not initialized")]
    Init,

    #[error("Socket error")]
    Sock,

    #[error("I/O error")]
    Io,

    #[error("No data")]
    NoData,

    #[error("Operation would block")]
    Block,

    #[error("Buffer too small")]
    Mem,

    #[error("Unknown error")]
    Unknown,
}

impl VosError {
    /// Stable numeric code, shared with upper protocol layers
    pub fn code(self) -> i32 {
        match self {
            VosError::Param => -1,
            VosError::Init => -2,
            VosError::NoData => -5,
            VosError::Sock => -6,
            VosError::Io => -7,
            VosError::Mem => -8,
            VosError::Block => -14,
            VosError::Unknown => -99,
        }
    }

    /// True for the kinds callers must treat as normal flow control
    pub fn is_recoverable(self) -> bool {
        matches!(self, VosError::Block | VosError::NoData)
    }
}

/// Failure of a transfer that may have moved part of the buffer.
///
/// `transferred` is always valid, so callers can resume from where the
/// operation stopped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} after {transferred} bytes")]
pub struct TransferError {
    pub kind: VosError,
    pub transferred: usize,
}

impl TransferError {
    pub fn new(kind: VosError, transferred: usize) -> Self {
        Self { kind, transferred }
    }
}

impl From<TransferError> for VosError {
    fn from(err: TransferError) -> Self {
        err.kind
    }
}

impl From<VosError> for TransferError {
    fn from(kind: VosError) -> Self {
        Self::new(kind, 0)
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// OS conditions the socket layer treats differently from a plain failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OsCondition {
    Interrupted,
    WouldBlock,
    /// Non-blocking connect started or still pending
    InProgress,
    AlreadyConnected,
    AddrInUse,
    ConnectionAborted,
    Protocol,
    MessageSize,
    Other,
}

impl OsCondition {
    pub(crate) fn of(err: &io::Error) -> Self {
        #[cfg(unix)]
        if let Some(code) = err.raw_os_error() {
            match code {
                libc::EINPROGRESS | libc::EALREADY => return OsCondition::InProgress,
                libc::EISCONN => return OsCondition::AlreadyConnected,
                libc::EPROTO => return OsCondition::Protocol,
                libc::EMSGSIZE => return OsCondition::MessageSize,
                _ => {}
            }
        }

        match err.kind() {
            io::ErrorKind::Interrupted => OsCondition::Interrupted,
            io::ErrorKind::WouldBlock => OsCondition::WouldBlock,
            io::ErrorKind::AddrInUse => OsCondition::AddrInUse,
            io::ErrorKind::ConnectionAborted => OsCondition::ConnectionAborted,
            _ => OsCondition::Other,
        }
    }
}

/// Result type alias for socket operations
pub type Result<T> = std::result::Result<T, VosError>;

/// Result of a transfer that reports partial progress on failure
pub type TransferResult<T> = std::result::Result<T, TransferError>;
