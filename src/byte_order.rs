//! Host/network byte order conversion and IPv4 address helpers
//!
//! Addresses are carried as `u32` in host byte order throughout the stack,
//! matching how upper protocol layers store them in their telegram headers.

use std::net::Ipv4Addr;

/// Host to network order (16 bit)
pub fn htons(val: u16) -> u16 {
    val.to_be()
}

/// Network to host order (16 bit)
pub fn ntohs(val: u16) -> u16 {
    u16::from_be(val)
}

/// Host to network order (32 bit)
pub fn htonl(val: u32) -> u32 {
    val.to_be()
}

/// Network to host order (32 bit)
pub fn ntohl(val: u32) -> u32 {
    u32::from_be(val)
}

/// Check if a host-order address lies in 224.0.0.0/4
pub fn is_multicast(ip_address: u32) -> bool {
    (ip_address & 0xF000_0000) == 0xE000_0000
}

/// Convert a dotted-decimal string to a host-order address.
///
/// Unparsable input yields 0, the "any" address.
pub fn dotted_ip(dotted: &str) -> u32 {
    dotted
        .trim()
        .parse::<Ipv4Addr>()
        .map(u32::from)
        .unwrap_or(0)
}

/// Format a host-order address as dotted decimal
pub fn ip_dotted(ip_address: u32) -> String {
    Ipv4Addr::from(ip_address).to_string()
}
