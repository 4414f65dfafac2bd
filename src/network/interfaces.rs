//! Local IPv4 interface enumeration

use std::net::Ipv4Addr;

use crate::constants::MAX_IF_NAME_SIZE;

/// A local interface carrying an IPv4 address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceRecord {
    /// Interface name, at most `MAX_IF_NAME_SIZE - 1` bytes
    pub name: String,
    /// Address in host byte order
    pub ip_addr: u32,
}

impl InterfaceRecord {
    pub fn new(name: &str, ip_addr: u32) -> Self {
        Self {
            name: bounded_name(name).to_string(),
            ip_addr,
        }
    }

    pub fn ipv4(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.ip_addr)
    }
}

/// Longest prefix of `name` that fits the interface name buffer
fn bounded_name(name: &str) -> &str {
    let limit = MAX_IF_NAME_SIZE - 1;
    if name.len() <= limit {
        return name;
    }
    let mut end = limit;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Fill `out` with local IPv4 interfaces and return how many were written.
///
/// Entries without an address or with another address family are skipped.
/// Never fails: if the OS query fails nothing is written. An empty slice is
/// never touched.
pub fn fill_interfaces(out: &mut [InterfaceRecord]) -> usize {
    let records = list_interfaces(out.len());
    let count = records.len();
    for (slot, record) in out.iter_mut().zip(records) {
        *slot = record;
    }
    count
}

/// Up to `max_count` local IPv4 interfaces.
///
/// Storage grows with the interfaces found, not with `max_count`.
pub fn list_interfaces(max_count: usize) -> Vec<InterfaceRecord> {
    if max_count == 0 {
        return Vec::new();
    }
    let records = imp::enumerate(max_count);
    for record in &records {
        tracing::info!("IP-Addr for '{}': {}", record.name, record.ipv4());
    }
    records
}

#[cfg(unix)]
mod imp {
    use std::ffi::CStr;
    use std::io;
    use std::ptr;

    use super::InterfaceRecord;

    /// Walk the getifaddrs list, keeping at most `max_count` AF_INET entries
    pub(super) fn enumerate(max_count: usize) -> Vec<InterfaceRecord> {
        let mut records = Vec::new();
        let mut addrs: *mut libc::ifaddrs = ptr::null_mut();
        // SAFETY: getifaddrs only writes the list head into `addrs`.
        if unsafe { libc::getifaddrs(&mut addrs) } != 0 {
            tracing::error!("getifaddrs() failed (Err: {})", io::Error::last_os_error());
            return records;
        }

        let mut cursor = addrs;
        while !cursor.is_null() && records.len() < max_count {
            // SAFETY: `cursor` is a node of the list returned above, which stays
            // valid until freeifaddrs.
            let entry = unsafe { &*cursor };
            cursor = entry.ifa_next;

            if entry.ifa_addr.is_null() {
                continue;
            }
            // SAFETY: non-null ifa_addr points to a sockaddr of the family it names.
            let family = i32::from(unsafe { (*entry.ifa_addr).sa_family });
            if family != libc::AF_INET {
                continue;
            }
            // SAFETY: AF_INET entries carry a sockaddr_in.
            let sin = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_in) };
            let ip_addr = u32::from_be(sin.sin_addr.s_addr);

            let name = if entry.ifa_name.is_null() {
                String::new()
            } else {
                // SAFETY: ifa_name is a NUL-terminated string owned by the list.
                unsafe { CStr::from_ptr(entry.ifa_name) }
                    .to_string_lossy()
                    .into_owned()
            };

            records.push(InterfaceRecord::new(&name, ip_addr));
        }

        // SAFETY: `addrs` came from a successful getifaddrs and is freed once.
        unsafe { libc::freeifaddrs(addrs) };
        records
    }
}

#[cfg(not(unix))]
mod imp {
    use super::InterfaceRecord;

    pub(super) fn enumerate(_max_count: usize) -> Vec<InterfaceRecord> {
        tracing::warn!("Interface enumeration not supported on this platform");
        Vec::new()
    }
}
