//! Readiness multiplexing across several handles
//!
//! Callers wait here instead of busy-polling non-blocking sockets. The sets
//! are narrowed in place to the handles that became ready, like `select(2)`.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use crate::error::{OsCondition, Result, VosError};
use crate::network::SockHandle;

/// Set of socket descriptors to watch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FdSet {
    fds: Vec<RawFd>,
}

impl FdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: &SockHandle) {
        let fd = handle.as_raw_fd();
        if !self.fds.contains(&fd) {
            self.fds.push(fd);
        }
    }

    pub fn remove(&mut self, handle: &SockHandle) {
        let fd = handle.as_raw_fd();
        self.fds.retain(|&f| f != fd);
    }

    pub fn contains(&self, handle: &SockHandle) -> bool {
        self.fds.contains(&handle.as_raw_fd())
    }

    pub fn clear(&mut self) {
        self.fds.clear();
    }

    pub fn len(&self) -> usize {
        self.fds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fds.is_empty()
    }
}

/// Interest of one descriptor across the three sets
struct Watch {
    fd: RawFd,
    events: libc::c_short,
}

fn timeout_ms(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(t) => {
            // round up so a sub-millisecond wait still sleeps
            let ms = t.as_micros().div_ceil(1000);
            libc::c_int::try_from(ms).unwrap_or(libc::c_int::MAX)
        }
    }
}

/// Wait until a handle in one of the sets is ready or `timeout` expires.
///
/// `None` waits indefinitely. Returns the number of ready entries summed
/// over the three sets (0 on timeout); each set keeps only its ready
/// handles. Interrupted waits are restarted. A descriptor that is no longer
/// open in any set fails the call with [`VosError::Param`].
pub fn select(
    readable: Option<&mut FdSet>,
    writable: Option<&mut FdSet>,
    errored: Option<&mut FdSet>,
    timeout: Option<Duration>,
) -> Result<usize> {
    let mut watches: Vec<Watch> = Vec::new();
    let mut add = |fd: RawFd, events: libc::c_short| {
        match watches.iter_mut().find(|w| w.fd == fd) {
            Some(w) => w.events |= events,
            None => watches.push(Watch { fd, events }),
        }
    };

    for fd in readable.as_deref().map(|s| s.fds.as_slice()).unwrap_or(&[]) {
        add(*fd, libc::POLLIN);
    }
    for fd in writable.as_deref().map(|s| s.fds.as_slice()).unwrap_or(&[]) {
        add(*fd, libc::POLLOUT);
    }
    for fd in errored.as_deref().map(|s| s.fds.as_slice()).unwrap_or(&[]) {
        add(*fd, libc::POLLPRI);
    }

    let mut pollfds: Vec<libc::pollfd> = watches
        .iter()
        .map(|w| libc::pollfd {
            fd: w.fd,
            events: w.events,
            revents: 0,
        })
        .collect();

    let timeout = timeout_ms(timeout);
    loop {
        // SAFETY: `pollfds` is a live, correctly sized array of pollfd.
        let rc = unsafe {
            libc::poll(
                pollfds.as_mut_ptr(),
                pollfds.len() as libc::nfds_t,
                timeout,
            )
        };
        if rc >= 0 {
            break;
        }
        let err = io::Error::last_os_error();
        if OsCondition::of(&err) != OsCondition::Interrupted {
            tracing::error!("poll() failed (Err: {})", err);
            return Err(VosError::Io);
        }
    }

    if let Some(stale) = pollfds.iter().find(|p| p.revents & libc::POLLNVAL != 0) {
        tracing::error!("select() on invalid descriptor {}", stale.fd);
        return Err(VosError::Param);
    }

    let revents_of = |fd: RawFd| {
        pollfds
            .iter()
            .find(|p| p.fd == fd)
            .map(|p| p.revents)
            .unwrap_or(0)
    };

    let mut ready = 0;
    // hang-ups and errors make a socket readable, so a read reports them
    let mut narrow = |set: Option<&mut FdSet>, mask: libc::c_short| {
        if let Some(set) = set {
            set.fds.retain(|&fd| revents_of(fd) & mask != 0);
            ready += set.fds.len();
        }
    };
    narrow(readable, libc::POLLIN | libc::POLLHUP | libc::POLLERR);
    narrow(writable, libc::POLLOUT | libc::POLLERR);
    narrow(errored, libc::POLLPRI | libc::POLLERR);

    Ok(ready)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SockContext;
    use std::net::Ipv4Addr;
    use std::time::Instant;

    fn ready_context() -> SockContext {
        let ctx = SockContext::new();
        ctx.init();
        ctx
    }

    #[test]
    fn test_fd_set_membership() {
        let ctx = ready_context();
        let a = ctx.open_udp(None).unwrap();
        let b = ctx.open_udp(None).unwrap();

        let mut set = FdSet::new();
        set.insert(&a);
        set.insert(&a);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&a));
        assert!(!set.contains(&b));

        set.insert(&b);
        set.remove(&a);
        assert!(!set.contains(&a));
        set.clear();
        assert!(set.is_empty());

        ctx.close(a).unwrap();
        ctx.close(b).unwrap();
    }

    #[test]
    fn test_timeout_with_nothing_ready() {
        let ctx = ready_context();
        let sock = ctx.open_udp(None).unwrap();
        sock.bind(Ipv4Addr::LOCALHOST, 0).unwrap();

        let mut readable = FdSet::new();
        readable.insert(&sock);

        let start = Instant::now();
        let ready = select(Some(&mut readable), None, None, Some(Duration::from_millis(20))).unwrap();
        assert_eq!(ready, 0);
        assert!(readable.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(15));

        ctx.close(sock).unwrap();
    }

    #[test]
    fn test_readable_after_datagram() {
        let ctx = ready_context();
        let rx = ctx.open_udp(None).unwrap();
        rx.bind(Ipv4Addr::LOCALHOST, 0).unwrap();
        let idle = ctx.open_udp(None).unwrap();
        idle.bind(Ipv4Addr::LOCALHOST, 0).unwrap();
        let tx = ctx.open_udp(None).unwrap();

        tx.send_udp(b"ping", Ipv4Addr::LOCALHOST, rx.local_addr().unwrap().port())
            .unwrap();

        let mut readable = FdSet::new();
        readable.insert(&rx);
        readable.insert(&idle);
        let ready = select(Some(&mut readable), None, None, Some(Duration::from_secs(1))).unwrap();
        assert_eq!(ready, 1);
        assert!(readable.contains(&rx));
        assert!(!readable.contains(&idle));

        let mut readable = FdSet::new();
        readable.insert(&rx);
        let mut writable = FdSet::new();
        writable.insert(&tx);
        let ready = select(
            Some(&mut readable),
            Some(&mut writable),
            None,
            Some(Duration::ZERO),
        )
        .unwrap();
        assert_eq!(ready, 2);
        assert!(writable.contains(&tx));

        for sock in [rx, idle, tx] {
            ctx.close(sock).unwrap();
        }
    }

    #[test]
    fn test_stale_descriptor_is_rejected() {
        let ctx = ready_context();
        let sock = ctx.open_udp(None).unwrap();

        // far above anything the test process opens
        let mut readable = FdSet { fds: vec![1 << 20] };
        readable.insert(&sock);
        let result = select(Some(&mut readable), None, None, Some(Duration::ZERO));
        assert_eq!(result, Err(VosError::Param));

        ctx.close(sock).unwrap();
    }

    #[test]
    fn test_timeout_rounding() {
        assert_eq!(timeout_ms(None), -1);
        assert_eq!(timeout_ms(Some(Duration::ZERO)), 0);
        assert_eq!(timeout_ms(Some(Duration::from_micros(1))), 1);
        assert_eq!(timeout_ms(Some(Duration::from_millis(250))), 250);
        assert_eq!(timeout_ms(Some(Duration::from_secs(u64::MAX))), libc::c_int::MAX);
    }
}
