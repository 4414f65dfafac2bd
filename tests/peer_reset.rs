//! Stream writes to a peer that has gone away
//!
//! Kept in its own test binary: it restores the default SIGPIPE action for
//! the whole process, the way a C host embedding the layer runs.
#![cfg(unix)]

use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use tcn_sock::{SockContext, VosError};

#[test]
fn send_after_peer_close_reports_io() {
    // SAFETY: installs the default disposition; no handler code runs.
    unsafe { libc::signal(libc::SIGPIPE, libc::SIG_DFL) };

    let ctx = SockContext::new();
    ctx.init();

    let listener = ctx.open_tcp(None).unwrap();
    listener.bind(Ipv4Addr::LOCALHOST, 0).unwrap();
    listener.listen(1).unwrap();
    let port = listener.local_addr().unwrap().port();

    let client = ctx.open_tcp(None).unwrap();
    client.connect(Ipv4Addr::LOCALHOST, port).unwrap();
    let server = ctx.accept(&listener).unwrap().unwrap().handle;
    ctx.close(server).unwrap();

    // the first write is usually accepted and answered with a reset
    let mut outcome = Ok(0);
    for _ in 0..50 {
        outcome = client.send_tcp(b"hello");
        if outcome.is_err() {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    let err = outcome.unwrap_err();
    assert_eq!(err.kind, VosError::Io);
    assert_eq!(err.transferred, 0);

    ctx.close(client).unwrap();
    ctx.close(listener).unwrap();
}
