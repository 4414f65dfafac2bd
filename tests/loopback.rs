//! End-to-end scenarios over the loopback interface

use std::net::{Ipv4Addr, SocketAddrV4};
use std::thread;
use std::time::Duration;

use tcn_sock::byte_order::dotted_ip;
use tcn_sock::{list_interfaces, SockContext, SockHandle, SockOptions, TransferError, VosError};

fn ready_context() -> SockContext {
    let ctx = SockContext::new();
    ctx.init();
    ctx
}

#[test]
fn open_before_init_fails_for_both_transports() {
    let ctx = SockContext::new();
    assert_eq!(ctx.open_udp(None).unwrap_err(), VosError::Init);
    assert_eq!(ctx.open_tcp(None).unwrap_err(), VosError::Init);

    ctx.init();
    let udp = ctx.open_udp(None).unwrap();
    let tcp = ctx.open_tcp(None).unwrap();
    assert_eq!(ctx.open_sockets(), 2);
    ctx.close(udp).unwrap();
    ctx.close(tcp).unwrap();
    assert_eq!(ctx.open_sockets(), 0);
}

#[test]
fn udp_datagram_reaches_bound_peer() {
    let ctx = ready_context();

    let sender = ctx.open_udp(None).unwrap();
    sender.bind(0u32, 0).unwrap();
    let sender_port = sender.local_addr().unwrap().port();

    let peer = ctx.open_udp(None).unwrap();
    peer.bind(dotted_ip("127.0.0.1"), 0).unwrap();
    let peer_port = peer.local_addr().unwrap().port();

    let payload = *b"TCN-PD-001";
    assert_eq!(sender.send_udp(&payload, dotted_ip("127.0.0.1"), peer_port), Ok(10));

    let mut buf = [0u8; 1472];
    let (len, src) = peer.receive_udp(&mut buf).unwrap();
    assert_eq!(len, 10);
    assert_eq!(buf[..len], payload);
    assert_eq!(src, SocketAddrV4::new(Ipv4Addr::LOCALHOST, sender_port));

    ctx.close(sender).unwrap();
    ctx.close(peer).unwrap();
}

#[test]
fn non_blocking_udp_without_data_would_block() {
    let ctx = ready_context();
    let sock = ctx.open_udp(Some(&SockOptions::non_blocking())).unwrap();
    sock.bind(Ipv4Addr::LOCALHOST, 0).unwrap();

    let mut buf = [0u8; 64];
    let err = sock.receive_udp(&mut buf).unwrap_err();
    assert_eq!(err, TransferError::new(VosError::Block, 0));
    assert!(err.kind.is_recoverable());

    ctx.close(sock).unwrap();
}

#[test]
fn tcp_accept_yields_independent_handle() {
    let ctx = ready_context();

    let listener = ctx.open_tcp(Some(&SockOptions {
        reuse_addr_port: true,
        ..Default::default()
    }))
    .unwrap();
    listener.bind(Ipv4Addr::LOCALHOST, 0).unwrap();
    listener.listen(1).unwrap();
    let port = listener.local_addr().unwrap().port();

    let client = ctx.open_tcp(None).unwrap();
    client.connect(Ipv4Addr::LOCALHOST, port).unwrap();

    let accepted = ctx.accept(&listener).unwrap().expect("pending connection");
    let server = accepted.handle;
    assert_ne!(server.id(), listener.id());
    assert_ne!(server.id(), client.id());

    // both directions work on the accepted handle
    assert_eq!(client.send_tcp(b"request"), Ok(7));
    let mut buf = [0u8; 7];
    assert_eq!(server.receive_tcp(&mut buf), Ok(7));
    assert_eq!(&buf, b"request");

    assert_eq!(server.send_tcp(b"reply"), Ok(5));
    let mut buf = [0u8; 5];
    assert_eq!(client.receive_tcp(&mut buf), Ok(5));
    assert_eq!(&buf, b"reply");

    // the listener keeps accepting after the first connection
    ctx.set_options(&listener, &SockOptions::non_blocking()).unwrap();
    assert!(ctx.accept(&listener).unwrap().is_none());

    assert_eq!(ctx.open_sockets(), 3);
    for sock in [client, server, listener] {
        ctx.close(sock).unwrap();
    }
    assert_eq!(ctx.open_sockets(), 0);
}

#[test]
fn tcp_receive_accounting_is_cumulative() {
    let ctx = ready_context();

    let listener = ctx.open_tcp(None).unwrap();
    listener.bind(Ipv4Addr::LOCALHOST, 0).unwrap();
    listener.listen(1).unwrap();
    let port = listener.local_addr().unwrap().port();

    let client = ctx.open_tcp(None).unwrap();
    client.connect(Ipv4Addr::LOCALHOST, port).unwrap();
    let server = ctx.accept(&listener).unwrap().unwrap().handle;

    let writer = thread::spawn(move || {
        for chunk in [&b"abc"[..], b"defg", b"hij"] {
            assert_eq!(client.send_tcp(chunk), Ok(chunk.len()));
            thread::sleep(Duration::from_millis(10));
        }
        client
    });

    // a blocking read keeps looping until the buffer is full
    let mut buf = [0u8; 10];
    assert_eq!(server.receive_tcp(&mut buf), Ok(10));
    assert_eq!(&buf, b"abcdefghij");

    let client = writer.join().unwrap();
    for sock in [client, server, listener] {
        ctx.close(sock).unwrap();
    }
}

#[test]
fn unicast_join_is_rejected_before_the_os() {
    let ctx = ready_context();
    let sock = ctx.open_udp(None).unwrap();

    assert_eq!(
        ctx.join(&sock, dotted_ip("192.168.1.10"), 0u32),
        Err(VosError::Param)
    );

    ctx.close(sock).unwrap();
}

#[test]
fn interface_query_with_zero_capacity() {
    assert!(list_interfaces(0).is_empty());
}

#[test]
fn dropped_handle_is_not_counted_as_closed() {
    let ctx = ready_context();
    let sock: SockHandle = ctx.open_udp(None).unwrap();
    drop(sock);
    assert_eq!(ctx.open_sockets(), 1);
}
