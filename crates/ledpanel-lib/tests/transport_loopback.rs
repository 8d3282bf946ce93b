//! Integration tests: the WebSocket transport against an in-process server.
//!
//! A plain `tungstenite` server on 127.0.0.1 plays the device: it pushes
//! snapshots, records the frames it receives, and drops the connection to
//! force a reconnect.

use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use ledpanel_lib::panel::{Panel, PanelOptions};
use ledpanel_lib::protocol::{Command, WireFormat};
use ledpanel_lib::state::Control;
use ledpanel_lib::transport::{Link, Transport, TransportEvent, TransportOptions};
use tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

fn next_matching(
    transport: &Transport,
    pred: impl Fn(&TransportEvent) -> bool,
) -> TransportEvent {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if let Some(ev) = transport.next_event(Duration::from_millis(100))
            && pred(&ev)
        {
            return ev;
        }
    }
    panic!("timed out waiting for transport event");
}

/// Read text frames until one arrives.
fn read_text(ws: &mut tungstenite::WebSocket<std::net::TcpStream>) -> String {
    loop {
        if let Message::Text(text) = ws.read().expect("server read") {
            return text.as_str().to_owned();
        }
    }
}

#[test]
fn snapshot_command_and_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (frames_tx, frames_rx) = mpsc::channel::<String>();

    let server = thread::spawn(move || {
        // First session: push a snapshot, take one command, hang up.
        let (stream, _) = listener.accept().unwrap();
        let mut ws = tungstenite::accept(stream).unwrap();
        ws.send(Message::text(r#"{"on":true,"brightness":99}"#))
            .unwrap();
        frames_tx.send(read_text(&mut ws)).unwrap();
        ws.close(None).unwrap();
        while ws.read().is_ok() {}

        // Second session after the client reconnects.
        let (stream, _) = listener.accept().unwrap();
        let mut ws = tungstenite::accept(stream).unwrap();
        ws.send(Message::text(r#"{"status":"again"}"#)).unwrap();
        frames_tx.send(read_text(&mut ws)).unwrap();
    });

    let mut opts = TransportOptions::new(addr.to_string());
    opts.reconnect_delay = Duration::from_millis(200);
    let transport = Transport::connect(opts);
    transport.wait_open(WAIT).unwrap();
    assert!(transport.is_connected());

    let mut panel = Panel::new(PanelOptions::default());
    assert!(panel.handle_event(TransportEvent::Opened));

    let ev = next_matching(&transport, |e| matches!(e, TransportEvent::Message(_)));
    assert!(panel.handle_event(ev));
    assert!(panel.state().on);
    assert_eq!(panel.state().brightness, 99);

    assert!(panel.set(Control::On(false), &transport));
    assert_eq!(
        frames_rx.recv_timeout(WAIT).unwrap(),
        r#"{"action":"on","data":false}"#
    );

    // Server hangs up: one close, then a single reconnect after the delay.
    let closed = next_matching(&transport, |e| matches!(e, TransportEvent::Closed { .. }));
    panel.handle_event(closed);
    assert!(!panel.is_connected());
    let closed_at = Instant::now();
    next_matching(&transport, |e| *e == TransportEvent::Opened);
    assert!(closed_at.elapsed() >= Duration::from_millis(150));

    let ev = next_matching(&transport, |e| matches!(e, TransportEvent::Message(_)));
    panel.handle_event(ev);
    assert_eq!(panel.state().status.as_deref(), Some("again"));

    transport.send(&Command::Clear).unwrap();
    assert_eq!(
        frames_rx.recv_timeout(WAIT).unwrap(),
        Command::Clear.encode(WireFormat::Data)
    );

    transport.shutdown();
    server.join().unwrap();
}

#[test]
fn value_wire_format_on_the_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut ws = tungstenite::accept(stream).unwrap();
        read_text(&mut ws)
    });

    let mut opts = TransportOptions::new(addr.to_string());
    opts.format = WireFormat::Value;
    let transport = Transport::connect(opts);
    transport.wait_open(WAIT).unwrap();
    transport.send(&Command::Brightness(12)).unwrap();

    let frame = server.join().unwrap();
    assert_eq!(frame, r#"{"action":"brightness","value":12}"#);
    assert_eq!(
        Command::decode(&frame).unwrap(),
        Command::Brightness(12)
    );
    transport.shutdown();
}

#[test]
fn shutdown_flushes_accepted_commands() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut ws = tungstenite::accept(stream).unwrap();
        let mut frames = Vec::new();
        while let Ok(msg) = ws.read() {
            if let Message::Text(text) = msg {
                frames.push(text.as_str().to_owned());
            }
        }
        frames
    });

    let transport = Transport::connect(TransportOptions::new(addr.to_string()));
    transport.wait_open(WAIT).unwrap();
    transport.send(&Command::On(true)).unwrap();
    transport.send(&Command::Pattern(2)).unwrap();
    transport.shutdown();

    let frames = server.join().unwrap();
    assert_eq!(
        frames,
        vec![
            r#"{"action":"on","data":true}"#.to_string(),
            r#"{"action":"pattern","data":2}"#.to_string(),
        ]
    );
}

#[test]
fn send_right_before_shutdown_is_never_lost() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    const ROUNDS: usize = 20;

    let server = thread::spawn(move || {
        let mut received = Vec::new();
        for _ in 0..ROUNDS {
            let (stream, _) = listener.accept().unwrap();
            let mut ws = tungstenite::accept(stream).unwrap();
            let mut frames = 0;
            while let Ok(msg) = ws.read() {
                if msg.is_text() {
                    frames += 1;
                }
            }
            received.push(frames);
        }
        received
    });

    for round in 0..ROUNDS {
        let transport = Transport::connect(TransportOptions::new(addr.to_string()));
        transport.wait_open(WAIT).unwrap();
        // Let the worker settle into its read timeout before racing it.
        thread::sleep(Duration::from_millis(10 * (round % 5) as u64));
        transport.send(&Command::Sync).unwrap();
        transport.shutdown();
    }

    assert_eq!(server.join().unwrap(), vec![1; ROUNDS]);
}

#[test]
fn wait_open_times_out_without_server() {
    // Bind then drop to get a port nobody listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut opts = TransportOptions::new(format!("127.0.0.1:{port}"));
    opts.reconnect_delay = Duration::from_millis(100);
    let transport = Transport::connect(opts);
    let err = transport.wait_open(Duration::from_millis(400)).unwrap_err();
    assert!(err.to_string().starts_with("Timed out"));
    assert!(transport.send(&Command::Sync).is_err());
}
