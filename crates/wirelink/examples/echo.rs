//! Self-contained echo round trip: spawns a framed echo server on a local
//! port, connects a client to it, and prints the reply.
//!
//! Run with:
//!   cargo run --example echo

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use wirelink::Client;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();

    // One-shot echo server: read a frame, send it straight back.
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept should succeed");
        let mut header = [0u8; 4];
        stream.read_exact(&mut header).expect("frame header");
        let total = u32::from_be_bytes(header) as usize;
        let mut payload = vec![0u8; total - 4];
        stream.read_exact(&mut payload).expect("frame payload");
        stream.write_all(&header).expect("echo header");
        stream.write_all(&payload).expect("echo payload");
        // Keep the socket open until the client hangs up.
        let _ = stream.read(&mut [0u8; 1]);
    });

    let (reply_tx, reply_rx) = mpsc::channel();

    let mut client = Client::builder()
        .host("127.0.0.1")
        .port(port)
        .on_connected(|endpoint| eprintln!("connected to {endpoint}"))
        .on_message(move |payload| {
            let _ = reply_tx.send(payload.as_slice().to_vec());
        })
        .on_closed(|| eprintln!("closed"))
        .on_error(|message| eprintln!("error: {message}"))
        .build();

    client.reconnect();
    client.send(b"hello over the wire");

    let reply = reply_rx.recv_timeout(Duration::from_secs(5))?;
    eprintln!("echoed back: {}", String::from_utf8_lossy(&reply));

    client.close();
    Ok(())
}
