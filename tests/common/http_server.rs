//! Minimal scripted HTTP/1.1 server for integration tests.
//!
//! Each queued step handles exactly one incoming connection: either answer
//! with a canned status/body, or drop the connection without a response
//! (which surfaces as a transport-level failure in the client). Once the
//! script is exhausted, every further connection gets a 200.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub enum Step {
    Respond { status: u16, body: &'static str },
    DropConnection,
}

/// Starts the server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process exits.
pub fn start(steps: Vec<Step>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let mut script = steps.into_iter();
        for stream in listener.incoming().flatten() {
            let step = script.next().unwrap_or(Step::Respond {
                status: 200,
                body: "ok",
            });
            handle(stream, step);
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: TcpStream, step: Step) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    // Read the request head; the exact contents do not matter here.
    let mut buf = [0u8; 8192];
    if matches!(stream.read(&mut buf), Ok(0) | Err(_)) {
        return;
    }

    match step {
        Step::DropConnection => {
            // Returning closes the socket with no response bytes.
        }
        Step::Respond { status, body } => {
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason(status),
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
