//! Minimal echo server — replies to every message with its fields echoed.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run -- send 127.0.0.1:3000 --type greet \
//!     --json '{"hello":"world"}' --wait --wait-timeout 3s
//!
//! Each reply carries the request's correlation id, so `send --wait`
//! matches it automatically.

use msgwire::peer::{Message, Router, Server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let router = Router::new().on_default(|message, reply| {
        eprintln!(
            "received type={:?} id={:?} fields={}",
            message.kind,
            message.id,
            serde_json::to_string(&message.fields).unwrap_or_default()
        );

        let mut response = Message::new();
        response.kind = message.kind.clone();
        response.fields = message.fields.clone();
        if let Err(e) = reply.send(response) {
            eprintln!("reply failed: {e}");
        }
    });

    let server = Server::bind("127.0.0.1:3000", router)?;
    eprintln!("Listening on {}", server.local_addr());

    server.serve()?;
    Ok(())
}
