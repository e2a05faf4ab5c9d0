//! End-to-end request/response tests over real TCP sockets.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use msgwire_frame::{FrameConfig, PrefixWidth};
use msgwire_peer::{Client, Message, Router, Server};
use serde_json::json;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

fn spawn_server(router: Router, config: FrameConfig) -> SocketAddr {
    let server = Server::bind_with_config("127.0.0.1:0", router, config).unwrap();
    let addr = server.local_addr();
    std::thread::spawn(move || {
        let _ = server.serve();
    });
    addr
}

#[test]
fn ping_handler_replies_with_matching_id() {
    let router = Router::new().on("ping", |_message, reply| {
        reply
            .send(Message::new().with_field("pong", true))
            .unwrap();
    });
    let addr = spawn_server(router, FrameConfig::default());

    let client = Client::connect(addr).unwrap();
    let mut request = Message::typed("ping");
    request.id = Some("corr-1".to_string());

    let reply = client.request_with_timeout(request, REPLY_TIMEOUT).unwrap();

    assert_eq!(reply.id.as_deref(), Some("corr-1"));
    assert_eq!(reply.field("pong"), Some(&json!(true)));
}

#[test]
fn generated_ids_correlate_without_caller_involvement() {
    let router = Router::new().on("ping", |_message, reply| {
        reply
            .send(Message::new().with_field("pong", true))
            .unwrap();
    });
    let addr = spawn_server(router, FrameConfig::default());

    let client = Client::connect(addr).unwrap();
    let reply = client
        .request_with_timeout(Message::typed("ping"), REPLY_TIMEOUT)
        .unwrap();

    assert!(reply.id.is_some(), "server must echo the generated id");
    assert_eq!(reply.field("pong"), Some(&json!(true)));
}

#[test]
fn unregistered_type_without_default_is_dropped() {
    // Only "ping" is registered; no default handler exists.
    let router = Router::new().on("ping", |_message, reply| {
        reply
            .send(Message::new().with_field("pong", true))
            .unwrap();
    });
    let addr = spawn_server(router, FrameConfig::default());

    let client = Client::connect(addr).unwrap();
    client.send(Message::typed("unknown")).unwrap();

    // The connection survives the dropped message: a ping still gets its
    // reply afterward, and the unknown message never produced one.
    let reply = client
        .request_with_timeout(Message::typed("ping"), REPLY_TIMEOUT)
        .unwrap();
    assert_eq!(reply.field("pong"), Some(&json!(true)));
}

#[test]
fn untyped_message_routes_to_default_handler() {
    let router = Router::new().on_default(|message, reply| {
        reply
            .send(Message::new().with_field("echoed", json!(message.fields)))
            .unwrap();
    });
    let addr = spawn_server(router, FrameConfig::default());

    let client = Client::connect(addr).unwrap();
    let reply = client
        .request_with_timeout(Message::new().with_field("greeting", "hi"), REPLY_TIMEOUT)
        .unwrap();

    assert_eq!(reply.field("echoed"), Some(&json!({"greeting": "hi"})));
}

#[test]
fn handler_without_reply_leaves_request_waiting() {
    let router = Router::new().on("void", |_message, _reply| {
        // Deliberately no reply.
    });
    let addr = spawn_server(router, FrameConfig::default());

    let client = Client::connect(addr).unwrap();
    let err = client
        .request_with_timeout(Message::typed("void"), Duration::from_millis(100))
        .unwrap_err();
    assert!(matches!(err, msgwire_peer::PeerError::Timeout(_)));
}

#[test]
fn concurrent_requests_each_get_their_own_reply() {
    let router = Router::new().on("echo", |message, reply| {
        let value = message.field("value").cloned().unwrap_or(json!(null));
        reply
            .send(Message::new().with_field("value", value))
            .unwrap();
    });
    let addr = spawn_server(router, FrameConfig::default());

    let client = Arc::new(Client::connect(addr).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let client = Arc::clone(&client);
            std::thread::spawn(move || {
                let reply = client
                    .request_with_timeout(
                        Message::typed("echo").with_field("value", n),
                        REPLY_TIMEOUT,
                    )
                    .unwrap();
                assert_eq!(reply.field("value"), Some(&json!(n)));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn each_connection_gets_replies_to_its_own_requests() {
    let router = Router::new().on("whoami", |message, reply| {
        let tag = message.field("tag").cloned().unwrap_or(json!(null));
        reply.send(Message::new().with_field("tag", tag)).unwrap();
    });
    let addr = spawn_server(router, FrameConfig::default());

    let first = Client::connect(addr).unwrap();
    let second = Client::connect(addr).unwrap();

    let reply_b = second
        .request_with_timeout(Message::typed("whoami").with_field("tag", "b"), REPLY_TIMEOUT)
        .unwrap();
    let reply_a = first
        .request_with_timeout(Message::typed("whoami").with_field("tag", "a"), REPLY_TIMEOUT)
        .unwrap();

    assert_eq!(reply_a.field("tag"), Some(&json!("a")));
    assert_eq!(reply_b.field("tag"), Some(&json!("b")));
}

#[test]
fn two_byte_prefix_carries_larger_messages() {
    let config = FrameConfig::with_width(PrefixWidth::Two);
    let router = Router::new().on("echo", |message, reply| {
        let value = message.field("blob").cloned().unwrap_or(json!(null));
        reply.send(Message::new().with_field("blob", value)).unwrap();
    });
    let addr = spawn_server(router, config.clone());

    let client = Client::connect_with_config(addr, config).unwrap();
    let blob = "x".repeat(2000);
    let reply = client
        .request_with_timeout(
            Message::typed("echo").with_field("blob", blob.clone()),
            REPLY_TIMEOUT,
        )
        .unwrap();
    assert_eq!(reply.field("blob"), Some(&json!(blob)));
}

#[test]
fn sequential_requests_on_one_connection() {
    let router = Router::new().on("add", |message, reply| {
        let n = message
            .field("n")
            .and_then(|v| v.as_i64())
            .unwrap_or_default();
        reply
            .send(Message::new().with_field("sum", n + 1))
            .unwrap();
    });
    let addr = spawn_server(router, FrameConfig::default());

    let client = Client::connect(addr).unwrap();
    for n in 0..20 {
        let reply = client
            .request_with_timeout(Message::typed("add").with_field("n", n), REPLY_TIMEOUT)
            .unwrap();
        assert_eq!(reply.field("sum"), Some(&json!(n + 1)));
    }
}
