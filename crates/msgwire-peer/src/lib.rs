//! Request/response correlation over framed JSON messages.
//!
//! This is the "just works" layer. A [`Client`] sends messages and awaits
//! matching replies by correlation id; a [`Server`] dispatches inbound
//! messages to [`Router`] handlers by their `type` field and hands each
//! handler a [`Reply`] pinned to the originating connection.

pub mod client;
pub mod error;
pub mod message;
pub mod router;
pub mod server;

pub use client::Client;
pub use error::{PeerError, Result};
pub use message::Message;
pub use router::{Reply, Router};
pub use server::Server;
