//! TCP stream transport for msgwire.
//!
//! This is the lowest layer of msgwire: plain byte-stream connections with
//! ordered delivery. Everything else builds on top of the [`WireStream`]
//! type provided here. The framing and correlation layers never look below
//! byte delivery order and completion.

pub mod error;
pub mod tcp;

pub use error::{Result, TransportError};
pub use tcp::{WireListener, WireStream};
