//! Length-prefixed JSON messaging over TCP with request/response correlation.
//!
//! msgwire frames JSON messages with a 1/2/4-byte big-endian length prefix
//! and correlates requests with replies by message id.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP stream transport (listener, connected stream)
//! - [`frame`] — Length-prefixed JSON framing (codec, reader, writer)
//! - [`peer`] — Client/server endpoints with id correlation and type routing

/// Re-export transport types.
pub mod transport {
    pub use msgwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use msgwire_frame::*;
}

/// Re-export peer types.
pub mod peer {
    pub use msgwire_peer::*;
}
