//! Length-prefixed JSON message framing.
//!
//! This is the core value-add layer of msgwire. Every message on the wire is:
//! - A length prefix of 1, 2, or 4 bytes (big-endian, fixed per connection)
//! - That many bytes of UTF-8 JSON text
//!
//! No partial reads, no buffer management in user code. Both endpoints must
//! agree on the prefix width out of band; there is no in-band negotiation.

pub mod codec;
pub mod error;
pub mod reader;
pub mod width;
pub mod writer;

pub use codec::{decode_frame, encode_frame, FrameConfig};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use width::PrefixWidth;
pub use writer::FrameWriter;
