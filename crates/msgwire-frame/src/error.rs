/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The encoded payload exceeds what the length prefix can express.
    ///
    /// Raised synchronously to the sender; nothing is written. The caller
    /// must shrink the message or reconfigure the prefix width.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// A frame's payload was not valid JSON.
    ///
    /// The faulty frame has already been consumed from the stream buffer;
    /// decoding continues with the next frame.
    #[error("malformed frame payload: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    /// The prefix width is not one of 1, 2, or 4 bytes.
    #[error("invalid prefix width {0} (expected 1, 2, or 4)")]
    InvalidPrefixWidth(u8),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
