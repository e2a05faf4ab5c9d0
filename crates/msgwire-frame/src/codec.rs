use bytes::{Buf, BytesMut};
use serde_json::Value;

use crate::error::{FrameError, Result};
use crate::width::PrefixWidth;

/// Encode a JSON value into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────────┬──────────────────────┐
/// │ Length (1/2/4B BE)   │ UTF-8 JSON text      │
/// │                      │ (Length bytes)       │
/// └──────────────────────┴──────────────────────┘
/// ```
///
/// Fails with [`FrameError::FrameTooLarge`] when the serialized text does
/// not fit the prefix; nothing is appended to `dst` in that case.
pub fn encode_frame(value: &Value, width: PrefixWidth, dst: &mut BytesMut) -> Result<()> {
    let text = serde_json::to_vec(value).map_err(FrameError::MalformedFrame)?;

    if text.len() > width.max_payload() {
        return Err(FrameError::FrameTooLarge {
            size: text.len(),
            max: width.max_payload(),
        });
    }

    dst.reserve(width.size() + text.len());
    width.put_len(text.len(), dst);
    dst.extend_from_slice(&text);
    Ok(())
}

/// Decode one frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet —
/// either the prefix itself or the declared payload is still short. No
/// partial frame is ever emitted.
///
/// On a complete frame, consumes `prefix + declared` bytes from the buffer
/// and parses the payload as JSON. A payload that is not valid JSON yields
/// [`FrameError::MalformedFrame`] with the buffer already advanced past it,
/// so the caller keeps decoding subsequent frames.
///
/// One input chunk may hold zero, one, or many frames; callers loop until
/// `Ok(None)`. The declared length is read fresh from the buffer head on
/// every call and used directly for extraction.
pub fn decode_frame(src: &mut BytesMut, width: PrefixWidth) -> Result<Option<Value>> {
    if src.len() < width.size() {
        return Ok(None); // Need more data
    }

    let declared = width.read_len(&src[..width.size()]);

    if src.len() < width.size() + declared {
        return Ok(None); // Need more data
    }

    src.advance(width.size());
    let payload = src.split_to(declared);

    match serde_json::from_slice(&payload) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::debug!(declared, error = %err, "frame payload failed to parse");
            Err(FrameError::MalformedFrame(err))
        }
    }
}

/// Configuration for a framed stream.
#[derive(Debug, Clone, Default)]
pub struct FrameConfig {
    /// Length-prefix width, fixed for the connection's lifetime. Default: 1.
    pub width: PrefixWidth,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl FrameConfig {
    /// Config with the given width and no timeouts.
    pub fn with_width(width: PrefixWidth) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn encode_decode_roundtrip_all_widths() {
        let value = json!({"type": "greeting", "body": "hello, msgwire!"});

        for width in [PrefixWidth::One, PrefixWidth::Two, PrefixWidth::Four] {
            let mut buf = BytesMut::new();
            encode_frame(&value, width, &mut buf).unwrap();

            let text_len = serde_json::to_vec(&value).unwrap().len();
            assert_eq!(buf.len(), width.size() + text_len);

            let decoded = decode_frame(&mut buf, width).unwrap().unwrap();
            assert_eq!(decoded, value);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn decode_incomplete_prefix() {
        let mut buf = BytesMut::from(&[0x00][..]);
        let result = decode_frame(&mut buf, PrefixWidth::Two).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 1, "incomplete input must not be consumed");
    }

    #[test]
    fn decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(&json!({"k": 1}), PrefixWidth::One, &mut buf).unwrap();
        buf.truncate(buf.len() - 2);

        let before = buf.len();
        let result = decode_frame(&mut buf, PrefixWidth::One).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), before, "incomplete input must not be consumed");
    }

    #[test]
    fn oversized_payload_rejected_on_encode() {
        // 256+ bytes of JSON text overflows a 1-byte prefix but fits 2 bytes.
        let value = json!({"blob": "x".repeat(300)});

        let mut buf = BytesMut::new();
        let err = encode_frame(&value, PrefixWidth::One, &mut buf).unwrap_err();
        assert!(matches!(
            err,
            FrameError::FrameTooLarge { max: 255, .. }
        ));
        assert!(buf.is_empty(), "nothing may be written for a rejected frame");

        encode_frame(&value, PrefixWidth::Two, &mut buf).unwrap();
        let decoded = decode_frame(&mut buf, PrefixWidth::Two).unwrap().unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn malformed_payload_is_skipped() {
        // Header declares 5 bytes, payload "abcde" is not JSON.
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[5]);
        buf.extend_from_slice(b"abcde");
        encode_frame(&json!({"ok": true}), PrefixWidth::One, &mut buf).unwrap();

        let err = decode_frame(&mut buf, PrefixWidth::One).unwrap_err();
        assert!(matches!(err, FrameError::MalformedFrame(_)));

        // The corrupt frame was consumed; the next one decodes normally.
        let decoded = decode_frame(&mut buf, PrefixWidth::One).unwrap().unwrap();
        assert_eq!(decoded, json!({"ok": true}));
        assert!(buf.is_empty());
    }

    #[test]
    fn multiple_frames_in_one_buffer() {
        let values = [json!({"n": 1}), json!({"n": 2}), json!({"n": 3})];
        let mut buf = BytesMut::new();
        for value in &values {
            encode_frame(value, PrefixWidth::Two, &mut buf).unwrap();
        }

        for expected in &values {
            let decoded = decode_frame(&mut buf, PrefixWidth::Two).unwrap().unwrap();
            assert_eq!(&decoded, expected);
        }
        assert!(decode_frame(&mut buf, PrefixWidth::Two).unwrap().is_none());
    }

    #[test]
    fn chunked_feeding_matches_whole_buffer() {
        let values = [
            json!({"id": "a", "type": "ping"}),
            json!({"id": "b", "pong": true}),
            json!([1, 2, 3]),
        ];
        let mut wire = BytesMut::new();
        for value in &values {
            encode_frame(value, PrefixWidth::One, &mut wire).unwrap();
        }

        // Feed one byte at a time; the decode loop must produce the same
        // sequence as handing over the full buffer at once.
        let mut buf = BytesMut::new();
        let mut decoded = Vec::new();
        for byte in wire.iter() {
            buf.extend_from_slice(&[*byte]);
            while let Some(value) = decode_frame(&mut buf, PrefixWidth::One).unwrap() {
                decoded.push(value);
            }
        }

        assert_eq!(decoded, values);
    }

    #[test]
    fn empty_object_roundtrip() {
        let mut buf = BytesMut::new();
        encode_frame(&json!({}), PrefixWidth::One, &mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"\x02{}");

        let decoded = decode_frame(&mut buf, PrefixWidth::One).unwrap().unwrap();
        assert_eq!(decoded, json!({}));
    }

    #[test]
    fn declared_length_zero_is_malformed() {
        // A zero-length payload can never parse as JSON; the frame is
        // consumed and the stream continues.
        let mut buf = BytesMut::from(&[0u8][..]);
        encode_frame(&json!(1), PrefixWidth::One, &mut buf).unwrap();

        let err = decode_frame(&mut buf, PrefixWidth::One).unwrap_err();
        assert!(matches!(err, FrameError::MalformedFrame(_)));
        let decoded = decode_frame(&mut buf, PrefixWidth::One).unwrap().unwrap();
        assert_eq!(decoded, json!(1));
    }
}
