//! Length-prefix widths.
//!
//! The protocol supports exactly three prefix widths. Keeping them as a
//! closed enum means every read/write site dispatches through a `match` to
//! the fixed-width big-endian accessor, and configuration parsing rejects
//! anything else up front.

use bytes::BufMut;

use crate::error::FrameError;

/// Width of the big-endian length prefix, fixed per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixWidth {
    /// 1-byte prefix; payloads up to 255 bytes.
    #[default]
    One,
    /// 2-byte prefix; payloads up to 64 KiB - 1.
    Two,
    /// 4-byte prefix; payloads up to 4 GiB - 1.
    Four,
}

impl PrefixWidth {
    /// Size of the prefix in bytes.
    pub const fn size(self) -> usize {
        match self {
            PrefixWidth::One => 1,
            PrefixWidth::Two => 2,
            PrefixWidth::Four => 4,
        }
    }

    /// Largest payload length the prefix can express: `2^(8*width) - 1`.
    pub const fn max_payload(self) -> usize {
        match self {
            PrefixWidth::One => u8::MAX as usize,
            PrefixWidth::Two => u16::MAX as usize,
            PrefixWidth::Four => u32::MAX as usize,
        }
    }

    /// Append `len` as a big-endian prefix.
    ///
    /// Caller guarantees `len <= max_payload()`.
    pub(crate) fn put_len(self, len: usize, dst: &mut impl BufMut) {
        match self {
            PrefixWidth::One => dst.put_u8(len as u8),
            PrefixWidth::Two => dst.put_u16(len as u16),
            PrefixWidth::Four => dst.put_u32(len as u32),
        }
    }

    /// Read a big-endian prefix from the front of `src`.
    ///
    /// Caller guarantees `src.len() >= self.size()`.
    pub(crate) fn read_len(self, src: &[u8]) -> usize {
        match self {
            PrefixWidth::One => src[0] as usize,
            PrefixWidth::Two => u16::from_be_bytes([src[0], src[1]]) as usize,
            PrefixWidth::Four => {
                u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize
            }
        }
    }
}

impl TryFrom<u8> for PrefixWidth {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PrefixWidth::One),
            2 => Ok(PrefixWidth::Two),
            4 => Ok(PrefixWidth::Four),
            other => Err(FrameError::InvalidPrefixWidth(other)),
        }
    }
}

impl std::fmt::Display for PrefixWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.size())
    }
}
