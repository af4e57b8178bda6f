//! Line-based codec for tokio.
//!
//! Reads and writes `\r\n`-terminated lines. Decoding tolerates bare `\n`
//! and strips the terminator; lines are limited to 512 bytes by default
//! (the IRC standard).

use bytes::BytesMut;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Errors produced by [`LineCodec`].
#[derive(Debug, Error)]
pub enum LineCodecError {
    /// A line exceeded the configured maximum length.
    #[error("line exceeds {limit} bytes")]
    LineTooLong {
        /// The configured limit.
        limit: usize,
    },
    /// A line was not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
    /// An underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Codec that frames newline-terminated messages.
pub struct LineCodec {
    /// Index of next byte to check for newline.
    next_index: usize,
    /// Maximum line length.
    max_len: usize,
}

impl LineCodec {
    /// Create a codec with the standard 512-byte line limit.
    pub fn new() -> Self {
        Self {
            next_index: 0,
            max_len: 512,
        }
    }

    /// Create a codec with a custom maximum line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = LineCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, LineCodecError> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(LineCodecError::LineTooLong {
                    limit: self.max_len,
                });
            }

            let text =
                std::str::from_utf8(&line).map_err(|_| LineCodecError::InvalidUtf8)?;
            Ok(Some(text.trim_end_matches(['\r', '\n']).to_string()))
        } else {
            // No newline yet. Remember where we stopped scanning and
            // refuse to buffer past the line limit.
            self.next_index = src.len();
            if src.len() > self.max_len {
                return Err(LineCodecError::LineTooLong {
                    limit: self.max_len,
                });
            }
            Ok(None)
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = LineCodecError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), LineCodecError> {
        dst.reserve(item.len() + 2);
        dst.extend_from_slice(item.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

impl Encoder<&str> for LineCodec {
    type Error = LineCodecError;

    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<(), LineCodecError> {
        dst.reserve(item.len() + 2);
        dst.extend_from_slice(item.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_crlf_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PING :server\r\n"[..]);
        let line = codec.decode(&mut buf).unwrap();
        assert_eq!(line.as_deref(), Some("PING :server"));
    }

    #[test]
    fn test_decode_bare_lf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"NOTICE x :hi\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("NOTICE x :hi"));
    }

    #[test]
    fn test_decode_partial_then_complete() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PRIV"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"MSG #c :hi\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("PRIVMSG #c :hi")
        );
    }

    #[test]
    fn test_decode_two_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"one\r\ntwo\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("one"));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("two"));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_line_too_long() {
        let mut codec = LineCodec::with_max_len(8);
        let mut buf = BytesMut::from(&b"0123456789\r\n"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(LineCodecError::LineTooLong { limit: 8 })
        ));
    }

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("NICK basalt", &mut buf).unwrap();
        assert_eq!(&buf[..], b"NICK basalt\r\n");
    }
}
