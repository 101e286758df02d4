//! Errors produced by the wire-format cursors and reference codec.

use thiserror::Error;

/// Errors that can occur during encoding or decoding.
///
/// Mirrors the failure set every target-language emitter must surface
/// through its own error idiom (see `ffire_codegen::target::Emitter`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// The decoder ran past the end of the input buffer.
    #[error("truncated input: need {needed} more bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the read needed.
        needed: usize,
        /// Bytes actually remaining in the buffer.
        remaining: usize,
    },

    /// A string or array length, or the total encoded size, exceeds its
    /// wire-format cap.
    #[error("value too large to encode: {len} exceeds the wire-format limit")]
    TooLarge {
        /// The offending length.
        len: usize,
    },

    /// A string's bytes are not valid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    /// A `bool` byte was neither 0x00 nor 0x01.
    #[error("invalid bool byte: {byte:#04x}")]
    InvalidBool {
        /// The offending byte.
        byte: u8,
    },

    /// An optional presence byte was neither 0x00 nor 0x01.
    #[error("invalid presence byte: {byte:#04x}")]
    InvalidPresence {
        /// The offending byte.
        byte: u8,
    },

    /// Strict decode found bytes remaining after the root value.
    #[error("{remaining} trailing bytes after decoded value")]
    TrailingBytes {
        /// Number of bytes left unconsumed.
        remaining: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert!(WireError::Truncated { needed: 4, remaining: 1 }.to_string().contains("truncated"));
        assert!(WireError::TooLarge { len: 70000 }.to_string().contains("too large"));
        assert!(WireError::InvalidUtf8.to_string().contains("UTF-8"));
        assert!(WireError::InvalidBool { byte: 7 }.to_string().contains("0x07"));
        assert!(WireError::InvalidPresence { byte: 9 }.to_string().contains("0x09"));
        assert!(WireError::TrailingBytes { remaining: 3 }.to_string().contains("trailing"));
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            WireError::Truncated { needed: 1, remaining: 0 },
            WireError::Truncated { needed: 1, remaining: 0 }
        );
        assert_ne!(
            WireError::InvalidBool { byte: 2 },
            WireError::InvalidBool { byte: 3 }
        );
    }
}
