//! Wire-codec failure taxonomy shared by every frame decoder in the workspace.

/// Result type for wire-codec operations.
pub type Result<T> = std::result::Result<T, WireError>;

/// Errors a decoder can return. No partial decoding: a decoded frame is
/// either complete and valid or rejected with one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Buffer shorter than the frame requires.
    #[error("truncated frame: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum bytes required to decode.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// `version` field did not match the value this codec supports.
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    /// `subtype`/`messageType` field did not match a known variant.
    #[error("unknown subtype: {0:#x}")]
    UnknownSubtype(u8),

    /// A bit documented as "reserved, must be zero" was set on receive.
    ///
    /// Per policy (spec §4.1) this is tolerated and ignored on decode; the
    /// variant exists for codecs/tests that want strict validation.
    #[error("reserved bits set in field {field}: {value:#x}")]
    ReservedBitsSet {
        /// Name of the field carrying the reserved bits.
        field: &'static str,
        /// Raw value observed.
        value: u32,
    },

    /// A length field in the frame didn't match the actual payload length.
    #[error("length mismatch: header claims {claimed}, payload is {actual}")]
    LengthMismatch {
        /// Length claimed by a header field.
        claimed: usize,
        /// Length actually present.
        actual: usize,
    },

    /// A value outside its documented domain (e.g. nanoseconds >= 1e9).
    #[error("invalid value for {field}: {detail}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable detail.
        detail: String,
    },

    /// AEM checksum over a descriptor did not match its serialized form.
    #[error("AEM checksum mismatch")]
    ChecksumMismatch,
}

impl WireError {
    /// Build a [`WireError::Truncated`] from a required size and an observed buffer.
    pub fn truncated(expected: usize, actual: &[u8]) -> Self {
        Self::Truncated {
            expected,
            actual: actual.len(),
        }
    }

    /// True for errors that should be counted as "protocol" errors per the
    /// taxonomy in spec §7 (report, do not retry).
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedVersion(_)
                | Self::UnknownSubtype(_)
                | Self::ChecksumMismatch
                | Self::LengthMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_reports_both_lengths() {
        let err = WireError::truncated(34, &[0u8; 10]);
        match err {
            WireError::Truncated { expected, actual } => {
                assert_eq!(expected, 34);
                assert_eq!(actual, 10);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn protocol_error_classification() {
        assert!(WireError::UnsupportedVersion(3).is_protocol_error());
        assert!(WireError::ChecksumMismatch.is_protocol_error());
        assert!(!WireError::Truncated {
            expected: 1,
            actual: 0
        }
        .is_protocol_error());
    }
}
