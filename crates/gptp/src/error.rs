//! Error types for the gPTP port state machine and its collaborators.

use tsn_types::WireError;

/// Result type for gPTP port operations.
pub type Result<T> = std::result::Result<T, GptpError>;

/// Errors a [`crate::port::PtpPort`] can raise. Every variant maps onto one
/// of the failure categories in spec §7 via [`GptpError::is_fault`].
#[derive(Debug, thiserror::Error)]
pub enum GptpError {
    /// A received frame failed to decode.
    #[error("wire codec error: {0}")]
    Wire(#[from] WireError),

    /// The hardware clock rejected a requested adjustment (spec §7: FAULT).
    #[error("hardware clock rejected adjustment: {0}")]
    ClockAdjustmentRejected(String),

    /// The network port failed to transmit a frame.
    #[error("network port send failed: {0}")]
    SendFailed(String),

    /// A hardware timestamp could not be captured for a transmitted or
    /// received frame (spec §6, §7: FAULT after repeated occurrence).
    #[error("timestamp capture failed: {0}")]
    TimestampCaptureFailed(String),

    /// Milan path-delay cessation on this link (spec §4.4); not itself a
    /// fault, but callers that treat all gPTP errors uniformly need this
    /// variant to distinguish it from [`GptpError::Wire`] errors.
    #[error("multiple PDelay responders, transmission ceased on this link")]
    MultipleResponsesCeaseTransmission,
}

impl GptpError {
    /// True for errors severe enough that the port should transition to
    /// FAULTY (spec §4.2, §7) rather than merely incrementing a counter.
    pub fn is_fault(&self) -> bool {
        match self {
            Self::ClockAdjustmentRejected(_) | Self::TimestampCaptureFailed(_) => true,
            Self::Wire(e) => e.is_protocol_error(),
            Self::SendFailed(_) | Self::MultipleResponsesCeaseTransmission => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_rejection_is_a_fault() {
        let err = GptpError::ClockAdjustmentRejected("EPERM".into());
        assert!(err.is_fault());
    }

    #[test]
    fn cessation_is_not_a_fault() {
        assert!(!GptpError::MultipleResponsesCeaseTransmission.is_fault());
    }

    #[test]
    fn truncated_wire_error_is_not_a_fault() {
        let err = GptpError::Wire(WireError::Truncated {
            expected: 34,
            actual: 10,
        });
        assert!(!err.is_fault());
    }
}
