//! External collaborators a [`crate::port::PtpPort`] is generic over (spec
//! §6): the hardware clock and the network port it sends/receives frames
//! through. Kept as plain traits rather than trait objects so a deployment
//! can monomorphize over its actual hardware without paying for dynamic
//! dispatch on the receive hot path.

use tsn_types::{PortIdentity, Timestamp};

/// A PTP hardware (or software) clock this port can read and discipline.
pub trait HardwareClock {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current time of this clock.
    fn now(&self) -> Result<Timestamp, Self::Error>;

    /// Smallest increment this clock can resolve, in nanoseconds. Used to
    /// judge whether a measured offset is noise.
    fn resolution_ns(&self) -> u32;

    /// Apply an immediate phase step (spec §4.5: used above the hard-step
    /// threshold, never during steady-state tracking).
    fn adjust_phase(&mut self, offset_ns: i64) -> Result<(), Self::Error>;

    /// Set the running frequency offset, in parts-per-billion, relative to
    /// the clock's nominal rate (spec §4.5: the PI servo's steady-state
    /// correction).
    fn adjust_frequency(&mut self, ppb: f64) -> Result<(), Self::Error>;

    /// Overwrite the clock outright (used only at startup or after a
    /// LOST -> re-acquire transition discards a stale running state).
    fn set_time(&mut self, time: Timestamp) -> Result<(), Self::Error>;
}

/// Timestamp captured for a single frame, as delivered by the network
/// port's hardware timestamping path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTimestamp {
    pub timestamp: Timestamp,
}

/// The network interface a port transmits PTP frames on and receives them
/// from. Implementations are expected to hardware-timestamp both
/// directions (spec §6); callers must treat the absence of a timestamp as
/// [`crate::error::GptpError::TimestampCaptureFailed`].
pub trait NetworkPort {
    type Error: std::error::Error + Send + Sync + 'static;

    /// This port's own identity, used to populate `sourcePortIdentity` on
    /// every transmitted message.
    fn port_identity(&self) -> PortIdentity;

    /// Transmit a fully encoded PTP frame, returning the hardware Tx
    /// timestamp captured for it.
    fn send_frame(&mut self, frame: &[u8]) -> Result<FrameTimestamp, Self::Error>;

    /// Poll for one received frame, if any is queued, paired with its
    /// hardware Rx timestamp.
    fn poll_receive(&mut self) -> Result<Option<(Vec<u8>, FrameTimestamp)>, Self::Error>;
}
