//! Base stream format whitelist enforced by SET_STREAM_FORMAT (spec §4.10).

use crate::error::{MilanError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    AafPcm24,
    AafPcm32,
    Iec61883_6Am824,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub encoding: BaseEncoding,
    pub sample_rate_hz: u32,
    pub channels: u8,
}

/// The Milan base-format whitelist (spec §4.10): AAF-PCM 24b/48kHz and
/// 32b/48kHz, IEC61883-6 AM824 48kHz, and AAF-PCM 24b/96kHz, each at 2 or
/// 8 channels.
const WHITELIST: &[(BaseEncoding, u32, u8)] = &[
    (BaseEncoding::AafPcm24, 48_000, 2),
    (BaseEncoding::AafPcm24, 48_000, 8),
    (BaseEncoding::AafPcm32, 48_000, 2),
    (BaseEncoding::AafPcm32, 48_000, 8),
    (BaseEncoding::Iec61883_6Am824, 48_000, 2),
    (BaseEncoding::Iec61883_6Am824, 48_000, 8),
    (BaseEncoding::AafPcm24, 96_000, 2),
    (BaseEncoding::AafPcm24, 96_000, 8),
];

/// Enforced from the AECP SET_STREAM_FORMAT handler: reject anything
/// outside the whitelist (spec §4.10).
pub fn validate_stream_format(format: &StreamFormat) -> Result<()> {
    let admitted = WHITELIST
        .iter()
        .any(|&(encoding, rate, channels)| encoding == format.encoding && rate == format.sample_rate_hz && channels == format.channels);
    if admitted {
        Ok(())
    } else {
        Err(MilanError::UnsupportedStreamFormat)
    }
}
