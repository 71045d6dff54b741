//! AAF (audio) subtype-specific header and payload invariants (spec §4.7).

use tsn_types::{Result, WireError};

/// `format` byte values (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AafFormat {
    UserSpecified = 0,
    Float32 = 1,
    Int32 = 2,
    Int24 = 3,
    Int16 = 4,
    Aes3 = 5,
}

impl AafFormat {
    fn from_u8(v: u8) -> Result<Self> {
        Ok(match v {
            0 => Self::UserSpecified,
            1 => Self::Float32,
            2 => Self::Int32,
            3 => Self::Int24,
            4 => Self::Int16,
            5 => Self::Aes3,
            other => {
                return Err(WireError::InvalidValue {
                    field: "aaf.format",
                    detail: format!("unknown format {other}"),
                })
            }
        })
    }

    /// bit_depth values this format accepts (spec §4.7: "bit_depth matches
    /// format").
    fn accepts_bit_depth(&self, bit_depth: u8) -> bool {
        match self {
            Self::Float32 | Self::Int32 => bit_depth == 32,
            Self::Int24 | Self::Aes3 => bit_depth == 24,
            Self::Int16 => bit_depth == 16,
            Self::UserSpecified => matches!(bit_depth, 16 | 24 | 32),
        }
    }
}

/// Nominal sample rates the base profile names (spec §4.7), in Hz.
pub const NOMINAL_SAMPLE_RATES_HZ: [u32; 9] = [
    8_000, 16_000, 32_000, 44_100, 48_000, 88_200, 96_000, 176_400, 192_000,
];

/// The 8-byte AAF format-specific header (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AafHeader {
    pub format: u8,
    pub nominal_sample_rate_hz: u32,
    pub bit_depth: u8,
    pub channels: u16,
    pub samples_per_frame: u16,
}

pub const AAF_HEADER_LEN: usize = 8;

impl AafHeader {
    /// Milan allows up to 64 channels; the base profile caps at 8 (spec
    /// §4.7).
    pub const MAX_CHANNELS_BASE: u16 = 8;
    pub const MAX_CHANNELS_MILAN: u16 = 64;

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.format);
        buf.push(sample_rate_index(self.nominal_sample_rate_hz));
        buf.push(self.bit_depth);
        buf.extend_from_slice(&(self.channels & 0x03FF).to_be_bytes());
        buf.extend_from_slice(&self.samples_per_frame.to_be_bytes());
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < AAF_HEADER_LEN {
            return Err(WireError::truncated(AAF_HEADER_LEN, data));
        }
        let format = data[0];
        let nominal_sample_rate_hz = sample_rate_from_index(data[1])?;
        let bit_depth = data[2];
        let channels = u16::from_be_bytes([data[3], data[4]]) & 0x03FF;
        let samples_per_frame = u16::from_be_bytes([data[5], data[6]]);

        let header = Self {
            format,
            nominal_sample_rate_hz,
            bit_depth,
            channels,
            samples_per_frame,
        };
        header.validate()?;
        Ok(header)
    }

    /// Invariants (spec §4.7): bit_depth matches format; channel count
    /// within the allowed range for either profile.
    pub fn validate(&self) -> Result<()> {
        let format = AafFormat::from_u8(self.format)?;
        if !format.accepts_bit_depth(self.bit_depth) {
            return Err(WireError::InvalidValue {
                field: "aaf.bit_depth",
                detail: format!("{:?} does not accept bit_depth {}", format, self.bit_depth),
            });
        }
        if self.channels == 0 || self.channels > Self::MAX_CHANNELS_MILAN {
            return Err(WireError::InvalidValue {
                field: "aaf.channels",
                detail: format!("{} out of range 1..={}", self.channels, Self::MAX_CHANNELS_MILAN),
            });
        }
        Ok(())
    }

    /// `channels * samples_per_frame * (bit_depth/8) == audio_data_size`
    /// (spec §4.7).
    pub fn expected_audio_data_size(&self) -> usize {
        self.channels as usize * self.samples_per_frame as usize * (self.bit_depth as usize / 8)
    }
}

fn sample_rate_index(hz: u32) -> u8 {
    NOMINAL_SAMPLE_RATES_HZ
        .iter()
        .position(|&r| r == hz)
        .map(|i| i as u8 + 1)
        .unwrap_or(0)
}

fn sample_rate_from_index(index: u8) -> Result<u32> {
    if index == 0 || index as usize > NOMINAL_SAMPLE_RATES_HZ.len() {
        return Err(WireError::InvalidValue {
            field: "aaf.nominal_sample_rate",
            detail: format!("index {index} out of range"),
        });
    }
    Ok(NOMINAL_SAMPLE_RATES_HZ[index as usize - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AafHeader {
        AafHeader {
            format: AafFormat::Int24 as u8,
            nominal_sample_rate_hz: 48_000,
            bit_depth: 24,
            channels: 8,
            samples_per_frame: 6,
        }
    }

    #[test]
    fn round_trip() {
        let h = sample();
        let mut buf = Vec::new();
        h.encode(&mut buf);
        assert_eq!(buf.len(), AAF_HEADER_LEN);
        assert_eq!(AafHeader::decode(&buf).unwrap(), h);
    }

    #[test]
    fn bit_depth_must_match_format() {
        let mut h = sample();
        h.bit_depth = 16;
        assert!(h.validate().is_err());
    }

    #[test]
    fn audio_data_size_matches_invariant() {
        let h = sample();
        assert_eq!(h.expected_audio_data_size(), 8 * 6 * 3);
    }

    #[test]
    fn channels_beyond_milan_max_rejected() {
        let mut h = sample();
        h.channels = AafHeader::MAX_CHANNELS_MILAN + 1;
        assert!(h.validate().is_err());
    }
}
