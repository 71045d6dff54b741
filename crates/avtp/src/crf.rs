//! CRF (clock reference) subtype-specific header (spec §4.7): a periodic
//! timestamp train used for media-clock recovery.

use tsn_types::{Result, WireError};

/// `crf_type` values (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CrfType {
    AudioSample = 0,
    VideoFrame = 1,
    MachineCycle = 2,
}

impl CrfType {
    fn from_u8(v: u8) -> Result<Self> {
        Ok(match v {
            0 => Self::AudioSample,
            1 => Self::VideoFrame,
            2 => Self::MachineCycle,
            other => {
                return Err(WireError::InvalidValue {
                    field: "crf.crf_type",
                    detail: format!("unknown crf_type {other}"),
                })
            }
        })
    }
}

pub const CRF_HEADER_LEN: usize = 8;

/// The 8-byte CRF format-specific header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrfHeader {
    pub crf_type: u8,
    /// Number of timestamps in this packet's payload.
    pub timestamp_interval: u16,
    /// Nominal media clock frequency, in Hz.
    pub base_frequency: u32,
}

impl CrfHeader {
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.crf_type);
        buf.push(0); // reserved
        buf.extend_from_slice(&self.timestamp_interval.to_be_bytes());
        buf.extend_from_slice(&self.base_frequency.to_be_bytes());
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < CRF_HEADER_LEN {
            return Err(WireError::truncated(CRF_HEADER_LEN, data));
        }
        CrfType::from_u8(data[0])?;
        let header = Self {
            crf_type: data[0],
            timestamp_interval: u16::from_be_bytes([data[2], data[3]]),
            base_frequency: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
        };
        header.validate()?;
        Ok(header)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_frequency == 0 {
            return Err(WireError::InvalidValue {
                field: "crf.base_frequency",
                detail: "must be non-zero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let h = CrfHeader {
            crf_type: CrfType::AudioSample as u8,
            timestamp_interval: 6,
            base_frequency: 48_000,
        };
        let mut buf = Vec::new();
        h.encode(&mut buf);
        assert_eq!(buf.len(), CRF_HEADER_LEN);
        assert_eq!(CrfHeader::decode(&buf).unwrap(), h);
    }

    #[test]
    fn zero_base_frequency_rejected() {
        let h = CrfHeader {
            crf_type: CrfType::MachineCycle as u8,
            timestamp_interval: 1,
            base_frequency: 0,
        };
        assert!(h.validate().is_err());
    }
}
