//! CVF (video) subtype-specific header (spec §4.7).

use tsn_types::{Result, WireError};

/// `format_subtype` values (the compression/container carried).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CvfFormatSubtype {
    Mjpeg = 0,
    H264 = 1,
    Jpeg2000 = 2,
}

impl CvfFormatSubtype {
    fn from_u8(v: u8) -> Result<Self> {
        Ok(match v {
            0 => Self::Mjpeg,
            1 => Self::H264,
            2 => Self::Jpeg2000,
            other => {
                return Err(WireError::InvalidValue {
                    field: "cvf.format_subtype",
                    detail: format!("unknown format_subtype {other}"),
                })
            }
        })
    }
}

pub const CVF_HEADER_LEN: usize = 12;

/// The 12-byte CVF format-specific header (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvfHeader {
    pub format: u8,
    pub format_subtype: u8,
    pub width: u16,
    pub height: u16,
    pub frame_rate: u8,
    pub interlaced: bool,
}

impl CvfHeader {
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.format);
        buf.push(self.format_subtype);
        buf.extend_from_slice(&[0u8; 2]); // reserved
        buf.extend_from_slice(&self.width.to_be_bytes());
        buf.extend_from_slice(&self.height.to_be_bytes());
        buf.push(self.frame_rate);
        buf.push(self.interlaced as u8);
        buf.extend_from_slice(&[0u8; 2]); // reserved
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < CVF_HEADER_LEN {
            return Err(WireError::truncated(CVF_HEADER_LEN, data));
        }
        CvfFormatSubtype::from_u8(data[1])?;
        let header = Self {
            format: data[0],
            format_subtype: data[1],
            width: u16::from_be_bytes([data[4], data[5]]),
            height: u16::from_be_bytes([data[6], data[7]]),
            frame_rate: data[8],
            interlaced: data[9] != 0,
        };
        header.validate()?;
        Ok(header)
    }

    /// Invariant (spec §4.7): non-zero picture dimensions.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(WireError::InvalidValue {
                field: "cvf.dimensions",
                detail: format!("{}x{} has a zero dimension", self.width, self.height),
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
        let h = CvfHeader {
            format: 0,
            format_subtype: CvfFormatSubtype::H264 as u8,
            width: 1920,
            height: 1080,
            frame_rate: 30,
            interlaced: false,
        };
        let mut buf = Vec::new();
        h.encode(&mut buf);
        assert_eq!(buf.len(), CVF_HEADER_LEN);
        assert_eq!(CvfHeader::decode(&buf).unwrap(), h);
    }

    #[test]
    fn zero_dimension_rejected() {
        let h = CvfHeader {
            format: 0,
            format_subtype: CvfFormatSubtype::Mjpeg as u8,
            width: 0,
            height: 1080,
            frame_rate: 30,
            interlaced: false,
        };
        assert!(h.validate().is_err());
    }
}
