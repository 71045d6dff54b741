//! Common AVTP stream header shared by every subtype-specific body (spec
//! §4.7, §6). Mirrors the approach in `gptp::codec::header`: a zerocopy
//! fixed-layout struct for the parts that line up cleanly, with the
//! `subtype`-dependent tail handled by the caller.

use tsn_types::{Result, WireError};
use zerocopy::byteorder::big_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// `subtype` byte values this workspace understands (spec §4.7, §6).
pub struct Subtype;
impl Subtype {
    pub const AAF: u8 = 0x02;
    pub const CVF: u8 = 0x03;
    pub const CRF: u8 = 0x04;
}

/// `flagField`-equivalent bits packed into the second header byte.
pub mod flags {
    pub const STREAM_VALID: u8 = 1 << 7;
    pub const MEDIA_CLOCK_RESTART: u8 = 1 << 3;
    pub const GATEWAY_VALID: u8 = 1 << 2;
    pub const TIMESTAMP_VALID: u8 = 1 << 0;
}

/// Only AVTP version 0 exists.
pub const SUPPORTED_VERSION: u8 = 0;

/// Size of the fixed-layout portion: subtype, flags/version byte,
/// sequence_num, the timestamp-uncertain byte, stream_id, avtp_timestamp,
/// stream_data_length and format_specific_data — the exact field list spec
/// §3 gives for the AVTPDU common header, which totals 20 bytes
/// (1+1+1+1+8+4+2+2), not the rounded "16-byte" figure used elsewhere in
/// prose. Real IEEE 1722 keeps the common stream header at 12 bytes
/// (subtype/flags/sequence_num/reserved/stream_id) and folds
/// avtp_timestamp/stream_data_length/format_specific_data into each
/// subtype's own header instead; this workspace hoists those three fields
/// up into one shared struct because AAF, CVF and CRF all lay them out
/// identically, and builds each subtype's extra fields
/// (`AAF_HEADER_LEN`/`CVF_HEADER_LEN`/`CRF_HEADER_LEN`) on top of it.
pub const HEADER_LEN: usize = 20;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct RawHeader {
    subtype: u8,
    flags_version: u8,
    sequence_num: u8,
    tu: u8,
    stream_id: U64,
    avtp_timestamp: U32,
    stream_data_length: U16,
    format_specific_data: U16,
}

/// Decoded common AVTP header (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvtpHeader {
    pub subtype: u8,
    pub stream_valid: bool,
    pub version: u8,
    pub media_clock_restart: bool,
    pub gateway_valid: bool,
    pub timestamp_valid: bool,
    pub sequence_num: u8,
    pub timestamp_uncertain: bool,
    pub stream_id: u64,
    pub avtp_timestamp: u32,
    pub stream_data_length: u16,
    /// Meaning is subtype-specific: AAF packs format/nominal rate/channels/
    /// bit depth here (see [`crate::aaf`]); CVF and CRF use it differently.
    pub format_specific_data: u16,
}

impl AvtpHeader {
    pub fn new(subtype: u8, stream_id: u64) -> Self {
        Self {
            subtype,
            stream_valid: stream_id != 0,
            version: SUPPORTED_VERSION,
            media_clock_restart: false,
            gateway_valid: false,
            timestamp_valid: true,
            sequence_num: 0,
            timestamp_uncertain: false,
            stream_id,
            avtp_timestamp: 0,
            stream_data_length: 0,
            format_specific_data: 0,
        }
    }

    /// Invariant (spec §4.7): `stream_valid` implies a non-zero stream_id.
    pub fn validate(&self) -> Result<()> {
        if self.stream_valid && self.stream_id == 0 {
            return Err(WireError::InvalidValue {
                field: "stream_id",
                detail: "stream_valid set with stream_id == 0".into(),
            });
        }
        if self.version != SUPPORTED_VERSION {
            return Err(WireError::UnsupportedVersion(self.version));
        }
        Ok(())
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        let mut flags_version = (self.version & 0x07) << 4;
        if self.stream_valid {
            flags_version |= flags::STREAM_VALID;
        }
        if self.media_clock_restart {
            flags_version |= flags::MEDIA_CLOCK_RESTART;
        }
        if self.gateway_valid {
            flags_version |= flags::GATEWAY_VALID;
        }
        if self.timestamp_valid {
            flags_version |= flags::TIMESTAMP_VALID;
        }

        let raw = RawHeader {
            subtype: self.subtype,
            flags_version,
            sequence_num: self.sequence_num,
            tu: self.timestamp_uncertain as u8,
            stream_id: self.stream_id.into(),
            avtp_timestamp: self.avtp_timestamp.into(),
            stream_data_length: self.stream_data_length.into(),
            format_specific_data: self.format_specific_data.into(),
        };
        buf.extend_from_slice(raw.as_bytes());
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(WireError::truncated(HEADER_LEN, data));
        }
        let (raw, _) = RawHeader::ref_from_prefix(data)
            .map_err(|_| WireError::truncated(HEADER_LEN, data))?;

        let header = Self {
            subtype: raw.subtype,
            stream_valid: raw.flags_version & flags::STREAM_VALID != 0,
            version: (raw.flags_version >> 4) & 0x07,
            media_clock_restart: raw.flags_version & flags::MEDIA_CLOCK_RESTART != 0,
            gateway_valid: raw.flags_version & flags::GATEWAY_VALID != 0,
            timestamp_valid: raw.flags_version & flags::TIMESTAMP_VALID != 0,
            sequence_num: raw.sequence_num,
            timestamp_uncertain: raw.tu & 0x01 != 0,
            stream_id: raw.stream_id.get(),
            avtp_timestamp: raw.avtp_timestamp.get(),
            stream_data_length: raw.stream_data_length.get(),
            format_specific_data: raw.format_specific_data.get(),
        };
        header.validate()?;
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let mut h = AvtpHeader::new(Subtype::AAF, 0x1122334455667788);
        h.sequence_num = 7;
        h.avtp_timestamp = 0xDEADBEEF;
        h.stream_data_length = 192;
        h.format_specific_data = 0x1234;
        let mut buf = Vec::new();
        h.encode(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);
        assert_eq!(AvtpHeader::decode(&buf).unwrap(), h);
    }

    #[test]
    fn stream_valid_requires_nonzero_stream_id() {
        let mut h = AvtpHeader::new(Subtype::AAF, 1);
        h.stream_id = 0;
        h.stream_valid = true;
        assert!(h.validate().is_err());
    }

    #[test]
    fn unsupported_version_rejected() {
        let h = AvtpHeader::new(Subtype::AAF, 1);
        let mut buf = Vec::new();
        h.encode(&mut buf);
        buf[1] = (buf[1] & 0x8F) | (1 << 4); // version = 1
        assert!(matches!(AvtpHeader::decode(&buf), Err(WireError::UnsupportedVersion(1))));
    }
}
