//! Common 34-byte PTP message header (spec §6), shared by every message
//! body in this module.

use tsn_types::codec::be;
use tsn_types::{ClockIdentity, PortIdentity, Result, WireError};
use zerocopy::byteorder::big_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Size of the common header on the wire.
pub const HEADER_LEN: usize = 34;

/// PTP `messageType` nibble values relevant to a gPTP (802.1AS) endpoint.
pub struct MessageType;
impl MessageType {
    pub const SYNC: u8 = 0x0;
    pub const DELAY_REQ: u8 = 0x1;
    pub const PDELAY_REQ: u8 = 0x2;
    pub const PDELAY_RESP: u8 = 0x3;
    pub const FOLLOW_UP: u8 = 0x8;
    pub const DELAY_RESP: u8 = 0x9;
    pub const PDELAY_RESP_FOLLOW_UP: u8 = 0xA;
    pub const ANNOUNCE: u8 = 0xB;
    pub const SIGNALING: u8 = 0xC;
    pub const MANAGEMENT: u8 = 0xD;
}

/// `flagField` bit values (802.1AS only sets a handful of these).
pub mod flags {
    pub const ALTERNATE_MASTER: u16 = 1 << 0;
    pub const TWO_STEP: u16 = 1 << 1;
    pub const UNICAST: u16 = 1 << 2;
    pub const LEAP61: u16 = 1 << 8;
    pub const LEAP59: u16 = 1 << 9;
    pub const CURRENT_UTC_OFFSET_VALID: u16 = 1 << 10;
    pub const PTP_TIMESCALE: u16 = 1 << 11;
    pub const TIME_TRACEABLE: u16 = 1 << 12;
    pub const FREQUENCY_TRACEABLE: u16 = 1 << 13;
}

/// The fixed-layout part of the common header that maps cleanly onto a
/// `repr(C)` struct. `messageType`/`transportSpecific` share a byte and
/// `sourcePortIdentity` is a 10-byte composite, so both are handled outside
/// this struct by [`PtpHeader`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct RawHeaderFixed {
    message_type_transport_specific: u8,
    version_ptp: u8,
    message_length: U16,
    domain_number: u8,
    reserved0: u8,
    flag_field: U16,
    correction_field: U64,
    reserved1: U32,
}

/// Decoded common PTP header (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtpHeader {
    pub transport_specific: u8,
    pub message_type: u8,
    pub version_ptp: u8,
    pub message_length: u16,
    pub domain_number: u8,
    pub flag_field: u16,
    /// Nanosecond correction, already descaled from the 2^16 wire scaling.
    pub correction_field_ns: i64,
    pub source_port_identity: PortIdentity,
    pub sequence_id: u16,
    pub control_field: u8,
    pub log_message_interval: i8,
}

/// Only versionPTP == 2 is accepted (802.1AS uses PTPv2).
pub const SUPPORTED_VERSION: u8 = 2;

impl PtpHeader {
    pub fn new(message_type: u8, source_port_identity: PortIdentity) -> Self {
        Self {
            transport_specific: 1, // 802.1AS transportSpecific nibble
            message_type,
            version_ptp: SUPPORTED_VERSION,
            message_length: HEADER_LEN as u16,
            domain_number: 0,
            flag_field: 0,
            correction_field_ns: 0,
            source_port_identity,
            sequence_id: 0,
            control_field: control_field_for(message_type),
            log_message_interval: 0,
        }
    }

    pub fn two_step(&self) -> bool {
        self.flag_field & flags::TWO_STEP != 0
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        let fixed = RawHeaderFixed {
            message_type_transport_specific: (self.transport_specific << 4)
                | (self.message_type & 0x0F),
            version_ptp: self.version_ptp,
            message_length: self.message_length.into(),
            domain_number: self.domain_number,
            reserved0: 0,
            flag_field: self.flag_field.into(),
            correction_field: scale_correction(self.correction_field_ns).into(),
            reserved1: 0.into(),
        };
        buf.extend_from_slice(fixed.as_bytes());
        buf.extend_from_slice(self.source_port_identity.clock_identity.as_bytes());
        be::put_u16(buf, self.source_port_identity.port_number);
        be::put_u16(buf, self.sequence_id);
        buf.push(self.control_field);
        buf.push(self.log_message_interval as u8);
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(WireError::truncated(HEADER_LEN, data));
        }
        let (fixed, _) = RawHeaderFixed::ref_from_prefix(data)
            .map_err(|_| WireError::truncated(std::mem::size_of::<RawHeaderFixed>(), data))?;

        let version_ptp = fixed.version_ptp;
        if version_ptp != SUPPORTED_VERSION {
            return Err(WireError::UnsupportedVersion(version_ptp));
        }

        let transport_specific = fixed.message_type_transport_specific >> 4;
        let message_type = fixed.message_type_transport_specific & 0x0F;

        let spi_offset = std::mem::size_of::<RawHeaderFixed>();
        let mut clock_id_bytes = [0u8; 8];
        clock_id_bytes.copy_from_slice(&data[spi_offset..spi_offset + 8]);
        let port_number = be::u16(&data[spi_offset + 8..])?;
        let source_port_identity =
            PortIdentity::new(ClockIdentity::from(clock_id_bytes), port_number);

        let seq_offset = spi_offset + 10;
        let sequence_id = be::u16(&data[seq_offset..])?;
        let control_field = data[seq_offset + 2];
        let log_message_interval = data[seq_offset + 3] as i8;

        Ok(Self {
            transport_specific,
            message_type,
            version_ptp,
            message_length: fixed.message_length.get(),
            domain_number: fixed.domain_number,
            flag_field: fixed.flag_field.get(),
            correction_field_ns: descale_correction(fixed.correction_field.get()),
            source_port_identity,
            sequence_id,
            control_field,
            log_message_interval,
        })
    }
}

fn control_field_for(message_type: u8) -> u8 {
    match message_type {
        MessageType::SYNC => 0,
        MessageType::DELAY_REQ => 1,
        MessageType::FOLLOW_UP => 2,
        MessageType::DELAY_RESP => 3,
        MessageType::ANNOUNCE => 5,
        _ => 5,
    }
}

/// correctionField is a 64-bit signed fixed-point value scaled by 2^16
/// nanoseconds per IEEE 1588.
fn scale_correction(ns: i64) -> i64 {
    ns.saturating_mul(1 << 16)
}

fn descale_correction(raw: i64) -> i64 {
    raw >> 16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> PtpHeader {
        let pi = PortIdentity::new(ClockIdentity([1, 2, 3, 4, 5, 6, 7, 8]), 1);
        let mut h = PtpHeader::new(MessageType::SYNC, pi);
        h.sequence_id = 42;
        h.domain_number = 0;
        h.correction_field_ns = 1234;
        h
    }

    #[test]
    fn round_trip() {
        let h = sample_header();
        let mut buf = Vec::new();
        h.encode(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);
        let decoded = PtpHeader::decode(&buf).unwrap();
        assert_eq!(h, decoded);
    }

    #[test]
    fn rejects_unsupported_version() {
        let h = sample_header();
        let mut buf = Vec::new();
        h.encode(&mut buf);
        buf[1] = 1; // versionPTP = 1
        assert!(matches!(
            PtpHeader::decode(&buf),
            Err(WireError::UnsupportedVersion(1))
        ));
    }

    #[test]
    fn truncated_header_rejected() {
        assert!(PtpHeader::decode(&[0u8; 10]).is_err());
    }

    #[test]
    fn message_type_nibble_split() {
        let h = sample_header();
        let mut buf = Vec::new();
        h.encode(&mut buf);
        assert_eq!(buf[0] & 0x0F, MessageType::SYNC);
        assert_eq!(buf[0] >> 4, 1);
    }
}
