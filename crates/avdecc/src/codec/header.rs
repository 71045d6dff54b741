//! Common 12-byte AVDECC PDU header shared by ADP, AECP and ACMP (spec
//! §4.1, §6): `subtype`, `sv`/`version`/`message_type`, a 5-bit `status`
//! packed with the 11-bit `control_data_length`, and an 8-byte identity
//! field (the entity_id for ADP/AECP; ACMP leaves it zero and carries its
//! own stream/entity identifiers in the body).

use tsn_types::codec::be;
use tsn_types::{ClockIdentity, Result, WireError};

pub const HEADER_LEN: usize = 12;

/// Only AVDECC version 0 exists (spec §4.1 policy mirrors AVTP's).
pub const SUPPORTED_VERSION: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvdeccHeader {
    pub subtype: u8,
    pub version: u8,
    /// Meaning is subtype-specific: ADP message type, AECP command/
    /// response discriminant, or ACMP message type (spec §4.9).
    pub message_type: u8,
    /// Meaningful on responses only; zero on commands (spec §4.9, §7).
    pub status: u8,
    pub control_data_length: u16,
    pub entity_id: ClockIdentity,
}

impl AvdeccHeader {
    pub fn new(subtype: u8, message_type: u8, entity_id: ClockIdentity) -> Self {
        Self {
            subtype,
            version: SUPPORTED_VERSION,
            message_type,
            status: 0,
            control_data_length: 0,
            entity_id,
        }
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.subtype);
        buf.push((self.version << 5) | (self.message_type & 0x1F));
        let status_and_length = ((self.status as u16 & 0x1F) << 11) | (self.control_data_length & 0x07FF);
        be::put_u16(buf, status_and_length);
        buf.extend_from_slice(self.entity_id.as_bytes());
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(WireError::truncated(HEADER_LEN, data));
        }
        let subtype = data[0];
        let version = data[1] >> 5;
        if version != SUPPORTED_VERSION {
            return Err(WireError::UnsupportedVersion(version));
        }
        let message_type = data[1] & 0x1F;
        let status_and_length = be::u16(&data[2..])?;
        let status = (status_and_length >> 11) as u8;
        let control_data_length = status_and_length & 0x07FF;
        let mut entity_id = [0u8; 8];
        entity_id.copy_from_slice(&data[4..12]);
        Ok(Self {
            subtype,
            version,
            message_type,
            status,
            control_data_length,
            entity_id: ClockIdentity::from(entity_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let mut h = AvdeccHeader::new(0xFA, 2, ClockIdentity([9; 8]));
        h.status = 0x03;
        h.control_data_length = 1234;
        let mut buf = Vec::new();
        h.encode(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);
        assert_eq!(AvdeccHeader::decode(&buf).unwrap(), h);
    }

    #[test]
    fn rejects_unsupported_version() {
        let h = AvdeccHeader::new(0xFA, 0, ClockIdentity([0; 8]));
        let mut buf = Vec::new();
        h.encode(&mut buf);
        buf[1] |= 1 << 5; // version = 1
        assert!(matches!(AvdeccHeader::decode(&buf), Err(WireError::UnsupportedVersion(1))));
    }
}
