//! Announce message body (spec §4.6, §6).

use super::header::{MessageType, PtpHeader, HEADER_LEN};
use tsn_types::codec::be;
use tsn_types::{ClockIdentity, ClockQuality, Result, Timestamp, WireError};

/// `timeSource` enumeration (subset relevant to gPTP grandmasters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimeSource {
    Atomic = 0x10,
    Gps = 0x20,
    TerrestrialRadio = 0x30,
    Ptp = 0x40,
    Ntp = 0x50,
    HandSet = 0x60,
    Other = 0x90,
    InternalOscillator = 0xA0,
}

impl TimeSource {
    fn from_u8(v: u8) -> Self {
        match v {
            0x10 => Self::Atomic,
            0x20 => Self::Gps,
            0x30 => Self::TerrestrialRadio,
            0x40 => Self::Ptp,
            0x50 => Self::Ntp,
            0x60 => Self::HandSet,
            0xA0 => Self::InternalOscillator,
            _ => Self::Other,
        }
    }
}

/// A decoded Announce message: common header + grandmaster dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnounceMessage {
    pub header: PtpHeader,
    pub origin_timestamp: Timestamp,
    pub current_utc_offset: i16,
    pub grandmaster_priority1: u8,
    pub grandmaster_clock_quality: ClockQuality,
    pub grandmaster_priority2: u8,
    pub grandmaster_identity: ClockIdentity,
    pub steps_removed: u16,
    pub time_source: u8,
}

const BODY_LEN: usize = 10 + 2 + 1 + 1 + 4 + 1 + 8 + 2 + 1;

impl AnnounceMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut header = self.header;
        header.message_type = MessageType::ANNOUNCE;
        header.message_length = (HEADER_LEN + BODY_LEN) as u16;

        let mut buf = Vec::with_capacity(HEADER_LEN + BODY_LEN);
        header.encode(&mut buf);

        self.origin_timestamp.encode(&mut buf);
        buf.extend_from_slice(&self.current_utc_offset.to_be_bytes());
        buf.push(0); // reserved
        buf.push(self.grandmaster_priority1);
        buf.push(self.grandmaster_clock_quality.clock_class);
        buf.push(self.grandmaster_clock_quality.clock_accuracy);
        be::put_u16(
            &mut buf,
            self.grandmaster_clock_quality.offset_scaled_log_variance,
        );
        buf.push(self.grandmaster_priority2);
        buf.extend_from_slice(self.grandmaster_identity.as_bytes());
        be::put_u16(&mut buf, self.steps_removed);
        buf.push(self.time_source);
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = PtpHeader::decode(data)?;
        if header.message_type != MessageType::ANNOUNCE {
            return Err(WireError::UnknownSubtype(header.message_type));
        }
        let body = &data[HEADER_LEN..];
        if body.len() < BODY_LEN {
            return Err(WireError::truncated(HEADER_LEN + BODY_LEN, data));
        }

        let origin_timestamp = Timestamp::decode(body)?;
        let mut off = 10;
        let current_utc_offset = i16::from_be_bytes([body[off], body[off + 1]]);
        off += 2 + 1; // + reserved
        let grandmaster_priority1 = body[off];
        off += 1;
        let clock_class = body[off];
        let clock_accuracy = body[off + 1];
        let offset_scaled_log_variance = be::u16(&body[off + 2..])?;
        off += 4;
        let grandmaster_priority2 = body[off];
        off += 1;
        let mut gm_id = [0u8; 8];
        gm_id.copy_from_slice(&body[off..off + 8]);
        off += 8;
        let steps_removed = be::u16(&body[off..])?;
        off += 2;
        let time_source = body[off];

        Ok(Self {
            header,
            origin_timestamp,
            current_utc_offset,
            grandmaster_priority1,
            grandmaster_clock_quality: ClockQuality::new(
                clock_class,
                clock_accuracy,
                offset_scaled_log_variance,
            ),
            grandmaster_priority2,
            grandmaster_identity: ClockIdentity::from(gm_id),
            steps_removed,
            time_source: TimeSource::from_u8(time_source) as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsn_types::PortIdentity;

    fn sample() -> AnnounceMessage {
        let pi = PortIdentity::new(ClockIdentity([9, 9, 9, 9, 9, 9, 9, 9]), 1);
        AnnounceMessage {
            header: PtpHeader::new(MessageType::ANNOUNCE, pi),
            origin_timestamp: Timestamp::new(1000, 500),
            current_utc_offset: 37,
            grandmaster_priority1: 128,
            grandmaster_clock_quality: ClockQuality::new(6, 0x20, 100),
            grandmaster_priority2: 128,
            grandmaster_identity: ClockIdentity([1, 2, 3, 4, 5, 6, 7, 8]),
            steps_removed: 0,
            time_source: TimeSource::Ptp as u8,
        }
    }

    #[test]
    fn round_trip() {
        let msg = sample();
        let bytes = msg.encode();
        let decoded = AnnounceMessage::decode(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn length_matches_original() {
        let msg = sample();
        let bytes = msg.encode();
        assert_eq!(bytes.len(), HEADER_LEN + BODY_LEN);
    }
}
