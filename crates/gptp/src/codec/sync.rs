//! Sync and Follow_Up message bodies (spec §4.5, §6).

use super::header::{MessageType, PtpHeader, HEADER_LEN};
use tsn_types::{Result, Timestamp, WireError};

const BODY_LEN: usize = 10;

/// A Sync message. In two-step mode (the default) `origin_timestamp` is
/// approximate; the precise value arrives in the paired [`FollowUpMessage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncMessage {
    pub header: PtpHeader,
    pub origin_timestamp: Timestamp,
}

impl SyncMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut header = self.header;
        header.message_type = MessageType::SYNC;
        header.message_length = (HEADER_LEN + BODY_LEN) as u16;
        let mut buf = Vec::with_capacity(HEADER_LEN + BODY_LEN);
        header.encode(&mut buf);
        self.origin_timestamp.encode(&mut buf);
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = PtpHeader::decode(data)?;
        if header.message_type != MessageType::SYNC {
            return Err(WireError::UnknownSubtype(header.message_type));
        }
        let body = &data[HEADER_LEN..];
        if body.len() < BODY_LEN {
            return Err(WireError::truncated(HEADER_LEN + BODY_LEN, data));
        }
        Ok(Self {
            header,
            origin_timestamp: Timestamp::decode(body)?,
        })
    }
}

/// A Follow_Up message carrying the precise origin timestamp for the Sync
/// of the same `sequence_id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowUpMessage {
    pub header: PtpHeader,
    pub precise_origin_timestamp: Timestamp,
}

impl FollowUpMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut header = self.header;
        header.message_type = MessageType::FOLLOW_UP;
        header.message_length = (HEADER_LEN + BODY_LEN) as u16;
        let mut buf = Vec::with_capacity(HEADER_LEN + BODY_LEN);
        header.encode(&mut buf);
        self.precise_origin_timestamp.encode(&mut buf);
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = PtpHeader::decode(data)?;
        if header.message_type != MessageType::FOLLOW_UP {
            return Err(WireError::UnknownSubtype(header.message_type));
        }
        let body = &data[HEADER_LEN..];
        if body.len() < BODY_LEN {
            return Err(WireError::truncated(HEADER_LEN + BODY_LEN, data));
        }
        Ok(Self {
            header,
            precise_origin_timestamp: Timestamp::decode(body)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsn_types::{ClockIdentity, PortIdentity};

    fn pi() -> PortIdentity {
        PortIdentity::new(ClockIdentity([1, 1, 1, 1, 1, 1, 1, 1]), 1)
    }

    #[test]
    fn sync_round_trip() {
        let msg = SyncMessage {
            header: PtpHeader::new(MessageType::SYNC, pi()),
            origin_timestamp: Timestamp::new(5, 6),
        };
        let bytes = msg.encode();
        assert_eq!(SyncMessage::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn follow_up_round_trip() {
        let msg = FollowUpMessage {
            header: PtpHeader::new(MessageType::FOLLOW_UP, pi()),
            precise_origin_timestamp: Timestamp::new(5, 7),
        };
        let bytes = msg.encode();
        assert_eq!(FollowUpMessage::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn follow_up_rejects_sync_bytes() {
        let sync = SyncMessage {
            header: PtpHeader::new(MessageType::SYNC, pi()),
            origin_timestamp: Timestamp::ZERO,
        };
        let bytes = sync.encode();
        assert!(FollowUpMessage::decode(&bytes).is_err());
    }
}
