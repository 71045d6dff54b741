//! Wire codec for PTP (IEEE 802.1AS) messages (spec §4.1).
//!
//! A decoded frame is represented as a tagged-union [`Message`] rather than
//! the virtual-dispatch message hierarchy of the source implementation
//! (spec §9, "Deep inheritance"): the common header is a plain struct
//! composed into every variant, and dispatch is a `match` on `message_type`
//! instead of a vtable call.

mod announce;
mod header;
mod pdelay;
mod sync;

pub use announce::{AnnounceMessage, TimeSource};
pub use header::{flags, MessageType, PtpHeader, HEADER_LEN, SUPPORTED_VERSION};
pub use pdelay::{PDelayReqMessage, PDelayRespFollowUpMessage, PDelayRespMessage};
pub use sync::{FollowUpMessage, SyncMessage};

use tsn_types::{Result, WireError};

/// Any PTP message this endpoint understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Sync(SyncMessage),
    FollowUp(FollowUpMessage),
    Announce(AnnounceMessage),
    PDelayReq(PDelayReqMessage),
    PDelayResp(PDelayRespMessage),
    PDelayRespFollowUp(PDelayRespFollowUpMessage),
}

impl Message {
    /// Peek the header to find the message type, then dispatch to the
    /// matching decoder. No partial decoding: either a complete, valid
    /// frame comes back or a [`WireError`].
    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = PtpHeader::decode(data)?;
        match header.message_type {
            MessageType::SYNC => Ok(Message::Sync(SyncMessage::decode(data)?)),
            MessageType::FOLLOW_UP => Ok(Message::FollowUp(FollowUpMessage::decode(data)?)),
            MessageType::ANNOUNCE => Ok(Message::Announce(AnnounceMessage::decode(data)?)),
            MessageType::PDELAY_REQ => Ok(Message::PDelayReq(PDelayReqMessage::decode(data)?)),
            MessageType::PDELAY_RESP => Ok(Message::PDelayResp(PDelayRespMessage::decode(data)?)),
            MessageType::PDELAY_RESP_FOLLOW_UP => Ok(Message::PDelayRespFollowUp(
                PDelayRespFollowUpMessage::decode(data)?,
            )),
            other => Err(WireError::UnknownSubtype(other)),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::Sync(m) => m.encode(),
            Message::FollowUp(m) => m.encode(),
            Message::Announce(m) => m.encode(),
            Message::PDelayReq(m) => m.encode(),
            Message::PDelayResp(m) => m.encode(),
            Message::PDelayRespFollowUp(m) => m.encode(),
        }
    }

    pub fn header(&self) -> &PtpHeader {
        match self {
            Message::Sync(m) => &m.header,
            Message::FollowUp(m) => &m.header,
            Message::Announce(m) => &m.header,
            Message::PDelayReq(m) => &m.header,
            Message::PDelayResp(m) => &m.header,
            Message::PDelayRespFollowUp(m) => &m.header,
        }
    }
}
