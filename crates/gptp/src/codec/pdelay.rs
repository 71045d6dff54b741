//! PDelay_Req, PDelay_Resp and PDelay_Resp_Follow_Up message bodies
//! (spec §4.4, §6).

use super::header::{MessageType, PtpHeader, HEADER_LEN};
use tsn_types::{ClockIdentity, PortIdentity, Result, Timestamp, WireError};

const REQ_BODY_LEN: usize = 20; // originTimestamp(10) + reserved(10)
const RESP_BODY_LEN: usize = 20; // requestReceiptTimestamp(10) + requestingPortIdentity(10)

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PDelayReqMessage {
    pub header: PtpHeader,
}

impl PDelayReqMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut header = self.header;
        header.message_type = MessageType::PDELAY_REQ;
        header.message_length = (HEADER_LEN + REQ_BODY_LEN) as u16;
        let mut buf = Vec::with_capacity(HEADER_LEN + REQ_BODY_LEN);
        header.encode(&mut buf);
        buf.extend_from_slice(&[0u8; REQ_BODY_LEN]); // origin timestamp unused in P2P, reserved
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = PtpHeader::decode(data)?;
        if header.message_type != MessageType::PDELAY_REQ {
            return Err(WireError::UnknownSubtype(header.message_type));
        }
        if data.len() < HEADER_LEN + REQ_BODY_LEN {
            return Err(WireError::truncated(HEADER_LEN + REQ_BODY_LEN, data));
        }
        Ok(Self { header })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PDelayRespMessage {
    pub header: PtpHeader,
    pub request_receipt_timestamp: Timestamp,
    pub requesting_port_identity: PortIdentity,
}

impl PDelayRespMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut header = self.header;
        header.message_type = MessageType::PDELAY_RESP;
        header.message_length = (HEADER_LEN + RESP_BODY_LEN) as u16;
        let mut buf = Vec::with_capacity(HEADER_LEN + RESP_BODY_LEN);
        header.encode(&mut buf);
        self.request_receipt_timestamp.encode(&mut buf);
        buf.extend_from_slice(self.requesting_port_identity.clock_identity.as_bytes());
        buf.extend_from_slice(&self.requesting_port_identity.port_number.to_be_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = PtpHeader::decode(data)?;
        if header.message_type != MessageType::PDELAY_RESP {
            return Err(WireError::UnknownSubtype(header.message_type));
        }
        let body = &data[HEADER_LEN..];
        if body.len() < RESP_BODY_LEN {
            return Err(WireError::truncated(HEADER_LEN + RESP_BODY_LEN, data));
        }
        let request_receipt_timestamp = Timestamp::decode(body)?;
        let mut clock_id = [0u8; 8];
        clock_id.copy_from_slice(&body[10..18]);
        let port_number = u16::from_be_bytes([body[18], body[19]]);
        Ok(Self {
            header,
            request_receipt_timestamp,
            requesting_port_identity: PortIdentity::new(ClockIdentity::from(clock_id), port_number),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PDelayRespFollowUpMessage {
    pub header: PtpHeader,
    pub response_origin_timestamp: Timestamp,
    pub requesting_port_identity: PortIdentity,
}

impl PDelayRespFollowUpMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut header = self.header;
        header.message_type = MessageType::PDELAY_RESP_FOLLOW_UP;
        header.message_length = (HEADER_LEN + RESP_BODY_LEN) as u16;
        let mut buf = Vec::with_capacity(HEADER_LEN + RESP_BODY_LEN);
        header.encode(&mut buf);
        self.response_origin_timestamp.encode(&mut buf);
        buf.extend_from_slice(self.requesting_port_identity.clock_identity.as_bytes());
        buf.extend_from_slice(&self.requesting_port_identity.port_number.to_be_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = PtpHeader::decode(data)?;
        if header.message_type != MessageType::PDELAY_RESP_FOLLOW_UP {
            return Err(WireError::UnknownSubtype(header.message_type));
        }
        let body = &data[HEADER_LEN..];
        if body.len() < RESP_BODY_LEN {
            return Err(WireError::truncated(HEADER_LEN + RESP_BODY_LEN, data));
        }
        let response_origin_timestamp = Timestamp::decode(body)?;
        let mut clock_id = [0u8; 8];
        clock_id.copy_from_slice(&body[10..18]);
        let port_number = u16::from_be_bytes([body[18], body[19]]);
        Ok(Self {
            header,
            response_origin_timestamp,
            requesting_port_identity: PortIdentity::new(ClockIdentity::from(clock_id), port_number),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pi(n: u8) -> PortIdentity {
        PortIdentity::new(ClockIdentity([n; 8]), n as u16)
    }

    #[test]
    fn pdelay_req_round_trip() {
        let msg = PDelayReqMessage {
            header: PtpHeader::new(MessageType::PDELAY_REQ, pi(1)),
        };
        let bytes = msg.encode();
        assert_eq!(PDelayReqMessage::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn pdelay_resp_round_trip() {
        let msg = PDelayRespMessage {
            header: PtpHeader::new(MessageType::PDELAY_RESP, pi(1)),
            request_receipt_timestamp: Timestamp::new(1, 2),
            requesting_port_identity: pi(2),
        };
        let bytes = msg.encode();
        assert_eq!(PDelayRespMessage::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn pdelay_resp_follow_up_round_trip() {
        let msg = PDelayRespFollowUpMessage {
            header: PtpHeader::new(MessageType::PDELAY_RESP_FOLLOW_UP, pi(1)),
            response_origin_timestamp: Timestamp::new(3, 4),
            requesting_port_identity: pi(3),
        };
        let bytes = msg.encode();
        assert_eq!(PDelayRespFollowUpMessage::decode(&bytes).unwrap(), msg);
    }
}
