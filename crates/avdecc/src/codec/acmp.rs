//! ACMP wire codec (spec §4.1, §4.9, §6): the nine-way handshake's message
//! types, each carrying the full talker/listener/controller identity
//! triple plus the stream parameters a successful CONNECT hands back.

use tsn_types::codec::be;
use tsn_types::{ClockIdentity, MacAddress, Result, WireError};

use super::header::{AvdeccHeader, HEADER_LEN};
use crate::acmp::AcmpStatus;

pub const ACMP_SUBTYPE: u8 = tsn_types::avdecc_subtype::ACMP;

/// ACMP `message_type` values (spec §4.9): the nine-way handshake plus the
/// query commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AcmpMessageType {
    ConnectTxCommand = 0,
    ConnectTxResponse = 1,
    DisconnectTxCommand = 2,
    DisconnectTxResponse = 3,
    GetTxStateCommand = 4,
    GetTxStateResponse = 5,
    ConnectRxCommand = 6,
    ConnectRxResponse = 7,
    DisconnectRxCommand = 8,
    DisconnectRxResponse = 9,
    GetRxStateCommand = 10,
    GetRxStateResponse = 11,
    GetTxConnectionCommand = 12,
    GetTxConnectionResponse = 13,
}

impl AcmpMessageType {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::ConnectTxCommand,
            1 => Self::ConnectTxResponse,
            2 => Self::DisconnectTxCommand,
            3 => Self::DisconnectTxResponse,
            4 => Self::GetTxStateCommand,
            5 => Self::GetTxStateResponse,
            6 => Self::ConnectRxCommand,
            7 => Self::ConnectRxResponse,
            8 => Self::DisconnectRxCommand,
            9 => Self::DisconnectRxResponse,
            10 => Self::GetRxStateCommand,
            11 => Self::GetRxStateResponse,
            12 => Self::GetTxConnectionCommand,
            13 => Self::GetTxConnectionResponse,
            other => return Err(WireError::UnknownSubtype(other)),
        })
    }
}

fn status_to_u8(status: AcmpStatus) -> u8 {
    match status {
        AcmpStatus::Success => 0,
        AcmpStatus::ListenerUnknownId => 1,
        AcmpStatus::TalkerUnknownId => 2,
        AcmpStatus::TalkerNoBandwidth => 3,
        AcmpStatus::ListenerExclusive => 4,
        AcmpStatus::NoResources => 5,
    }
}

fn status_from_u8(value: u8) -> AcmpStatus {
    match value {
        0 => AcmpStatus::Success,
        1 => AcmpStatus::ListenerUnknownId,
        2 => AcmpStatus::TalkerUnknownId,
        3 => AcmpStatus::TalkerNoBandwidth,
        4 => AcmpStatus::ListenerExclusive,
        _ => AcmpStatus::NoResources,
    }
}

/// Body length following the common 12-byte header: stream_id(8) +
/// talker_entity_id(8) + listener_entity_id(8) + talker_unique_id(2) +
/// listener_unique_id(2) + dest_mac(6) + connection_count(2) +
/// sequence_id(2) + flags(2) + vlan_id(2).
pub const BODY_LEN: usize = 8 + 8 + 8 + 2 + 2 + 6 + 2 + 2 + 2 + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcmpFrame {
    pub message_type: AcmpMessageType,
    pub status: AcmpStatus,
    pub controller_entity_id: ClockIdentity,
    pub stream_id: u64,
    pub talker_entity_id: ClockIdentity,
    pub listener_entity_id: ClockIdentity,
    pub talker_unique_id: u16,
    pub listener_unique_id: u16,
    pub dest_mac: MacAddress,
    pub connection_count: u16,
    pub sequence_id: u16,
    pub flags: u16,
    pub vlan_id: u16,
}

impl AcmpFrame {
    pub fn encode(&self) -> Vec<u8> {
        let header = AvdeccHeader {
            status: status_to_u8(self.status),
            control_data_length: BODY_LEN as u16,
            ..AvdeccHeader::new(ACMP_SUBTYPE, self.message_type as u8, self.controller_entity_id)
        };
        let mut buf = Vec::with_capacity(HEADER_LEN + BODY_LEN);
        header.encode(&mut buf);
        be::put_u64(&mut buf, self.stream_id);
        buf.extend_from_slice(self.talker_entity_id.as_bytes());
        buf.extend_from_slice(self.listener_entity_id.as_bytes());
        be::put_u16(&mut buf, self.talker_unique_id);
        be::put_u16(&mut buf, self.listener_unique_id);
        buf.extend_from_slice(&self.dest_mac.0);
        be::put_u16(&mut buf, self.connection_count);
        be::put_u16(&mut buf, self.sequence_id);
        be::put_u16(&mut buf, self.flags);
        be::put_u16(&mut buf, self.vlan_id);
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = AvdeccHeader::decode(data)?;
        if header.subtype != ACMP_SUBTYPE {
            return Err(WireError::UnknownSubtype(header.subtype));
        }
        let body = &data[HEADER_LEN..];
        if body.len() < BODY_LEN {
            return Err(WireError::truncated(HEADER_LEN + BODY_LEN, data));
        }

        let stream_id = be::u64(body)?;
        let mut talker = [0u8; 8];
        talker.copy_from_slice(&body[8..16]);
        let mut listener = [0u8; 8];
        listener.copy_from_slice(&body[16..24]);
        let talker_unique_id = be::u16(&body[24..])?;
        let listener_unique_id = be::u16(&body[26..])?;
        let mut dest_mac = [0u8; 6];
        dest_mac.copy_from_slice(&body[28..34]);
        let connection_count = be::u16(&body[34..])?;
        let sequence_id = be::u16(&body[36..])?;
        let flags = be::u16(&body[38..])?;
        let vlan_id = be::u16(&body[40..])?;

        Ok(Self {
            message_type: AcmpMessageType::from_u8(header.message_type)?,
            status: status_from_u8(header.status),
            controller_entity_id: header.entity_id,
            stream_id,
            talker_entity_id: ClockIdentity::from(talker),
            listener_entity_id: ClockIdentity::from(listener),
            talker_unique_id,
            listener_unique_id,
            dest_mac: MacAddress(dest_mac),
            connection_count,
            sequence_id,
            flags,
            vlan_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AcmpFrame {
        AcmpFrame {
            message_type: AcmpMessageType::ConnectRxCommand,
            status: AcmpStatus::Success,
            controller_entity_id: ClockIdentity([1; 8]),
            stream_id: 0x1122_3344_5566_7788,
            talker_entity_id: ClockIdentity([2; 8]),
            listener_entity_id: ClockIdentity([3; 8]),
            talker_unique_id: 0,
            listener_unique_id: 0,
            dest_mac: MacAddress::AVDECC_MULTICAST,
            connection_count: 1,
            sequence_id: 5,
            flags: 0,
            vlan_id: 2,
        }
    }

    #[test]
    fn round_trip() {
        let frame = sample();
        let bytes = frame.encode();
        assert_eq!(bytes.len(), HEADER_LEN + BODY_LEN);
        assert_eq!(AcmpFrame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn response_carries_status() {
        let mut frame = sample();
        frame.message_type = AcmpMessageType::ConnectRxResponse;
        frame.status = AcmpStatus::TalkerNoBandwidth;
        let bytes = frame.encode();
        let decoded = AcmpFrame::decode(&bytes).unwrap();
        assert_eq!(decoded.status, AcmpStatus::TalkerNoBandwidth);
    }

    #[test]
    fn unknown_message_type_rejected() {
        let mut bytes = sample().encode();
        bytes[1] = (bytes[1] & 0xE0) | 0x1F; // message_type = 31, unused
        assert!(matches!(AcmpFrame::decode(&bytes), Err(WireError::UnknownSubtype(_))));
    }
}
