//! ADP wire codec (spec §4.1, §4.9, §6): common header plus the
//! entity_model_id / entity_capabilities / available_index / valid_time
//! body.

use std::time::Duration;

use tsn_types::codec::be;
use tsn_types::{ClockIdentity, Result, WireError};

use super::header::{AvdeccHeader, HEADER_LEN};
use crate::adp::{AdpMessage, AdpMessageType};

pub const ADP_SUBTYPE: u8 = tsn_types::avdecc_subtype::ADP;
pub const BODY_LEN: usize = 8 + 4 + 4 + 2;

fn message_type_code(message_type: AdpMessageType) -> u8 {
    message_type as u8
}

fn message_type_from_code(code: u8) -> Result<AdpMessageType> {
    Ok(match code {
        0 => AdpMessageType::EntityAvailable,
        1 => AdpMessageType::EntityDeparting,
        2 => AdpMessageType::EntityDiscover,
        other => return Err(WireError::UnknownSubtype(other)),
    })
}

pub fn encode(message: &AdpMessage) -> Vec<u8> {
    let header = AvdeccHeader {
        control_data_length: BODY_LEN as u16,
        ..AvdeccHeader::new(ADP_SUBTYPE, message_type_code(message.message_type), message.entity_id)
    };
    let mut buf = Vec::with_capacity(HEADER_LEN + BODY_LEN);
    header.encode(&mut buf);
    buf.extend_from_slice(message.entity_model_id.as_bytes());
    be::put_u32(&mut buf, message.entity_capabilities);
    be::put_u32(&mut buf, message.available_index);
    be::put_u16(&mut buf, message.valid_time.as_secs() as u16);
    buf
}

pub fn decode(data: &[u8]) -> Result<AdpMessage> {
    let header = AvdeccHeader::decode(data)?;
    if header.subtype != ADP_SUBTYPE {
        return Err(WireError::UnknownSubtype(header.subtype));
    }
    let body = &data[HEADER_LEN..];
    if body.len() < BODY_LEN {
        return Err(WireError::truncated(HEADER_LEN + BODY_LEN, data));
    }
    let mut entity_model_id = [0u8; 8];
    entity_model_id.copy_from_slice(&body[0..8]);
    let entity_capabilities = be::u32(&body[8..])?;
    let available_index = be::u32(&body[12..])?;
    let valid_time = Duration::from_secs(be::u16(&body[16..])? as u64);

    Ok(AdpMessage {
        message_type: message_type_from_code(header.message_type)?,
        entity_id: header.entity_id,
        entity_model_id: ClockIdentity::from(entity_model_id),
        entity_capabilities,
        available_index,
        valid_time,
    })
}
