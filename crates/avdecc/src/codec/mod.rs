//! Wire codec for IEEE 1722.1 AVDECC frames (spec §4.1, §6): ADP, AECP and
//! ACMP each build on the shared 12-byte [`header::AvdeccHeader`], the same
//! composition the PTP codec uses for its common header.

mod acmp;
mod adp;
mod aecp;
mod header;

pub use acmp::{AcmpFrame, AcmpMessageType, ACMP_SUBTYPE};
pub use adp::ADP_SUBTYPE;
pub use aecp::{AecpPdu, AemCommandCode, AECP_SUBTYPE};
pub use header::{AvdeccHeader, HEADER_LEN, SUPPORTED_VERSION};

use tsn_types::{Result, WireError};

use crate::adp::AdpMessage;

/// Any AVDECC PDU this endpoint understands, dispatched on the leading
/// `subtype` byte the way `gptp::codec::Message` dispatches on
/// `message_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum AvdeccPdu {
    Adp(AdpMessage),
    Aecp(AecpPdu),
    Acmp(AcmpFrame),
}

impl AvdeccPdu {
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(WireError::truncated(HEADER_LEN, data));
        }
        match data[0] {
            ADP_SUBTYPE => Ok(AvdeccPdu::Adp(adp::decode(data)?)),
            AECP_SUBTYPE => Ok(AvdeccPdu::Aecp(AecpPdu::decode(data)?)),
            ACMP_SUBTYPE => Ok(AvdeccPdu::Acmp(AcmpFrame::decode(data)?)),
            other => Err(WireError::UnknownSubtype(other)),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            AvdeccPdu::Adp(m) => adp::encode(m),
            AvdeccPdu::Aecp(m) => m.encode(),
            AvdeccPdu::Acmp(m) => m.encode(),
        }
    }
}
