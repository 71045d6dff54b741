//! Tagged-union AVTP packet dispatch (spec §9, "Deep inheritance"): a flat
//! `AvtpPacket` enum with a serializer per variant replaces the
//! virtual-dispatch `AVTPDU` base / subclass hierarchy of the source
//! implementation.

use tsn_types::{Result, WireError};

use crate::aaf::{AafHeader, AAF_HEADER_LEN};
use crate::crf::{CrfHeader, CRF_HEADER_LEN};
use crate::cvf::{CvfHeader, CVF_HEADER_LEN};
use crate::header::{AvtpHeader, Subtype, HEADER_LEN};

/// Standard Ethernet MTU; payload budgeting uses this unless a jumbo-frame
/// deployment overrides it (spec §4.7).
pub const DEFAULT_MTU: usize = 1500;
/// Ethernet II header: 2x MAC + EtherType.
const ETHERNET_HEADER_LEN: usize = 14;

/// One framed AVTP packet: common header, subtype-specific header, and
/// opaque media payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AvtpPacket {
    Aaf {
        header: AvtpHeader,
        aaf: AafHeader,
        payload: Vec<u8>,
    },
    Cvf {
        header: AvtpHeader,
        cvf: CvfHeader,
        payload: Vec<u8>,
    },
    Crf {
        header: AvtpHeader,
        crf: CrfHeader,
        payload: Vec<u8>,
    },
}

impl AvtpPacket {
    pub fn header(&self) -> &AvtpHeader {
        match self {
            Self::Aaf { header, .. } | Self::Cvf { header, .. } | Self::Crf { header, .. } => header,
        }
    }

    fn subtype_header_len(&self) -> usize {
        match self {
            Self::Aaf { .. } => AAF_HEADER_LEN,
            Self::Cvf { .. } => CVF_HEADER_LEN,
            Self::Crf { .. } => CRF_HEADER_LEN,
        }
    }

    /// Max payload for this packet given `mtu` (spec §4.7): MTU minus the
    /// Ethernet header, the common AVTP header, and the subtype-specific
    /// header.
    pub fn max_payload_len(&self, mtu: usize) -> usize {
        mtu.saturating_sub(ETHERNET_HEADER_LEN + HEADER_LEN + self.subtype_header_len())
    }

    pub fn validate(&self, mtu: usize) -> Result<()> {
        self.header().validate()?;
        let payload = match self {
            Self::Aaf { aaf, payload, .. } => {
                aaf.validate()?;
                payload
            }
            Self::Cvf { cvf, payload, .. } => {
                cvf.validate()?;
                payload
            }
            Self::Crf { crf, payload, .. } => {
                crf.validate()?;
                payload
            }
        };
        let max = self.max_payload_len(mtu);
        if payload.len() > max {
            return Err(WireError::InvalidValue {
                field: "payload",
                detail: format!("{} bytes exceeds max {max} for MTU {mtu}", payload.len()),
            });
        }
        Ok(())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::Aaf { header, aaf, payload } => {
                let mut header = *header;
                header.stream_data_length = (self.subtype_header_len() + payload.len()) as u16;
                header.encode(&mut buf);
                aaf.encode(&mut buf);
                buf.extend_from_slice(payload);
            }
            Self::Cvf { header, cvf, payload } => {
                let mut header = *header;
                header.stream_data_length = (self.subtype_header_len() + payload.len()) as u16;
                header.encode(&mut buf);
                cvf.encode(&mut buf);
                buf.extend_from_slice(payload);
            }
            Self::Crf { header, crf, payload } => {
                let mut header = *header;
                header.stream_data_length = (self.subtype_header_len() + payload.len()) as u16;
                header.encode(&mut buf);
                crf.encode(&mut buf);
                buf.extend_from_slice(payload);
            }
        }
        buf
    }

    /// Dispatch on `subtype` to the matching decoder (spec §9: `match`
    /// replaces the vtable).
    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = AvtpHeader::decode(data)?;
        let body = &data[HEADER_LEN..];
        match header.subtype {
            Subtype::AAF => {
                let aaf = AafHeader::decode(body)?;
                let payload = body[AAF_HEADER_LEN..].to_vec();
                Ok(Self::Aaf { header, aaf, payload })
            }
            Subtype::CVF => {
                let cvf = CvfHeader::decode(body)?;
                let payload = body[CVF_HEADER_LEN..].to_vec();
                Ok(Self::Cvf { header, cvf, payload })
            }
            Subtype::CRF => {
                let crf = CrfHeader::decode(body)?;
                let payload = body[CRF_HEADER_LEN..].to_vec();
                Ok(Self::Crf { header, crf, payload })
            }
            other => Err(WireError::UnknownSubtype(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aaf::AafFormat;

    fn aaf_packet(payload_len: usize) -> AvtpPacket {
        AvtpPacket::Aaf {
            header: AvtpHeader::new(Subtype::AAF, 0xAABBCCDDEEFF0011),
            aaf: AafHeader {
                format: AafFormat::Int24 as u8,
                nominal_sample_rate_hz: 48_000,
                bit_depth: 24,
                channels: 8,
                samples_per_frame: 6,
            },
            payload: vec![0u8; payload_len],
        }
    }

    #[test]
    fn round_trip() {
        let packet = aaf_packet(144);
        let bytes = packet.encode();
        let decoded = AvtpPacket::decode(&bytes).unwrap();
        assert_eq!(packet, decoded);
    }

    #[test]
    fn payload_beyond_mtu_rejected() {
        let packet = aaf_packet(DEFAULT_MTU);
        assert!(packet.validate(DEFAULT_MTU).is_err());
    }

    #[test]
    fn payload_within_mtu_accepted() {
        let packet = aaf_packet(100);
        assert!(packet.validate(DEFAULT_MTU).is_ok());
    }

    #[test]
    fn unknown_subtype_rejected() {
        let packet = aaf_packet(8);
        let mut bytes = packet.encode();
        bytes[0] = 0x7F;
        assert!(matches!(AvtpPacket::decode(&bytes), Err(WireError::UnknownSubtype(0x7F))));
    }
}
