//! Milan vendor-unique (MVU) command set, carried inside the AECP
//! vendor-unique envelope (spec §4.10, §6).

use tsn_types::WireError;

use crate::error::Result;

/// Vendor-unique protocol identifier Milan commands are tagged with
/// (spec §6).
pub const MILAN_PROTOCOL_IDENTIFIER: u64 = 0x90E0_F000_FE00;
/// OR'd into `command_type` to mark a response (spec §6).
pub const RESPONSE_BIT: u16 = 0x8000;

/// MVU command codes (spec §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum MvuCommandType {
    GetMilanInfo = 0x0000,
    SetSystemUniqueId = 0x0001,
    GetSystemUniqueId = 0x0002,
    SetMediaClockReferenceInfo = 0x0003,
    GetMediaClockReferenceInfo = 0x0004,
}

impl MvuCommandType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value & !RESPONSE_BIT {
            0x0000 => Some(Self::GetMilanInfo),
            0x0001 => Some(Self::SetSystemUniqueId),
            0x0002 => Some(Self::GetSystemUniqueId),
            0x0003 => Some(Self::SetMediaClockReferenceInfo),
            0x0004 => Some(Self::GetMediaClockReferenceInfo),
            _ => None,
        }
    }
}

/// Milan bitmasks used by the compliance predicate (spec §4.10).
pub const BASELINE_INTEROPERABILITY: u32 = 0x0000_0001;
pub const MILAN_BASELINE: u32 = 0x0000_0001;

/// Fixed slot width for `device_name`/`manufacturer_name` in GET_MILAN_INFO
/// (spec §6: "device/manufacturer/firmware name strings (fixed lengths
/// 64/64/32)"), matching the AVDECC STRINGS descriptor's 64-byte convention.
pub const STRING_FIELD_LEN: usize = 64;

/// Fixed slot width for `firmware_version` in GET_MILAN_INFO (spec §6:
/// fixed lengths "64/64/32" — the firmware string is the narrower slot).
pub const FIRMWARE_FIELD_LEN: usize = 32;

fn encode_string(s: &str, len: usize, buf: &mut Vec<u8>) {
    let mut slot = vec![0u8; len];
    let bytes = s.as_bytes();
    let n = bytes.len().min(len);
    slot[..n].copy_from_slice(&bytes[..n]);
    buf.extend_from_slice(&slot);
}

fn decode_string(data: &[u8], len: usize) -> Result<String> {
    if data.len() < len {
        return Err(WireError::truncated(len, data).into());
    }
    let end = data[..len].iter().position(|&b| b == 0).unwrap_or(len);
    Ok(String::from_utf8_lossy(&data[..end]).into_owned())
}

/// GET_MILAN_INFO response body (spec §4.10).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilanInfo {
    pub version: (u8, u8),
    pub capabilities: u32,
    pub features: u32,
    pub certification_level: u8,
    pub device_name: String,
    pub manufacturer_name: String,
    pub firmware_version: String,
}

impl MilanInfo {
    pub const ENCODED_LEN: usize = 2 + 4 + 4 + 1 + STRING_FIELD_LEN * 2 + FIRMWARE_FIELD_LEN;

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
        buf.push(self.version.0);
        buf.push(self.version.1);
        buf.extend_from_slice(&self.capabilities.to_be_bytes());
        buf.extend_from_slice(&self.features.to_be_bytes());
        buf.push(self.certification_level);
        encode_string(&self.device_name, STRING_FIELD_LEN, &mut buf);
        encode_string(&self.manufacturer_name, STRING_FIELD_LEN, &mut buf);
        encode_string(&self.firmware_version, FIRMWARE_FIELD_LEN, &mut buf);
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::ENCODED_LEN {
            return Err(WireError::truncated(Self::ENCODED_LEN, data).into());
        }
        let version = (data[0], data[1]);
        let capabilities = u32::from_be_bytes(data[2..6].try_into().unwrap());
        let features = u32::from_be_bytes(data[6..10].try_into().unwrap());
        let certification_level = data[10];
        let mut offset = 11;
        let device_name = decode_string(&data[offset..], STRING_FIELD_LEN)?;
        offset += STRING_FIELD_LEN;
        let manufacturer_name = decode_string(&data[offset..], STRING_FIELD_LEN)?;
        offset += STRING_FIELD_LEN;
        let firmware_version = decode_string(&data[offset..], FIRMWARE_FIELD_LEN)?;
        Ok(Self {
            version,
            capabilities,
            features,
            certification_level,
            device_name,
            manufacturer_name,
            firmware_version,
        })
    }

    /// The compliance predicate (spec §4.10): baseline interoperability
    /// capability and feature bits both set, and a non-empty device name.
    pub fn is_milan_compliant(&self) -> bool {
        self.capabilities & BASELINE_INTEROPERABILITY != 0
            && self.features & MILAN_BASELINE != 0
            && self.device_name.as_bytes().first().copied().unwrap_or(0) != 0
    }
}

/// SET/GET_MEDIA_CLOCK_REFERENCE_INFO, keyed by clock-domain descriptor
/// index (spec §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaClockReferenceInfo {
    pub clock_domain_index: u16,
    pub media_clock_reference_priority: u8,
    pub domain_name_index: u16,
}

impl MediaClockReferenceInfo {
    pub const ENCODED_LEN: usize = 2 + 1 + 2;

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
        buf.extend_from_slice(&self.clock_domain_index.to_be_bytes());
        buf.push(self.media_clock_reference_priority);
        buf.extend_from_slice(&self.domain_name_index.to_be_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::ENCODED_LEN {
            return Err(WireError::truncated(Self::ENCODED_LEN, data).into());
        }
        Ok(Self {
            clock_domain_index: u16::from_be_bytes([data[0], data[1]]),
            media_clock_reference_priority: data[2],
            domain_name_index: u16::from_be_bytes([data[3], data[4]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MilanInfo {
        MilanInfo {
            version: (1, 2),
            capabilities: BASELINE_INTEROPERABILITY,
            features: MILAN_BASELINE,
            certification_level: 0,
            device_name: "MyAmp".to_string(),
            manufacturer_name: "Acme".to_string(),
            firmware_version: "1.2.0".to_string(),
        }
    }

    /// Scenario S5 (spec §8): byte-identical round-trip with zero padding
    /// in unused string bytes.
    #[test]
    fn get_milan_info_round_trips() {
        let info = sample();
        let encoded = info.encode();
        assert_eq!(encoded.len(), MilanInfo::ENCODED_LEN);
        let decoded = MilanInfo::decode(&encoded).unwrap();
        assert_eq!(decoded, info);

        let device_name_start = 11;
        let padding = &encoded[device_name_start + info.device_name.len()..device_name_start + STRING_FIELD_LEN];
        assert!(padding.iter().all(|&b| b == 0));

        let firmware_start = device_name_start + STRING_FIELD_LEN * 2;
        let firmware_padding =
            &encoded[firmware_start + info.firmware_version.len()..firmware_start + FIRMWARE_FIELD_LEN];
        assert!(firmware_padding.iter().all(|&b| b == 0));
    }

    #[test]
    fn compliance_predicate_requires_all_three_conditions() {
        assert!(sample().is_milan_compliant());

        let mut missing_capability = sample();
        missing_capability.capabilities = 0;
        assert!(!missing_capability.is_milan_compliant());

        let mut missing_feature = sample();
        missing_feature.features = 0;
        assert!(!missing_feature.is_milan_compliant());

        let mut empty_name = sample();
        empty_name.device_name = String::new();
        assert!(!empty_name.is_milan_compliant());
    }

    #[test]
    fn response_bit_does_not_change_command_identity() {
        let plain = MvuCommandType::GetMilanInfo as u16;
        assert_eq!(MvuCommandType::from_u16(plain | RESPONSE_BIT), Some(MvuCommandType::GetMilanInfo));
    }

    #[test]
    fn media_clock_reference_info_round_trips() {
        let info = MediaClockReferenceInfo {
            clock_domain_index: 3,
            media_clock_reference_priority: 1,
            domain_name_index: 9,
        };
        let encoded = info.encode();
        assert_eq!(encoded.len(), MediaClockReferenceInfo::ENCODED_LEN);
        assert_eq!(MediaClockReferenceInfo::decode(&encoded).unwrap(), info);
    }
}
