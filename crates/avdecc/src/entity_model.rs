//! AVDECC Entity Model: the descriptor tree rooted at ENTITY (spec §4.8).

use std::collections::BTreeMap;

use tsn_types::{ClockIdentity, Result, WireError};

/// Descriptor type codes (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum DescriptorType {
    Entity = 0x0000,
    Configuration = 0x0001,
    AudioUnit = 0x0002,
    StreamInput = 0x0005,
    StreamOutput = 0x0006,
    AvbInterface = 0x0009,
    ClockSource = 0x000A,
    AudioCluster = 0x0014,
    AudioMap = 0x0017,
    ClockDomain = 0x000B,
    Strings = 0x000C,
}

/// A stable reference to one descriptor in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DescriptorRef {
    pub descriptor_type: DescriptorType,
    pub descriptor_index: u16,
}

/// Index of a string within a STRINGS descriptor, as referenced from other
/// descriptors (spec §4.8: "Strings live in STRINGS descriptors referenced
/// by 16-bit indices").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringRef {
    pub strings_descriptor_index: u16,
    pub string_index: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    pub entity_id: ClockIdentity,
    pub entity_model_id: ClockIdentity,
    pub entity_capabilities: u32,
    pub talker_stream_sources: u16,
    pub listener_stream_sinks: u16,
    pub controller_capabilities: u32,
    /// Monotonically increments on every state-observable change (spec
    /// §4.8 identity invariant).
    pub available_index: u32,
    pub entity_name: StringRef,
    pub firmware_version: StringRef,
    pub current_configuration: u16,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigurationDescriptor {
    pub object_name: Option<StringRef>,
    /// Number of descriptors of each type present under this configuration.
    pub descriptor_counts: BTreeMap<DescriptorType, u16>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInputDescriptor {
    pub stream_id: u64,
    pub clock_domain_index: u16,
    pub avb_interface_index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamOutputDescriptor {
    pub stream_id: u64,
    pub clock_domain_index: u16,
    pub avb_interface_index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvbInterfaceDescriptor {
    pub mac_address: tsn_types::MacAddress,
    pub clock_identity: ClockIdentity,
    pub port_number: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ClockSourceType {
    Internal = 0,
    External = 1,
    InputStream = 2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSourceDescriptor {
    pub clock_source_type: ClockSourceType,
    pub clock_source_location: DescriptorRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClockDomainDescriptor {
    pub clock_source_index: u16,
    pub clock_sources: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioUnitDescriptor {
    pub number_of_stream_input_ports: u16,
    pub number_of_stream_output_ports: u16,
    pub current_sample_rate_hz: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioClusterDescriptor {
    pub signal_type: DescriptorType,
    pub signal_index: u16,
    pub channel_count: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioMapDescriptor {
    /// (stream_channel, cluster_index, cluster_channel) mapping triples.
    pub mappings: Vec<(u16, u16, u16)>,
}

/// Up to 7 strings per STRINGS descriptor, each up to 64 bytes (spec
/// §4.8). Padding bytes are always zero (scenario S5's "zero padding in
/// unused string bytes" requirement applies equally here).
#[derive(Debug, Clone, PartialEq)]
pub struct StringsDescriptor {
    pub strings: Vec<String>,
}

pub const STRINGS_PER_DESCRIPTOR: usize = 7;
pub const STRING_MAX_LEN: usize = 64;

impl StringsDescriptor {
    pub fn get(&self, index: u8) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }
}

/// One descriptor, tagged by type, owned by an [`EntityModel`].
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Entity(EntityDescriptor),
    Configuration(ConfigurationDescriptor),
    StreamInput(StreamInputDescriptor),
    StreamOutput(StreamOutputDescriptor),
    AvbInterface(AvbInterfaceDescriptor),
    ClockSource(ClockSourceDescriptor),
    ClockDomain(ClockDomainDescriptor),
    AudioUnit(AudioUnitDescriptor),
    AudioCluster(AudioClusterDescriptor),
    AudioMap(AudioMapDescriptor),
    Strings(StringsDescriptor),
}

impl Descriptor {
    pub fn descriptor_type(&self) -> DescriptorType {
        match self {
            Self::Entity(_) => DescriptorType::Entity,
            Self::Configuration(_) => DescriptorType::Configuration,
            Self::StreamInput(_) => DescriptorType::StreamInput,
            Self::StreamOutput(_) => DescriptorType::StreamOutput,
            Self::AvbInterface(_) => DescriptorType::AvbInterface,
            Self::ClockSource(_) => DescriptorType::ClockSource,
            Self::ClockDomain(_) => DescriptorType::ClockDomain,
            Self::AudioUnit(_) => DescriptorType::AudioUnit,
            Self::AudioCluster(_) => DescriptorType::AudioCluster,
            Self::AudioMap(_) => DescriptorType::AudioMap,
            Self::Strings(_) => DescriptorType::Strings,
        }
    }

    /// Canonical serialized form the AEM checksum is computed over (spec
    /// §4.8). Not a full byte-for-byte wire encoding of every field type;
    /// stable and deterministic is what the checksum needs.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.descriptor_type() as u16).to_be_bytes());
        match self {
            Self::Entity(d) => {
                buf.extend_from_slice(d.entity_id.as_bytes());
                buf.extend_from_slice(d.entity_model_id.as_bytes());
                buf.extend_from_slice(&d.entity_capabilities.to_be_bytes());
                buf.extend_from_slice(&d.available_index.to_be_bytes());
            }
            Self::Configuration(d) => {
                for (ty, count) in &d.descriptor_counts {
                    buf.extend_from_slice(&(*ty as u16).to_be_bytes());
                    buf.extend_from_slice(&count.to_be_bytes());
                }
            }
            Self::StreamInput(d) | Self::StreamOutput(d) => {
                buf.extend_from_slice(&d.stream_id.to_be_bytes());
                buf.extend_from_slice(&d.clock_domain_index.to_be_bytes());
                buf.extend_from_slice(&d.avb_interface_index.to_be_bytes());
            }
            Self::AvbInterface(d) => {
                buf.extend_from_slice(&d.mac_address.0);
                buf.extend_from_slice(d.clock_identity.as_bytes());
                buf.extend_from_slice(&d.port_number.to_be_bytes());
            }
            Self::ClockSource(d) => {
                buf.extend_from_slice(&(d.clock_source_type as u16).to_be_bytes());
                buf.extend_from_slice(&(d.clock_source_location.descriptor_type as u16).to_be_bytes());
                buf.extend_from_slice(&d.clock_source_location.descriptor_index.to_be_bytes());
            }
            Self::ClockDomain(d) => {
                buf.extend_from_slice(&d.clock_source_index.to_be_bytes());
                for source in &d.clock_sources {
                    buf.extend_from_slice(&source.to_be_bytes());
                }
            }
            Self::AudioUnit(d) => {
                buf.extend_from_slice(&d.number_of_stream_input_ports.to_be_bytes());
                buf.extend_from_slice(&d.number_of_stream_output_ports.to_be_bytes());
                buf.extend_from_slice(&d.current_sample_rate_hz.to_be_bytes());
            }
            Self::AudioCluster(d) => {
                buf.extend_from_slice(&(d.signal_type as u16).to_be_bytes());
                buf.extend_from_slice(&d.signal_index.to_be_bytes());
                buf.extend_from_slice(&d.channel_count.to_be_bytes());
            }
            Self::AudioMap(d) => {
                for (stream_channel, cluster_index, cluster_channel) in &d.mappings {
                    buf.extend_from_slice(&stream_channel.to_be_bytes());
                    buf.extend_from_slice(&cluster_index.to_be_bytes());
                    buf.extend_from_slice(&cluster_channel.to_be_bytes());
                }
            }
            Self::Strings(d) => {
                for s in &d.strings {
                    let mut slot = [0u8; STRING_MAX_LEN];
                    let bytes = s.as_bytes();
                    let n = bytes.len().min(STRING_MAX_LEN);
                    slot[..n].copy_from_slice(&bytes[..n]);
                    buf.extend_from_slice(&slot);
                }
            }
        }
        buf
    }

    /// AEM checksum: a fixed-polynomial CRC over the canonical serialized
    /// form (spec §4.8). CRC-32/ISO-HDLC, the same polynomial widely used
    /// for Ethernet FCS.
    pub fn checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.canonical_bytes());
        hasher.finalize()
    }

    /// Verify a checksum previously computed for this descriptor. Readers
    /// reject descriptors with bad checksums (spec §4.8).
    pub fn verify(&self, expected: u32) -> bool {
        self.checksum() == expected
    }
}

/// The descriptor tree owned by one local entity (spec §4.8).
#[derive(Debug, Clone, Default)]
pub struct EntityModel {
    descriptors: BTreeMap<DescriptorRef, Descriptor>,
}

impl EntityModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: u16, descriptor: Descriptor) {
        let reference = DescriptorRef {
            descriptor_type: descriptor.descriptor_type(),
            descriptor_index: index,
        };
        self.descriptors.insert(reference, descriptor);
    }

    pub fn get(&self, reference: DescriptorRef) -> Option<&Descriptor> {
        self.descriptors.get(&reference)
    }

    pub fn get_mut(&mut self, reference: DescriptorRef) -> Option<&mut Descriptor> {
        self.descriptors.get_mut(&reference)
    }

    /// Read a descriptor's canonical bytes plus its checksum, as an AECP
    /// READ_DESCRIPTOR response would deliver it.
    pub fn read_with_checksum(&self, reference: DescriptorRef) -> Result<(&Descriptor, u32)> {
        let descriptor = self.descriptors.get(&reference).ok_or(WireError::InvalidValue {
            field: "descriptor_reference",
            detail: format!("{reference:?} not present"),
        })?;
        Ok((descriptor, descriptor.checksum()))
    }

    /// Accept a descriptor read over the wire together with its claimed
    /// checksum, rejecting it on mismatch (spec §4.8, §7: protocol error).
    pub fn verify_received(descriptor: &Descriptor, claimed_checksum: u32) -> Result<()> {
        if !descriptor.verify(claimed_checksum) {
            return Err(WireError::ChecksumMismatch);
        }
        Ok(())
    }

    pub fn entity(&self) -> Option<&EntityDescriptor> {
        self.descriptors
            .get(&DescriptorRef {
                descriptor_type: DescriptorType::Entity,
                descriptor_index: 0,
            })
            .and_then(|d| match d {
                Descriptor::Entity(e) => Some(e),
                _ => None,
            })
    }
}
