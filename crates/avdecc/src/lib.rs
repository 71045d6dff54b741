//! IEEE 1722.1 AVDECC: entity model, discovery (ADP), enumeration and
//! control (AECP), and connection management (ACMP).

pub mod acmp;
pub mod adp;
pub mod aecp;
pub mod codec;
pub mod entity_model;
pub mod error;

pub use acmp::{AcmpStatus, ConnectionTable, ListenerStreamId, StreamParameters, TalkerStreamId};
pub use codec::AvdeccPdu;
pub use adp::{AdpEvent, AdpMessage, AdpMessageType, AdpTable, DEFAULT_ADVERTISE_INTERVAL, MISSED_ADVERTISEMENTS_BEFORE_DEPARTED};
pub use aecp::{
    AcquireState, AecpCommandType, AecpController, AecpResponder, AecpStatus, LockState,
    COMMAND_TIMEOUT, LOCK_RENEWAL_TIMEOUT, MAX_RETRIES,
};
pub use entity_model::{
    AudioClusterDescriptor, AudioMapDescriptor, AudioUnitDescriptor, AvbInterfaceDescriptor,
    ClockDomainDescriptor, ClockSourceDescriptor, ClockSourceType, ConfigurationDescriptor,
    Descriptor, DescriptorRef, DescriptorType, EntityDescriptor, EntityModel,
    StreamInputDescriptor, StreamOutputDescriptor, StringRef, StringsDescriptor,
    STRINGS_PER_DESCRIPTOR, STRING_MAX_LEN,
};
pub use error::{AvdeccError, Result};
