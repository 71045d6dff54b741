//! Milan professional-audio profile: the MVU vendor-unique command set,
//! redundant stream pairs with seamless switchover, the base stream
//! format whitelist, and NVRAM-backed persisted state.

pub mod error;
pub mod media_clock;
pub mod mvu;
pub mod persistence;
pub mod redundancy;
pub mod stream_format;

pub use error::{MilanError, Result};
pub use media_clock::MediaClockReferenceStore;
pub use mvu::{
    MediaClockReferenceInfo, MilanInfo, MvuCommandType, BASELINE_INTEROPERABILITY,
    MILAN_BASELINE, MILAN_PROTOCOL_IDENTIFIER, RESPONSE_BIT, FIRMWARE_FIELD_LEN, STRING_FIELD_LEN,
};
pub use persistence::{JsonFileNvramStore, MemoryNvramStore, NvramRecord, NvramStore};
pub use redundancy::{DeliveryState, RedundancyManager, RedundantStream, Source, DEFAULT_SWITCHOVER_TIMEOUT};
pub use stream_format::{validate_stream_format, BaseEncoding, StreamFormat};
