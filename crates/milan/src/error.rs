//! Error taxonomy for the Milan profile layer (spec §7).

use tsn_types::WireError;

pub type Result<T> = std::result::Result<T, MilanError>;

#[derive(Debug, thiserror::Error)]
pub enum MilanError {
    #[error("wire codec error: {0}")]
    Wire(#[from] WireError),

    /// SET_STREAM_FORMAT named a format outside the base whitelist (spec
    /// §4.10: protocol-level, report and do not retry).
    #[error("stream format not in the Milan base whitelist")]
    UnsupportedStreamFormat,

    /// A redundant stream pair was registered twice for the same primary
    /// (spec §9 open-question resolution: refuse, don't silently update).
    #[error("a redundant stream pair already exists for this primary stream")]
    DuplicateRedundantStream,

    /// NVRAM-backed persistence failed to load or save.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl MilanError {
    pub fn is_fault(&self) -> bool {
        false
    }
}
