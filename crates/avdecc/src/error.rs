//! Error taxonomy for the AVDECC control plane (spec §7).

use tsn_types::WireError;

pub type Result<T> = std::result::Result<T, AvdeccError>;

#[derive(Debug, thiserror::Error)]
pub enum AvdeccError {
    #[error("wire codec error: {0}")]
    Wire(#[from] WireError),

    /// AECP/ACMP response never arrived within the retry budget (spec §4.9:
    /// transient, surfaces as `COMMAND_FAILED`).
    #[error("command timed out after {retries} retries")]
    CommandTimedOut { retries: u32 },

    /// Connection table or inflight-command table is full (spec §7:
    /// Resource, surface and degrade).
    #[error("no resources available for this request")]
    NoResources,
}

impl AvdeccError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::CommandTimedOut { .. })
    }
}
