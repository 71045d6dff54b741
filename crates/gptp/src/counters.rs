//! Per-port diagnostic counters (spec §7).

/// Monotonic counters a port maintains for observability. Never read by
/// protocol logic itself — only incremented by it and exposed for logging
/// and external monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortCounters {
    pub announce_rx: u64,
    pub announce_tx: u64,
    pub sync_rx: u64,
    pub sync_tx: u64,
    pub follow_up_rx: u64,
    pub follow_up_tx: u64,
    pub pdelay_req_rx: u64,
    pub pdelay_req_tx: u64,
    pub pdelay_resp_rx: u64,
    pub pdelay_resp_tx: u64,
    pub rx_wire_errors: u64,
    pub announce_timeouts: u64,
    pub sync_timeouts: u64,
    pub pdelay_timeouts: u64,
    pub faults: u64,
    pub state_transitions: u64,
}

impl PortCounters {
    pub fn new() -> Self {
        Self::default()
    }
}
