//! Upward events produced by the bridge (spec §6): "entity-discovered/
//! updated/departed, stream-connected/disconnected, sync-state-changed
//! (including offset and freq-adjust), milan-compliance-violation,
//! path-delay-measurement, fault-occurred, fault-cleared."

use std::time::Duration;

use tsn_types::ClockIdentity;

use avdecc::AdpEvent;
use gptp::PortState;

#[derive(Debug, Clone, PartialEq)]
pub enum UpwardEvent {
    EntityDiscovered(ClockIdentity),
    EntityUpdated(ClockIdentity),
    EntityDeparted(ClockIdentity),
    StreamConnected { talker: u64, listener: u64 },
    StreamDisconnected { listener: u64 },
    SyncStateChanged { port_state: PortState, offset_ns: i64, freq_adjust_ppb: f64 },
    MilanComplianceViolation { reason: String },
    PathDelayMeasurement { mean_link_delay_ns: i64 },
    FaultOccurred { detail: String },
    FaultCleared,
}

impl From<(ClockIdentity, AdpEvent)> for UpwardEvent {
    fn from((entity_id, event): (ClockIdentity, AdpEvent)) -> Self {
        match event {
            AdpEvent::Discovered => UpwardEvent::EntityDiscovered(entity_id),
            AdpEvent::Updated => UpwardEvent::EntityUpdated(entity_id),
            AdpEvent::Departed => UpwardEvent::EntityDeparted(entity_id),
        }
    }
}

/// How often the caller's runtime should drive [`crate::engine::Engine`]'s
/// tick (spec §5: "recommended 1-10 ms").
pub const RECOMMENDED_TICK_INTERVAL: Duration = Duration::from_millis(4);
