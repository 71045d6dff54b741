//! Announce transmission scheduling and receive-side validation (spec
//! §4.2, §4.3, §4.6). Distinct from [`crate::codec::AnnounceMessage`], which
//! is only the wire representation; this module is the MASTER-state
//! transmit cadence and the RX path that feeds the [`crate::bmca`] store.

use std::time::Duration;

use tsn_types::{ClockIdentity, ClockQuality, PortIdentity};

use crate::bmca::ForeignMasterStore;
use crate::codec::{AnnounceMessage, MessageType, PtpHeader, TimeSource};

/// This clock's own advertised dataset, used both to build outgoing
/// Announces while MASTER and as the "local" side of BMCA's dataset
/// comparison (spec §3, §4.3).
#[derive(Debug, Clone, Copy)]
pub struct LocalClockDataset {
    pub grandmaster_identity: ClockIdentity,
    pub clock_quality: ClockQuality,
    pub priority1: u8,
    pub priority2: u8,
    pub steps_removed: u16,
    pub current_utc_offset: i16,
    pub time_source: TimeSource,
}

/// Transmit-side cadence for Announce messages while this port is MASTER
/// (spec §4.6). Not responsible for actually sending bytes; callers pull
/// the scheduler for the message to send on their own I/O loop.
pub struct AnnounceScheduler {
    interval: Duration,
    elapsed_since_last_tx: Duration,
    sequence_id: u16,
}

impl AnnounceScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed_since_last_tx: interval,
            sequence_id: 0,
        }
    }

    /// Advance the scheduler's clock by `dt`; returns an Announce to
    /// transmit if the interval has elapsed. Only call while MASTER.
    pub fn tick(
        &mut self,
        dt: Duration,
        local: &LocalClockDataset,
        source_port_identity: PortIdentity,
    ) -> Option<AnnounceMessage> {
        self.elapsed_since_last_tx += dt;
        if self.elapsed_since_last_tx < self.interval {
            return None;
        }
        self.elapsed_since_last_tx = Duration::ZERO;
        Some(self.build(local, source_port_identity))
    }

    fn build(&mut self, local: &LocalClockDataset, source_port_identity: PortIdentity) -> AnnounceMessage {
        let mut header = PtpHeader::new(MessageType::ANNOUNCE, source_port_identity);
        header.sequence_id = self.sequence_id;
        self.sequence_id = self.sequence_id.wrapping_add(1);

        AnnounceMessage {
            header,
            origin_timestamp: tsn_types::Timestamp::ZERO,
            current_utc_offset: local.current_utc_offset,
            grandmaster_priority1: local.priority1,
            grandmaster_clock_quality: local.clock_quality,
            grandmaster_priority2: local.priority2,
            grandmaster_identity: local.grandmaster_identity,
            steps_removed: local.steps_removed,
            time_source: local.time_source as u8,
        }
    }

    /// Reset transmit cadence, e.g. on entering MASTER so the first
    /// Announce goes out immediately rather than waiting a full interval.
    pub fn reset(&mut self) {
        self.elapsed_since_last_tx = self.interval;
        self.sequence_id = 0;
    }
}

/// Dedup and admit a received, already-decoded Announce into the foreign
/// master store (spec §4.3). Duplicate sequence_ids from the same sender
/// between calls are the caller's concern (the wire codec does not track
/// per-peer sequence history); this function trusts what it's given.
pub fn record_received_announce(
    store: &mut ForeignMasterStore,
    msg: &AnnounceMessage,
    now: Duration,
    announce_interval: Duration,
) {
    store.record_announce(
        msg.header.source_port_identity,
        msg.grandmaster_identity,
        msg.grandmaster_clock_quality,
        msg.grandmaster_priority1,
        msg.grandmaster_priority2,
        msg.steps_removed,
        now,
        announce_interval,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsn_types::ClockIdentity;

    fn pi() -> PortIdentity {
        PortIdentity::new(ClockIdentity([5; 8]), 1)
    }

    fn local() -> LocalClockDataset {
        LocalClockDataset {
            grandmaster_identity: ClockIdentity([5; 8]),
            clock_quality: ClockQuality::default(),
            priority1: 248,
            priority2: 248,
            steps_removed: 0,
            current_utc_offset: 37,
            time_source: TimeSource::InternalOscillator,
        }
    }

    #[test]
    fn transmits_at_interval() {
        let mut scheduler = AnnounceScheduler::new(Duration::from_secs(1));
        // Starts primed to fire immediately.
        assert!(scheduler.tick(Duration::ZERO, &local(), pi()).is_some());
        assert!(scheduler.tick(Duration::from_millis(500), &local(), pi()).is_none());
        assert!(scheduler.tick(Duration::from_millis(600), &local(), pi()).is_some());
    }

    #[test]
    fn sequence_id_increments() {
        let mut scheduler = AnnounceScheduler::new(Duration::ZERO);
        let a = scheduler.tick(Duration::ZERO, &local(), pi()).unwrap();
        let b = scheduler.tick(Duration::ZERO, &local(), pi()).unwrap();
        assert_eq!(a.header.sequence_id, 0);
        assert_eq!(b.header.sequence_id, 1);
    }

    #[test]
    fn received_announce_reaches_store() {
        let mut store = ForeignMasterStore::new(crate::bmca::DEFAULT_CAPACITY, 3);
        let msg = AnnounceMessage {
            header: PtpHeader::new(MessageType::ANNOUNCE, pi()),
            origin_timestamp: tsn_types::Timestamp::ZERO,
            current_utc_offset: 37,
            grandmaster_priority1: 128,
            grandmaster_clock_quality: ClockQuality::default(),
            grandmaster_priority2: 128,
            grandmaster_identity: ClockIdentity([1; 8]),
            steps_removed: 0,
            time_source: TimeSource::Ptp as u8,
        };
        record_received_announce(&mut store, &msg, Duration::from_secs(1), Duration::from_secs(1));
        assert_eq!(store.len(), 1);
    }
}
