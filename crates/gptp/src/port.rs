//! Composition root: one gPTP port, tying the FSM, BMCA, path-delay engine,
//! sync servo and Announce scheduler to a concrete [`HardwareClock`] and
//! [`NetworkPort`] (spec §5, §6).
//!
//! This is a cooperative, tick-driven design (spec §9, "Async/callbacks"):
//! `PtpPort` owns no task or thread of its own. The caller drives it with
//! [`PtpPort::tick`] on a timer and [`PtpPort::handle_frame`] on receive;
//! `tsn-endpoint` is what wires both to a `tokio::select!` loop.

use std::time::Duration;

use tracing::{debug, info, warn};
use tsn_types::{PortIdentity, Timestamp};

use crate::announce::{record_received_announce, AnnounceScheduler, LocalClockDataset};
use crate::bmca::{compare_datasets, state_decision, Comparison, Dataset, ForeignMasterStore};
use crate::codec::{Message, MessageType, PtpHeader};
use crate::config::PortConfig;
use crate::counters::PortCounters;
use crate::error::{GptpError, Result};
use crate::fsm::{PortEvent, PortFsm, PortState};
use crate::interfaces::{HardwareClock, NetworkPort};
use crate::path_delay::{PathDelayEngine, PathDelayOutcome};
use crate::servo::{ClockAdjustment, SyncServo};

/// Pending state for an in-flight two-step Sync: this port's own Rx
/// timestamp, waiting to be paired with the matching Follow_Up (spec §4.5).
struct PendingSync {
    sequence_id: u16,
    t2: Timestamp,
}

/// One gPTP port. Generic over its hardware clock and network port so a
/// deployment can plug in real timestamping hardware without this module
/// paying for dynamic dispatch.
pub struct PtpPort<C: HardwareClock, N: NetworkPort> {
    config: PortConfig,
    local_dataset: LocalClockDataset,

    clock: C,
    net: N,

    fsm: PortFsm,
    foreign_masters: ForeignMasterStore,
    path_delay: PathDelayEngine,
    servo: SyncServo,
    announce_tx: AnnounceScheduler,
    counters: PortCounters,

    pending_sync: Option<PendingSync>,
    time_since_last_announce_rx: Duration,
    time_since_last_sync: Duration,
    /// Monotonic clock accumulated from tick deltas, used as `now` for the
    /// foreign-master store so each sender's `last_announce_time` ages
    /// independently of every other sender's traffic (spec §3, §4.3).
    elapsed: Duration,
}

impl<C: HardwareClock, N: NetworkPort> PtpPort<C, N> {
    pub fn new(config: PortConfig, local_dataset: LocalClockDataset, clock: C, net: N) -> Self {
        let foreign_masters = config.build_foreign_master_store();
        let path_delay = config.build_path_delay_engine();
        let servo = config.build_servo();
        let announce_tx = AnnounceScheduler::new(config.announce_interval);

        Self {
            config,
            local_dataset,
            clock,
            net,
            fsm: PortFsm::new(),
            foreign_masters,
            path_delay,
            servo,
            announce_tx,
            counters: PortCounters::new(),
            pending_sync: None,
            time_since_last_announce_rx: Duration::ZERO,
            time_since_last_sync: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    pub fn state(&self) -> PortState {
        self.fsm.state()
    }

    pub fn counters(&self) -> PortCounters {
        self.counters
    }

    pub fn port_identity(&self) -> PortIdentity {
        self.net.port_identity()
    }

    /// Bring the port up (spec §4.2: INITIALIZING -> LISTENING, or
    /// DISABLED if this link isn't AS-capable).
    pub fn initialize(&mut self, as_capable: bool) {
        if as_capable {
            self.fsm.handle(PortEvent::Initialize, None);
        } else {
            self.fsm.handle(PortEvent::DesignatedDisabled, None);
        }
    }

    /// Advance all time-driven behavior by `dt`: Announce transmission
    /// while MASTER, Announce/Sync receipt timeout while SLAVE, and servo
    /// holdover/lost detection (spec §4.2, §4.5, §4.6).
    pub fn tick(&mut self, dt: Duration) -> Result<()> {
        self.elapsed += dt;
        self.time_since_last_announce_rx += dt;
        self.time_since_last_sync += dt;

        if self.fsm.state() == PortState::Master {
            if let Some(announce) = self.announce_tx.tick(dt, &self.local_dataset, self.port_identity()) {
                self.transmit(Message::Announce(announce))?;
                self.counters.announce_tx += 1;
            }
        }

        if self.fsm.state() == PortState::Slave {
            let timeout = self.config.announce_interval * self.config.announce_receipt_timeout as u32;
            if self.time_since_last_announce_rx >= timeout {
                self.counters.announce_timeouts += 1;
                self.fsm.handle(PortEvent::AnnounceReceiptTimeout, None);
                self.on_state_changed();
            }
            let sync_timeout = self.config.sync_interval * self.config.sync_receipt_timeout as u32;
            if self.time_since_last_sync >= sync_timeout {
                self.counters.sync_timeouts += 1;
                self.fsm.handle(PortEvent::SyncReceiptTimeout, None);
                self.on_state_changed();
            }
        }

        self.servo.tick_without_sync(self.time_since_last_sync, self.config.holdover_timeout);
        self.foreign_masters.expire(self.elapsed);

        self.run_bmca();
        Ok(())
    }

    /// Handle one received, already-decoded frame, paired with its
    /// hardware Rx timestamp (spec §5).
    pub fn handle_frame(&mut self, data: &[u8], rx_timestamp: Timestamp) -> Result<()> {
        let message = Message::decode(data).map_err(|e| {
            self.counters.rx_wire_errors += 1;
            GptpError::Wire(e)
        })?;

        match message {
            Message::Announce(msg) => {
                self.counters.announce_rx += 1;
                self.time_since_last_announce_rx = Duration::ZERO;
                record_received_announce(
                    &mut self.foreign_masters,
                    &msg,
                    self.elapsed,
                    self.config.announce_interval,
                );
                self.run_bmca();
            }
            Message::Sync(msg) => {
                self.counters.sync_rx += 1;
                if !msg.header.two_step() {
                    self.process_sync(msg.header.sequence_id, rx_timestamp, msg.origin_timestamp);
                } else {
                    self.pending_sync = Some(PendingSync {
                        sequence_id: msg.header.sequence_id,
                        t2: rx_timestamp,
                    });
                }
            }
            Message::FollowUp(msg) => {
                self.counters.follow_up_rx += 1;
                if let Some(pending) = &self.pending_sync {
                    if pending.sequence_id == msg.header.sequence_id {
                        let t2 = pending.t2;
                        self.pending_sync = None;
                        self.process_sync(msg.header.sequence_id, t2, msg.precise_origin_timestamp);
                    }
                }
            }
            Message::PDelayReq(msg) => {
                self.counters.pdelay_req_rx += 1;
                self.respond_to_pdelay_req(&msg.header, rx_timestamp)?;
            }
            Message::PDelayResp(msg) => {
                self.counters.pdelay_resp_rx += 1;
                self.path_delay.record_resp(
                    msg.header.source_port_identity,
                    msg.request_receipt_timestamp,
                    rx_timestamp,
                );
            }
            Message::PDelayRespFollowUp(msg) => {
                if let Some(outcome) =
                    self.path_delay.record_follow_up(msg.header.source_port_identity, msg.response_origin_timestamp)
                {
                    self.handle_path_delay_outcome(outcome);
                }
            }
        }
        Ok(())
    }

    fn process_sync(&mut self, _sequence_id: u16, t2: Timestamp, precise_origin: Timestamp) {
        self.time_since_last_sync = Duration::ZERO;
        let measurement = self.path_delay.measurement();
        self.servo.set_path_delay_valid(measurement.valid);
        let adjustment = self.servo.process_sync(t2, precise_origin, measurement.mean_link_delay);
        self.apply_adjustment(adjustment);

        if self.fsm.state() == PortState::Uncalibrated {
            self.fsm.handle(PortEvent::SyncReceived, None);
            self.on_state_changed();
        }
    }

    fn apply_adjustment(&mut self, adjustment: ClockAdjustment) {
        let result = match adjustment {
            ClockAdjustment::Step(offset) => self.clock.adjust_phase(offset.nanos()),
            ClockAdjustment::Frequency(ppb) => self.clock.adjust_frequency(ppb),
        };
        if let Err(e) = result {
            warn!(error = %e, "hardware clock rejected adjustment");
            self.counters.faults += 1;
            self.fsm.fault();
        }
    }

    fn respond_to_pdelay_req(&mut self, req_header: &PtpHeader, t2: Timestamp) -> Result<()> {
        let response = crate::codec::PDelayRespMessage {
            header: {
                let mut h = PtpHeader::new(MessageType::PDELAY_RESP, self.port_identity());
                h.sequence_id = req_header.sequence_id;
                h
            },
            request_receipt_timestamp: t2,
            requesting_port_identity: req_header.source_port_identity,
        };
        self.transmit(Message::PDelayResp(response))?;
        self.counters.pdelay_resp_tx += 1;
        Ok(())
    }

    fn handle_path_delay_outcome(&mut self, outcome: PathDelayOutcome) {
        match outcome {
            PathDelayOutcome::Updated(m) => {
                debug!(mean_link_delay_ns = m.mean_link_delay.nanos(), "path delay updated");
            }
            PathDelayOutcome::RateRatioOutOfRange => {
                warn!("neighbor rate ratio out of range, path delay filter reset");
            }
        }
    }

    fn transmit(&mut self, message: Message) -> Result<()> {
        let bytes = message.encode();
        self.net
            .send_frame(&bytes)
            .map_err(|e| GptpError::SendFailed(e.to_string()))?;
        Ok(())
    }

    fn run_bmca(&mut self) {
        let local = Dataset {
            grandmaster_identity: self.local_dataset.grandmaster_identity,
            priority1: self.local_dataset.priority1,
            clock_quality: self.local_dataset.clock_quality,
            priority2: self.local_dataset.priority2,
            steps_removed: self.local_dataset.steps_removed,
        };
        let recommendation = state_decision(&local, &self.foreign_masters);
        let event = self.fsm.recommendation_event(&recommendation);
        if event == PortEvent::RecommendedStateChange {
            self.fsm.handle(event, Some(&recommendation));
            self.on_state_changed();
        }
    }

    fn on_state_changed(&mut self) {
        self.counters.state_transitions += 1;
        info!(state = ?self.fsm.state(), "port state changed");
        match self.fsm.state() {
            PortState::Master => self.announce_tx.reset(),
            PortState::Listening => {
                self.foreign_masters.clear();
                self.servo.reset();
            }
            _ => {}
        }
    }

    /// Compare this port's currently recommended master against a
    /// candidate dataset, for multi-port deployments deciding which port
    /// should become the grandmaster-facing one (spec §4.3).
    pub fn compare_against(&self, other: &Dataset) -> Comparison {
        let local = Dataset {
            grandmaster_identity: self.local_dataset.grandmaster_identity,
            priority1: self.local_dataset.priority1,
            clock_quality: self.local_dataset.clock_quality,
            priority2: self.local_dataset.priority2,
            steps_removed: self.local_dataset.steps_removed,
        };
        compare_datasets(&local, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use tsn_types::ClockIdentity;

    use crate::announce::LocalClockDataset;
    use crate::codec::{AnnounceMessage, TimeSource};

    struct NoopClock;

    impl HardwareClock for NoopClock {
        type Error = Infallible;
        fn now(&self) -> Result<Timestamp, Self::Error> {
            Ok(Timestamp::ZERO)
        }
        fn resolution_ns(&self) -> u32 {
            100
        }
        fn adjust_phase(&mut self, _offset_ns: i64) -> Result<(), Self::Error> {
            Ok(())
        }
        fn adjust_frequency(&mut self, _ppb: f64) -> Result<(), Self::Error> {
            Ok(())
        }
        fn set_time(&mut self, _time: Timestamp) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct NoopNet {
        identity: PortIdentity,
    }

    impl NetworkPort for NoopNet {
        type Error = Infallible;
        fn port_identity(&self) -> PortIdentity {
            self.identity
        }
        fn send_frame(&mut self, _frame: &[u8]) -> Result<crate::interfaces::FrameTimestamp, Self::Error> {
            Ok(crate::interfaces::FrameTimestamp { timestamp: Timestamp::ZERO })
        }
        fn poll_receive(&mut self) -> Result<Option<(Vec<u8>, crate::interfaces::FrameTimestamp)>, Self::Error> {
            Ok(None)
        }
    }

    fn local() -> LocalClockDataset {
        LocalClockDataset {
            grandmaster_identity: ClockIdentity([0xAA; 8]),
            clock_quality: tsn_types::ClockQuality::new(248, 0xFE, 0xFFFF),
            priority1: 248,
            priority2: 248,
            steps_removed: 0,
            current_utc_offset: 37,
            time_source: TimeSource::InternalOscillator,
        }
    }

    fn announce_bytes(sender: u8, sequence_id: u16) -> Vec<u8> {
        let mut header = PtpHeader::new(MessageType::ANNOUNCE, PortIdentity::new(ClockIdentity([sender; 8]), 1));
        header.sequence_id = sequence_id;
        let msg = AnnounceMessage {
            header,
            origin_timestamp: Timestamp::ZERO,
            current_utc_offset: 37,
            grandmaster_priority1: 128,
            grandmaster_clock_quality: tsn_types::ClockQuality::new(6, 0x20, 100),
            grandmaster_priority2: 128,
            grandmaster_identity: ClockIdentity([sender; 8]),
            steps_removed: 1,
            time_source: TimeSource::Ptp as u8,
        };
        Message::Announce(msg).encode()
    }

    fn test_port() -> PtpPort<NoopClock, NoopNet> {
        let config = PortConfig::new().announce_interval(Duration::from_secs(1));
        PtpPort::new(
            config,
            local(),
            NoopClock,
            NoopNet { identity: PortIdentity::new(ClockIdentity([0xAA; 8]), 1) },
        )
    }

    /// Regression for the per-sender foreign-master aging bug: two foreign
    /// masters announce together, one (B) then goes silent while the other
    /// (A) keeps announcing every interval. B's record must still expire
    /// once its own elapsed time exceeds the receipt timeout, even though
    /// A's continued traffic is received on the same port in the meantime.
    #[test]
    fn silent_foreign_master_expires_even_while_another_keeps_announcing() {
        let mut port = test_port();

        port.handle_frame(&announce_bytes(1, 0), Timestamp::ZERO).unwrap();
        port.handle_frame(&announce_bytes(2, 0), Timestamp::ZERO).unwrap();
        port.handle_frame(&announce_bytes(1, 1), Timestamp::ZERO).unwrap();
        port.handle_frame(&announce_bytes(2, 1), Timestamp::ZERO).unwrap();
        assert_eq!(port.foreign_masters.len(), 2);

        // B (sender 2) goes silent. A (sender 1) keeps announcing every
        // second for 10s, well past the default 3s receipt timeout.
        for seq in 2..12u16 {
            port.tick(Duration::from_secs(1)).unwrap();
            port.handle_frame(&announce_bytes(1, seq), Timestamp::ZERO).unwrap();
        }

        assert_eq!(
            port.foreign_masters.len(),
            1,
            "B's stale record must expire on its own elapsed time, not be kept alive by A's traffic"
        );
    }
}
