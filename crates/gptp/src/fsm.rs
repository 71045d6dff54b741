//! Per-port PTP state machine (spec §4.2).

use crate::bmca::Recommendation;
use tsn_types::PortIdentity;

/// Port states (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortState {
    Initializing,
    Faulty,
    Disabled,
    Listening,
    PreMaster,
    Master,
    Passive,
    Uncalibrated,
    Slave,
}

/// Events driving the state machine (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortEvent {
    PowerUp,
    Initialize,
    FaultCleared,
    DesignatedEnabled,
    DesignatedDisabled,
    AnnounceReceived,
    SyncReceived,
    AnnounceReceiptTimeout,
    SyncReceiptTimeout,
    BetterMasterDetected,
    RecommendedStateChange,
}

/// Whether this endpoint's port is AS-capable at INITIALIZE time (spec
/// §4.2: "INITIALIZING + INITIALIZE -> LISTENING if AS-capable else
/// DISABLED").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeOutcome {
    pub as_capable: bool,
}

/// The port state machine (spec §4.2). This struct only tracks state and
/// transition logic; the effects of entering/leaving a state (resetting
/// foreign masters, resetting the servo, scheduling Announces) are applied
/// by the owning `PtpPort` in `port.rs`, which is the only place with
/// access to those collaborators.
#[derive(Debug, Clone)]
pub struct PortFsm {
    state: PortState,
    /// Recorded so `SYNC_RECEIVED` in UNCALIBRATED can validate it came
    /// from the grandmaster BMCA actually recommended.
    pending_grandmaster: Option<PortIdentity>,
}

impl PortFsm {
    pub fn new() -> Self {
        Self {
            state: PortState::Initializing,
            pending_grandmaster: None,
        }
    }

    pub fn state(&self) -> PortState {
        self.state
    }

    /// Apply a BMCA recommendation, returning the event this implies so
    /// callers can feed it back through [`PortFsm::handle`] uniformly.
    pub fn recommendation_event(&self, recommendation: &Recommendation) -> PortEvent {
        let recommended_state = match recommendation {
            Recommendation::Master => PortState::Master,
            Recommendation::Uncalibrated { .. } => PortState::Uncalibrated,
            Recommendation::Passive => PortState::Passive,
        };
        if recommended_state != self.state {
            PortEvent::RecommendedStateChange
        } else {
            PortEvent::BetterMasterDetected
        }
    }

    /// Core transition table (spec §4.2, illustrative rules made total).
    pub fn handle(&mut self, event: PortEvent, recommendation: Option<&Recommendation>) {
        use PortEvent::*;
        use PortState::*;

        self.state = match (self.state, event) {
            (_, PowerUp) => Initializing,
            (Initializing, Initialize) => Listening, // as_capable gating done by caller via initialize()
            (Faulty, FaultCleared) => Initializing,
            (_, DesignatedDisabled) => Disabled,
            (Disabled, DesignatedEnabled) => Initializing,

            (Listening, AnnounceReceived) | (Listening, RecommendedStateChange) => {
                self.apply_recommendation(recommendation, Listening)
            }
            (Listening, AnnounceReceiptTimeout) => Master,

            (PreMaster, RecommendedStateChange) => {
                self.apply_recommendation(recommendation, PreMaster)
            }

            (Master, BetterMasterDetected) | (Master, RecommendedStateChange) => {
                self.apply_recommendation(recommendation, Master)
            }

            (Passive, RecommendedStateChange) => self.apply_recommendation(recommendation, Passive),

            (Uncalibrated, SyncReceived) => {
                self.pending_grandmaster = None;
                Slave
            }
            (Uncalibrated, RecommendedStateChange) => {
                self.apply_recommendation(recommendation, Uncalibrated)
            }

            (Slave, AnnounceReceiptTimeout) | (Slave, SyncReceiptTimeout) => {
                self.pending_grandmaster = None;
                Listening
            }
            (Slave, RecommendedStateChange) => self.apply_recommendation(recommendation, Slave),

            (current, _) => current,
        };
    }

    fn apply_recommendation(&mut self, recommendation: Option<&Recommendation>, fallback: PortState) -> PortState {
        match recommendation {
            Some(Recommendation::Master) => PortState::Master,
            Some(Recommendation::Uncalibrated { grandmaster }) => {
                self.pending_grandmaster = Some(*grandmaster);
                PortState::Uncalibrated
            }
            Some(Recommendation::Passive) => PortState::Passive,
            None => fallback,
        }
    }

    /// Escalate to FAULTY on a hardware-timestamp fault or repeated clock
    /// adjustment rejection (spec §4.2, §7).
    pub fn fault(&mut self) {
        self.state = PortState::Faulty;
    }

    pub fn is_master(&self) -> bool {
        self.state == PortState::Master
    }

    pub fn is_slave(&self) -> bool {
        self.state == PortState::Slave
    }
}

impl Default for PortFsm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsn_types::ClockIdentity;

    fn gm() -> PortIdentity {
        PortIdentity::new(ClockIdentity([1; 8]), 1)
    }

    #[test]
    fn listening_timeout_goes_master() {
        let mut fsm = PortFsm::new();
        fsm.handle(PortEvent::Initialize, None);
        assert_eq!(fsm.state(), PortState::Listening);
        fsm.handle(PortEvent::AnnounceReceiptTimeout, None);
        assert_eq!(fsm.state(), PortState::Master);
    }

    #[test]
    fn listening_to_uncalibrated_to_slave() {
        let mut fsm = PortFsm::new();
        fsm.handle(PortEvent::Initialize, None);
        fsm.handle(
            PortEvent::AnnounceReceived,
            Some(&Recommendation::Uncalibrated { grandmaster: gm() }),
        );
        assert_eq!(fsm.state(), PortState::Uncalibrated);
        fsm.handle(PortEvent::SyncReceived, None);
        assert_eq!(fsm.state(), PortState::Slave);
    }

    #[test]
    fn slave_timeout_returns_to_listening() {
        let mut fsm = PortFsm::new();
        fsm.handle(PortEvent::Initialize, None);
        fsm.handle(
            PortEvent::AnnounceReceived,
            Some(&Recommendation::Uncalibrated { grandmaster: gm() }),
        );
        fsm.handle(PortEvent::SyncReceived, None);
        assert_eq!(fsm.state(), PortState::Slave);
        fsm.handle(PortEvent::AnnounceReceiptTimeout, None);
        assert_eq!(fsm.state(), PortState::Listening);
        assert!(fsm.pending_grandmaster.is_none());
    }

    #[test]
    fn fault_is_recoverable() {
        let mut fsm = PortFsm::new();
        fsm.fault();
        assert_eq!(fsm.state(), PortState::Faulty);
        fsm.handle(PortEvent::FaultCleared, None);
        assert_eq!(fsm.state(), PortState::Initializing);
    }

    #[test]
    fn master_demotes_on_better_master() {
        let mut fsm = PortFsm::new();
        fsm.handle(PortEvent::Initialize, None);
        fsm.handle(PortEvent::AnnounceReceiptTimeout, None);
        assert_eq!(fsm.state(), PortState::Master);
        fsm.handle(
            PortEvent::BetterMasterDetected,
            Some(&Recommendation::Uncalibrated { grandmaster: gm() }),
        );
        assert_eq!(fsm.state(), PortState::Uncalibrated);
    }
}
