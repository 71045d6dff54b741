//! Generalized Precision Time Protocol (IEEE 802.1AS) endpoint control
//! plane: wire codec, per-port state machine, Best Master Clock Algorithm,
//! peer-to-peer path-delay engine and PI sync servo (spec §4).

pub mod announce;
pub mod bmca;
pub mod codec;
pub mod config;
pub mod counters;
pub mod error;
pub mod fsm;
pub mod interfaces;
pub mod path_delay;
pub mod port;
pub mod servo;

pub use announce::{AnnounceScheduler, LocalClockDataset};
pub use bmca::{Comparison, Dataset, ForeignMasterRecord, ForeignMasterStore, Recommendation};
pub use codec::Message;
pub use config::PortConfig;
pub use counters::PortCounters;
pub use error::{GptpError, Result};
pub use fsm::{PortEvent, PortFsm, PortState};
pub use interfaces::{FrameTimestamp, HardwareClock, NetworkPort};
pub use path_delay::{PathDelayEngine, PathDelayEvent, PathDelayMeasurement, PathDelayOutcome};
pub use port::PtpPort;
pub use servo::{ClockAdjustment, ServoConfig, SyncServo, SyncState};
