//! Shared primitives for the TSN pro-audio control plane.
//!
//! This crate has no protocol logic of its own — it is the vocabulary every
//! other crate in the workspace (`gptp`, `avtp`, `avdecc`, `milan`,
//! `tsn-endpoint`) builds on: clock identities, timestamps, the wire-codec
//! failure taxonomy, and the `WireEncode`/`WireDecode` traits every frame
//! type implements.

mod clock_identity;
mod clock_quality;
pub mod codec;
mod error;
mod mac;
mod port_identity;
mod time_interval;
mod timestamp;

pub use clock_identity::ClockIdentity;
pub use clock_quality::ClockQuality;
pub use codec::{WireDecode, WireDecodeLen, WireEncode};
pub use error::{Result, WireError};
pub use mac::{avdecc_subtype, ethertype, MacAddress};
pub use port_identity::PortIdentity;
pub use time_interval::TimeInterval;
pub use timestamp::{Timestamp, MAX_SECONDS_48};
