//! Integration bridge (spec §4.11): wires gPTP, AVTP and AVDECC into one
//! Milan professional-audio endpoint behind a fixed registration order,
//! and drives the result as a cooperative, tick-based event stream.

mod arena;
mod bridge;
mod engine;
mod error;
mod events;
mod milan_entity;
mod providers;

pub use arena::{Arena, Handle};
pub use bridge::{EndpointBridge, GptpPortHandle};
pub use engine::Engine;
pub use error::{EndpointError, Result};
pub use events::{UpwardEvent, RECOMMENDED_TICK_INTERVAL};
pub use milan_entity::MilanEntity;
pub use providers::{AvdeccProvider, AvdeccStack, AvtpProvider, DefaultAvtpProvider, GptpProvider};
