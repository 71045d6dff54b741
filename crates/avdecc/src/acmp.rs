//! ACMP: AVDECC Connection Management Protocol (spec §4.9).
//!
//! The nine-way handshake: a controller's CONNECT_RX is relayed to the
//! listener, which forwards CONNECT_TX to the talker; the talker's
//! CONNECT_TX_RESPONSE (carrying the destination MAC/VLAN) flows back
//! through the listener as CONNECT_RX_RESPONSE to the controller.

use std::collections::HashMap;

use tsn_types::{ClockIdentity, MacAddress};

use crate::error::{AvdeccError, Result};

/// Status codes (spec §4.9, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcmpStatus {
    Success,
    ListenerUnknownId,
    TalkerUnknownId,
    TalkerNoBandwidth,
    ListenerExclusive,
    NoResources,
}

/// A talker stream source, identified by entity + unique stream index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TalkerStreamId {
    pub talker_entity_id: ClockIdentity,
    pub talker_unique_id: u16,
}

/// A listener stream sink, identified the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerStreamId {
    pub listener_entity_id: ClockIdentity,
    pub listener_unique_id: u16,
}

/// What the talker's CONNECT_TX_RESPONSE hands back to be relayed to the
/// controller (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParameters {
    pub stream_id: u64,
    pub dest_mac: MacAddress,
    pub vlan_id: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Connection {
    talker: TalkerStreamId,
    parameters: StreamParameters,
}

/// Per-talker bookkeeping: how many listeners are currently bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TalkerState {
    connection_count: u16,
}

/// The connection table (spec §4.9): at most one inbound connection per
/// listener sink, and an authoritative per-talker `connection_count`.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    listeners: HashMap<ListenerStreamId, Connection>,
    talkers: HashMap<TalkerStreamId, TalkerState>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a talker so it can accept connections and report
    /// bandwidth availability. Talkers with no known bandwidth budget
    /// refuse every connect.
    pub fn register_talker(&mut self, talker: TalkerStreamId) {
        self.talkers.entry(talker).or_default();
    }

    pub fn connection_count(&self, talker: TalkerStreamId) -> u16 {
        self.talkers.get(&talker).map(|t| t.connection_count).unwrap_or(0)
    }

    /// CONNECT_RX, as processed once the nine-way handshake completes and
    /// the talker has supplied stream parameters. Idempotent: connecting
    /// the same listener to the same talker again does not double the
    /// talker's connection_count (spec §8 scenario S4).
    pub fn connect(
        &mut self,
        listener: ListenerStreamId,
        talker: TalkerStreamId,
        parameters: StreamParameters,
        talker_has_bandwidth: bool,
    ) -> Result<AcmpStatus> {
        if !self.talkers.contains_key(&talker) {
            return Ok(AcmpStatus::TalkerUnknownId);
        }
        if let Some(existing) = self.listeners.get(&listener) {
            if existing.talker == talker && existing.parameters == parameters {
                return Ok(AcmpStatus::Success);
            }
            return Ok(AcmpStatus::ListenerExclusive);
        }
        if !talker_has_bandwidth {
            return Ok(AcmpStatus::TalkerNoBandwidth);
        }
        self.listeners.insert(listener, Connection { talker, parameters });
        let talker_state = self
            .talkers
            .get_mut(&talker)
            .ok_or(AvdeccError::NoResources)?;
        talker_state.connection_count += 1;
        Ok(AcmpStatus::Success)
    }

    /// DISCONNECT_RX: tear down a listener's inbound connection,
    /// decrementing the bound talker's connection_count.
    pub fn disconnect(&mut self, listener: ListenerStreamId) -> AcmpStatus {
        match self.listeners.remove(&listener) {
            None => AcmpStatus::ListenerUnknownId,
            Some(connection) => {
                if let Some(talker_state) = self.talkers.get_mut(&connection.talker) {
                    talker_state.connection_count = talker_state.connection_count.saturating_sub(1);
                }
                AcmpStatus::Success
            }
        }
    }

    /// GET_RX_STATE: the talker currently bound to a listener sink, if any.
    pub fn get_rx_state(&self, listener: ListenerStreamId) -> Option<(TalkerStreamId, StreamParameters)> {
        self.listeners.get(&listener).map(|c| (c.talker, c.parameters))
    }

    /// GET_TX_CONNECTION / GET_TX_STATE: how many listeners a talker
    /// currently feeds.
    pub fn get_tx_state(&self, talker: TalkerStreamId) -> u16 {
        self.talkers.get(&talker).map(|t| t.connection_count).unwrap_or(0)
    }
}
