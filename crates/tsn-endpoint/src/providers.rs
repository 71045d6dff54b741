//! Capability-provider interfaces (spec §4.11): `GptpProvider`,
//! `AvdeccProvider`, `AvtpProvider`. [`crate::bridge::EndpointBridge`]
//! owns one of each behind these traits and calls into Milan for MVU
//! handlers and stream events.

use std::time::Duration;

use tsn_types::{ClockIdentity, PortIdentity};

use avdecc::{
    AcmpStatus, AdpMessage, AdpTable, AecpResponder, AecpStatus, ConnectionTable, Descriptor,
    DescriptorRef, EntityModel, ListenerStreamId, StreamParameters, TalkerStreamId,
};
use avtp::AvtpPacket;
use gptp::{HardwareClock, NetworkPort, PortCounters, PortState, PtpPort};

use crate::events::UpwardEvent;

/// Everything the bridge needs from a running gPTP port, with the
/// concrete hardware/network types erased (spec §4.11).
pub trait GptpProvider {
    fn tick(&mut self, dt: Duration) -> gptp::Result<()>;
    fn handle_frame(&mut self, data: &[u8], rx_timestamp: tsn_types::Timestamp) -> gptp::Result<()>;
    fn state(&self) -> PortState;
    fn counters(&self) -> PortCounters;
    fn port_identity(&self) -> PortIdentity;
}

impl<C: HardwareClock, N: NetworkPort> GptpProvider for PtpPort<C, N> {
    fn tick(&mut self, dt: Duration) -> gptp::Result<()> {
        PtpPort::tick(self, dt)
    }

    fn handle_frame(&mut self, data: &[u8], rx_timestamp: tsn_types::Timestamp) -> gptp::Result<()> {
        PtpPort::handle_frame(self, data, rx_timestamp)
    }

    fn state(&self) -> PortState {
        PtpPort::state(self)
    }

    fn counters(&self) -> PortCounters {
        PtpPort::counters(self)
    }

    fn port_identity(&self) -> PortIdentity {
        PtpPort::port_identity(self)
    }
}

/// Discovery/enumeration/connection state a Milan entity needs from the
/// AVDECC layer (spec §4.11).
pub trait AvdeccProvider {
    fn entity_model(&self) -> &EntityModel;
    fn entity_model_mut(&mut self) -> &mut EntityModel;

    /// Advance ADP aging and AECP/ACMP timers by `dt`, surfacing every
    /// resulting upward event (spec §4.9, §6).
    fn tick(&mut self, dt: Duration) -> Vec<UpwardEvent>;

    fn record_adp(&mut self, message: &AdpMessage) -> Option<UpwardEvent>;

    /// ACQUIRE_ENTITY (spec §4.9).
    fn acquire_entity(&mut self, controller: ClockIdentity, release: bool) -> AecpStatus;

    /// LOCK_ENTITY (spec §4.9).
    fn lock_entity(&mut self, controller: ClockIdentity, release: bool) -> AecpStatus;

    /// READ_DESCRIPTOR, returning the descriptor's canonical bytes and its
    /// checksum (spec §4.8, §4.9).
    fn read_descriptor(&self, reference: DescriptorRef) -> avdecc::Result<(&Descriptor, u32)>;

    /// SET_CONFIGURATION, subject to acquire/lock exclusivity (spec §4.9).
    fn set_configuration(&mut self, controller: ClockIdentity, configuration_index: u16) -> AecpStatus;

    fn connect(
        &mut self,
        listener: ListenerStreamId,
        talker: TalkerStreamId,
        parameters: StreamParameters,
        talker_has_bandwidth: bool,
    ) -> avdecc::Result<AcmpStatus>;

    fn disconnect(&mut self, listener: ListenerStreamId) -> AcmpStatus;
}

/// A self-contained AVDECC stack: one entity's descriptor tree plus its
/// ADP/AECP/ACMP runtime state.
pub struct AvdeccStack {
    pub entity_model: EntityModel,
    pub adp: AdpTable,
    pub connections: ConnectionTable,
    pub aecp: AecpResponder,
}

impl AvdeccStack {
    pub fn new(entity_model: EntityModel, advertise_interval: Duration) -> Self {
        Self {
            entity_model,
            adp: AdpTable::new(advertise_interval),
            connections: ConnectionTable::new(),
            aecp: AecpResponder::new(),
        }
    }
}

impl AvdeccProvider for AvdeccStack {
    fn entity_model(&self) -> &EntityModel {
        &self.entity_model
    }

    fn entity_model_mut(&mut self) -> &mut EntityModel {
        &mut self.entity_model
    }

    fn tick(&mut self, dt: Duration) -> Vec<UpwardEvent> {
        self.aecp.tick(dt);
        self.adp.tick(dt).into_iter().map(UpwardEvent::from).collect()
    }

    fn record_adp(&mut self, message: &AdpMessage) -> Option<UpwardEvent> {
        self.adp.record(message).map(|event| UpwardEvent::from((message.entity_id, event)))
    }

    fn acquire_entity(&mut self, controller: ClockIdentity, release: bool) -> AecpStatus {
        self.aecp.acquire_entity(controller, release)
    }

    fn lock_entity(&mut self, controller: ClockIdentity, release: bool) -> AecpStatus {
        self.aecp.lock_entity(controller, release)
    }

    fn read_descriptor(&self, reference: DescriptorRef) -> avdecc::Result<(&Descriptor, u32)> {
        self.aecp.read_descriptor(&self.entity_model, reference)
    }

    fn set_configuration(&mut self, controller: ClockIdentity, configuration_index: u16) -> AecpStatus {
        self.aecp.set_configuration(controller, &mut self.entity_model, configuration_index)
    }

    fn connect(
        &mut self,
        listener: ListenerStreamId,
        talker: TalkerStreamId,
        parameters: StreamParameters,
        talker_has_bandwidth: bool,
    ) -> avdecc::Result<AcmpStatus> {
        self.connections.connect(listener, talker, parameters, talker_has_bandwidth)
    }

    fn disconnect(&mut self, listener: ListenerStreamId) -> AcmpStatus {
        self.connections.disconnect(listener)
    }
}

/// Framing-only AVTP capability: encode/decode packet headers against a
/// fixed MTU (spec §4.7, §4.11). Sample-level payload transport is an
/// external collaborator (spec §1).
pub trait AvtpProvider {
    fn mtu(&self) -> usize;
    fn encode(&self, packet: &AvtpPacket) -> Vec<u8>;
    fn decode(&self, data: &[u8]) -> tsn_types::Result<AvtpPacket>;
}

pub struct DefaultAvtpProvider {
    mtu: usize,
}

impl DefaultAvtpProvider {
    pub fn new(mtu: usize) -> Self {
        Self { mtu }
    }
}

impl Default for DefaultAvtpProvider {
    fn default() -> Self {
        Self::new(avtp::DEFAULT_MTU)
    }
}

impl AvtpProvider for DefaultAvtpProvider {
    fn mtu(&self) -> usize {
        self.mtu
    }

    fn encode(&self, packet: &AvtpPacket) -> Vec<u8> {
        packet.encode()
    }

    fn decode(&self, data: &[u8]) -> tsn_types::Result<AvtpPacket> {
        AvtpPacket::decode(data)
    }
}
