//! Integration bridge (spec §4.11): owns every capability provider and
//! the Milan entity behind generation-checked [`Handle`]s instead of the
//! raw back-pointers a cyclic ownership graph would otherwise need (spec
//! §9 "Cyclic ownership"), and exposes the `tick`/`handle_frame` entry
//! points the cooperative [`crate::engine::Engine`] drives.

use std::time::Duration;

use tracing::{debug, warn};

use tsn_types::{ethertype, ClockIdentity, Timestamp};

use avdecc::codec::{AcmpFrame, AcmpMessageType, AecpPdu, AvdeccPdu};
use avdecc::{AcmpStatus, ListenerStreamId, StreamParameters, TalkerStreamId};
use milan::{MvuCommandType, MediaClockReferenceInfo, MILAN_PROTOCOL_IDENTIFIER, RESPONSE_BIT};

use crate::arena::{Arena, Handle};
use crate::error::{EndpointError, Result};
use crate::events::UpwardEvent;
use crate::milan_entity::MilanEntity;
use crate::providers::{AvdeccProvider, AvtpProvider, GptpProvider};

/// Handle to one registered gPTP port.
pub type GptpPortHandle = Handle<Box<dyn GptpProvider + Send>>;

/// Wires gPTP, AVDECC, AVTP and the Milan entity into one endpoint.
///
/// Registration is fixed-order (spec §4.11: "providers first, then Milan
/// entity initialization, then start"): every `register_*` call after
/// [`Self::start`] fails with [`EndpointError::StartedBeforeRegistration`],
/// and [`Self::start`] itself fails if any mandatory slot is still empty.
pub struct EndpointBridge {
    gptp_ports: Arena<Box<dyn GptpProvider + Send>>,
    avdecc: Option<Box<dyn AvdeccProvider + Send>>,
    avtp: Option<Box<dyn AvtpProvider + Send>>,
    milan: Option<MilanEntity>,
    started: bool,
    pending_responses: Vec<Vec<u8>>,
}

impl Default for EndpointBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointBridge {
    pub fn new() -> Self {
        Self {
            gptp_ports: Arena::new(),
            avdecc: None,
            avtp: None,
            milan: None,
            started: false,
            pending_responses: Vec::new(),
        }
    }

    pub fn register_gptp_port(&mut self, provider: Box<dyn GptpProvider + Send>) -> Result<GptpPortHandle> {
        self.reject_if_started()?;
        Ok(self.gptp_ports.insert(provider))
    }

    pub fn register_avdecc(&mut self, provider: Box<dyn AvdeccProvider + Send>) -> Result<()> {
        self.reject_if_started()?;
        self.avdecc = Some(provider);
        Ok(())
    }

    pub fn register_avtp(&mut self, provider: Box<dyn AvtpProvider + Send>) -> Result<()> {
        self.reject_if_started()?;
        self.avtp = Some(provider);
        Ok(())
    }

    pub fn register_milan(&mut self, milan: MilanEntity) -> Result<()> {
        self.reject_if_started()?;
        self.milan = Some(milan);
        Ok(())
    }

    fn reject_if_started(&self) -> Result<()> {
        if self.started {
            return Err(EndpointError::StartedBeforeRegistration);
        }
        Ok(())
    }

    /// Validates every mandatory provider is registered and flips the
    /// bridge into the running state (spec §4.11).
    pub fn start(&mut self) -> Result<()> {
        if self.gptp_ports.iter_mut().next().is_none() {
            return Err(EndpointError::ProviderNotRegistered("gptp"));
        }
        if self.avdecc.is_none() {
            return Err(EndpointError::ProviderNotRegistered("avdecc"));
        }
        if self.avtp.is_none() {
            return Err(EndpointError::ProviderNotRegistered("avtp"));
        }
        if self.milan.is_none() {
            return Err(EndpointError::ProviderNotRegistered("milan"));
        }
        self.started = true;
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Drains the AECP/MVU response frames accumulated by [`Self::tick`]
    /// and [`Self::handle_frame`] since the last call, ready for the
    /// caller's transport layer to transmit (spec §4.11).
    pub fn take_pending_responses(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.pending_responses)
    }

    /// Advance every cooperating task by `dt` (spec §5): each gPTP port's
    /// FSM/BMCA/servo tick, AVDECC ADP aging and AECP lock renewal, and
    /// the Milan redundancy watchdog.
    pub fn tick(&mut self, dt: Duration) -> Vec<UpwardEvent> {
        let mut events = Vec::new();
        if !self.started {
            return events;
        }

        for port in self.gptp_ports.iter_mut() {
            let before = port.state();
            if let Err(err) = port.tick(dt) {
                warn!(error = %err, "gptp port tick failed");
                events.push(UpwardEvent::FaultOccurred { detail: err.to_string() });
                continue;
            }
            let after = port.state();
            if after != before {
                debug!(?before, ?after, "gptp port state changed");
                events.push(UpwardEvent::SyncStateChanged {
                    port_state: after,
                    offset_ns: 0,
                    freq_adjust_ppb: 0.0,
                });
            }
        }

        if let Some(avdecc) = &mut self.avdecc {
            events.extend(avdecc.tick(dt));
        }

        if let Some(milan) = &mut self.milan {
            for (stream_id, state) in milan.tick(dt) {
                if state == milan::DeliveryState::Down {
                    events.push(UpwardEvent::FaultOccurred {
                        detail: format!("redundant stream {stream_id:#x} has no fresh side"),
                    });
                }
            }
        }

        events
    }

    /// Route one received Ethernet frame by `ethertype` to the owning
    /// layer (spec §6, §4.11). `port` identifies which registered gPTP
    /// port the frame arrived on; it is ignored for AVTP/AVDECC traffic,
    /// which this endpoint treats as a single shared multicast domain.
    pub fn handle_frame(
        &mut self,
        port: GptpPortHandle,
        ethertype: u16,
        payload: &[u8],
        rx_timestamp: Timestamp,
    ) -> Result<Vec<UpwardEvent>> {
        if !self.started {
            return Err(EndpointError::StartedBeforeRegistration);
        }

        match ethertype {
            ethertype::PTP => {
                let gptp_port = self
                    .gptp_ports
                    .get_mut(port)
                    .ok_or(EndpointError::ProviderNotRegistered("gptp"))?;
                gptp_port.handle_frame(payload, rx_timestamp)?;
                Ok(Vec::new())
            }
            ethertype::AVTP => self.handle_avtp_frame(payload),
            _ => Ok(Vec::new()),
        }
    }

    fn handle_avtp_frame(&mut self, payload: &[u8]) -> Result<Vec<UpwardEvent>> {
        use tsn_types::avdecc_subtype;

        match payload.first().copied() {
            Some(avdecc_subtype::ADP) | Some(avdecc_subtype::AECP) | Some(avdecc_subtype::ACMP) => {
                let pdu = AvdeccPdu::decode(payload).map_err(avdecc::AvdeccError::from)?;
                self.dispatch_avdecc_pdu(pdu)
            }
            _ => {
                let avtp = self.avtp.as_ref().ok_or(EndpointError::ProviderNotRegistered("avtp"))?;
                // Header/subtype framing only; sample-level payload
                // transport is an external collaborator (spec §1).
                avtp.decode(payload)?;
                Ok(Vec::new())
            }
        }
    }

    fn dispatch_avdecc_pdu(&mut self, pdu: AvdeccPdu) -> Result<Vec<UpwardEvent>> {
        match pdu {
            AvdeccPdu::Adp(message) => {
                let avdecc = self.avdecc.as_mut().ok_or(EndpointError::ProviderNotRegistered("avdecc"))?;
                Ok(avdecc.record_adp(&message).into_iter().collect())
            }
            AvdeccPdu::Acmp(frame) => self.dispatch_acmp_frame(frame),
            AvdeccPdu::Aecp(AecpPdu::VendorUnique {
                target_entity_id,
                sequence_id,
                protocol_id,
                mvu_command_type,
                payload,
                ..
            }) if protocol_id == MILAN_PROTOCOL_IDENTIFIER => {
                self.dispatch_mvu_command(mvu_command_type, sequence_id, target_entity_id, &payload)
            }
            // Standard AEM commands (ACQUIRE_ENTITY, READ_DESCRIPTOR, ...)
            // are available through `AvdeccProvider`, but without a real
            // transport this bridge has nowhere to route an arbitrary
            // controller request; only Milan's vendor-unique traffic
            // produces upward events here.
            AvdeccPdu::Aecp(_) => Ok(Vec::new()),
        }
    }

    fn dispatch_acmp_frame(&mut self, frame: AcmpFrame) -> Result<Vec<UpwardEvent>> {
        let avdecc = self.avdecc.as_mut().ok_or(EndpointError::ProviderNotRegistered("avdecc"))?;
        match frame.message_type {
            AcmpMessageType::ConnectRxCommand => {
                let listener = ListenerStreamId {
                    listener_entity_id: frame.listener_entity_id,
                    listener_unique_id: frame.listener_unique_id,
                };
                let talker = TalkerStreamId {
                    talker_entity_id: frame.talker_entity_id,
                    talker_unique_id: frame.talker_unique_id,
                };
                let parameters = StreamParameters {
                    stream_id: frame.stream_id,
                    dest_mac: frame.dest_mac,
                    vlan_id: frame.vlan_id,
                };
                // Bandwidth admission lives outside this bridge's scope;
                // assume available (spec §1: AVTP sample-payload
                // transport, which would own a bandwidth budget, is an
                // external collaborator).
                let status = avdecc.connect(listener, talker, parameters, true)?;
                if status == AcmpStatus::Success {
                    Ok(vec![UpwardEvent::StreamConnected {
                        talker: frame.stream_id,
                        listener: frame.stream_id,
                    }])
                } else {
                    Ok(Vec::new())
                }
            }
            AcmpMessageType::DisconnectRxCommand => {
                let listener = ListenerStreamId {
                    listener_entity_id: frame.listener_entity_id,
                    listener_unique_id: frame.listener_unique_id,
                };
                avdecc.disconnect(listener);
                Ok(vec![UpwardEvent::StreamDisconnected { listener: frame.stream_id }])
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Dispatches a Milan vendor-unique AECP command (spec §4.10, §6) and
    /// queues its response for [`Self::take_pending_responses`].
    fn dispatch_mvu_command(
        &mut self,
        mvu_command_type: u16,
        sequence_id: u16,
        target_entity_id: ClockIdentity,
        payload: &[u8],
    ) -> Result<Vec<UpwardEvent>> {
        let milan = self.milan.as_mut().ok_or(EndpointError::ProviderNotRegistered("milan"))?;
        let mut events = Vec::new();

        let (status, response_payload) = match MvuCommandType::from_u16(mvu_command_type) {
            Some(MvuCommandType::GetMilanInfo) => {
                if !milan.is_compliant() {
                    events.push(UpwardEvent::MilanComplianceViolation {
                        reason: "GET_MILAN_INFO served by a non-compliant profile".into(),
                    });
                }
                (avdecc::AecpStatus::Success, milan.get_milan_info().encode())
            }
            Some(MvuCommandType::GetMediaClockReferenceInfo) => {
                let requested = MediaClockReferenceInfo::decode(payload).ok();
                match requested.and_then(|r| milan.media_clock_mut().get(r.clock_domain_index).copied()) {
                    Some(info) => (avdecc::AecpStatus::Success, info.encode()),
                    None => (avdecc::AecpStatus::NoSuchDescriptor, Vec::new()),
                }
            }
            Some(MvuCommandType::SetMediaClockReferenceInfo) => match MediaClockReferenceInfo::decode(payload) {
                Ok(info) => {
                    milan.media_clock_mut().add_media_clock_reference(info);
                    (avdecc::AecpStatus::Success, Vec::new())
                }
                Err(_) => (avdecc::AecpStatus::NoSuchDescriptor, Vec::new()),
            },
            Some(MvuCommandType::SetSystemUniqueId) | Some(MvuCommandType::GetSystemUniqueId) => {
                (avdecc::AecpStatus::Success, Vec::new())
            }
            None => (avdecc::AecpStatus::UnknownCommand, Vec::new()),
        };

        let response = AecpPdu::VendorUnique {
            target_entity_id,
            is_response: true,
            status,
            sequence_id,
            protocol_id: MILAN_PROTOCOL_IDENTIFIER,
            mvu_command_type: mvu_command_type | RESPONSE_BIT,
            payload: response_payload,
        };
        self.pending_responses.push(response.encode());

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tsn_types::PortIdentity;

    use avdecc::{AdpMessage, AdpMessageType, Descriptor, EntityModel};
    use gptp::{PortCounters, PortState};
    use milan::{MemoryNvramStore, MilanInfo, NvramRecord, BASELINE_INTEROPERABILITY, MILAN_BASELINE};

    /// A `GptpProvider` double that never changes state, so bridge tests
    /// can exercise frame/tick routing without pulling in the hardware
    /// clock and network port generics `PtpPort` is parameterized over.
    struct StubGptpPort {
        identity: PortIdentity,
    }

    impl GptpProvider for StubGptpPort {
        fn tick(&mut self, _dt: Duration) -> gptp::Result<()> {
            Ok(())
        }

        fn handle_frame(&mut self, _data: &[u8], _rx_timestamp: Timestamp) -> gptp::Result<()> {
            Ok(())
        }

        fn state(&self) -> PortState {
            PortState::Disabled
        }

        fn counters(&self) -> PortCounters {
            PortCounters::new()
        }

        fn port_identity(&self) -> PortIdentity {
            self.identity
        }
    }

    fn test_port() -> StubGptpPort {
        StubGptpPort { identity: PortIdentity::new(ClockIdentity([1; 8]), 1) }
    }

    fn test_milan() -> MilanEntity {
        MilanEntity::new(
            MilanInfo {
                version: (1, 0),
                capabilities: BASELINE_INTEROPERABILITY,
                features: MILAN_BASELINE,
                certification_level: 0,
                device_name: "TestAmp".into(),
                manufacturer_name: "Acme".into(),
                firmware_version: "1.0.0".into(),
            },
            Box::new(MemoryNvramStore::new(NvramRecord::default())),
        )
    }

    fn entity_model_with_entity() -> EntityModel {
        let mut model = EntityModel::new();
        model.insert(
            0,
            Descriptor::Entity(avdecc::EntityDescriptor {
                entity_id: ClockIdentity([9; 8]),
                entity_model_id: ClockIdentity([9; 8]),
                entity_capabilities: 0,
                talker_stream_sources: 1,
                listener_stream_sinks: 1,
                controller_capabilities: 0,
                available_index: 0,
                entity_name: avdecc::StringRef { strings_descriptor_index: 0, string_index: 0 },
                firmware_version: avdecc::StringRef { strings_descriptor_index: 0, string_index: 1 },
                current_configuration: 0,
            }),
        );
        model
    }

    #[test]
    fn start_before_registration_is_rejected() {
        let mut bridge = EndpointBridge::new();
        assert!(matches!(bridge.start(), Err(EndpointError::ProviderNotRegistered("gptp"))));
    }

    #[test]
    fn registering_after_start_is_rejected() {
        let mut bridge = EndpointBridge::new();
        bridge.register_gptp_port(Box::new(test_port())).unwrap();
        bridge
            .register_avdecc(Box::new(crate::providers::AvdeccStack::new(
                entity_model_with_entity(),
                std::time::Duration::from_secs(2),
            )))
            .unwrap();
        bridge.register_avtp(Box::new(crate::providers::DefaultAvtpProvider::default())).unwrap();
        bridge.register_milan(test_milan()).unwrap();
        bridge.start().unwrap();

        let result = bridge.register_milan(test_milan());
        assert!(matches!(result, Err(EndpointError::StartedBeforeRegistration)));
    }

    #[test]
    fn adp_frame_produces_discovered_event() {
        let mut bridge = EndpointBridge::new();
        let handle = bridge.register_gptp_port(Box::new(test_port())).unwrap();
        bridge
            .register_avdecc(Box::new(crate::providers::AvdeccStack::new(
                entity_model_with_entity(),
                std::time::Duration::from_secs(2),
            )))
            .unwrap();
        bridge.register_avtp(Box::new(crate::providers::DefaultAvtpProvider::default())).unwrap();
        bridge.register_milan(test_milan()).unwrap();
        bridge.start().unwrap();

        let remote = AdpMessage {
            message_type: AdpMessageType::EntityAvailable,
            entity_id: ClockIdentity([5; 8]),
            entity_model_id: ClockIdentity([6; 8]),
            entity_capabilities: 0,
            available_index: 1,
            valid_time: std::time::Duration::from_secs(2),
        };
        let bytes = avdecc::codec::AvdeccPdu::Adp(remote).encode();

        let events = bridge
            .handle_frame(handle, tsn_types::ethertype::AVTP, &bytes, Timestamp::ZERO)
            .unwrap();
        assert_eq!(events, vec![UpwardEvent::EntityDiscovered(ClockIdentity([5; 8]))]);
    }

    #[test]
    fn get_milan_info_queues_a_response() {
        let mut bridge = EndpointBridge::new();
        let handle = bridge.register_gptp_port(Box::new(test_port())).unwrap();
        bridge
            .register_avdecc(Box::new(crate::providers::AvdeccStack::new(
                entity_model_with_entity(),
                std::time::Duration::from_secs(2),
            )))
            .unwrap();
        bridge.register_avtp(Box::new(crate::providers::DefaultAvtpProvider::default())).unwrap();
        bridge.register_milan(test_milan()).unwrap();
        bridge.start().unwrap();

        let command = avdecc::codec::AecpPdu::VendorUnique {
            target_entity_id: ClockIdentity([9; 8]),
            is_response: false,
            status: avdecc::AecpStatus::Success,
            sequence_id: 1,
            protocol_id: MILAN_PROTOCOL_IDENTIFIER,
            mvu_command_type: MvuCommandType::GetMilanInfo as u16,
            payload: Vec::new(),
        };
        let bytes = avdecc::codec::AvdeccPdu::Aecp(command).encode();

        bridge
            .handle_frame(handle, tsn_types::ethertype::AVTP, &bytes, Timestamp::ZERO)
            .unwrap();

        let responses = bridge.take_pending_responses();
        assert_eq!(responses.len(), 1);
        let decoded = avdecc::codec::AecpPdu::decode(&responses[0]).unwrap();
        match decoded {
            avdecc::codec::AecpPdu::VendorUnique { status, mvu_command_type, .. } => {
                assert_eq!(status, avdecc::AecpStatus::Success);
                assert_eq!(mvu_command_type & RESPONSE_BIT, RESPONSE_BIT);
            }
            _ => panic!("expected a vendor-unique response"),
        }
    }
}
