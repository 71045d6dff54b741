//! ADP: AVDECC Discovery Protocol (spec §4.9).

use std::collections::HashMap;
use std::time::Duration;

use tsn_types::ClockIdentity;

/// ADP message types (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AdpMessageType {
    EntityAvailable = 0,
    EntityDeparting = 1,
    EntityDiscover = 2,
}

/// Default advertisement interval (spec §4.9).
pub const DEFAULT_ADVERTISE_INTERVAL: Duration = Duration::from_secs(2);
/// Missed advertisements before a remote listener treats an entity as
/// departed (spec §4.9).
pub const MISSED_ADVERTISEMENTS_BEFORE_DEPARTED: u32 = 3;

/// One advertisement as received over the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdpMessage {
    pub message_type: AdpMessageType,
    pub entity_id: ClockIdentity,
    pub entity_model_id: ClockIdentity,
    pub entity_capabilities: u32,
    pub available_index: u32,
    pub valid_time: Duration,
}

/// What changed about a remote entity, as surfaced to upward listeners
/// (spec §4.9, §6: "entity-discovered/updated/departed").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdpEvent {
    Discovered,
    Updated,
    Departed,
}

#[derive(Debug, Clone)]
struct RemoteEntity {
    entity_model_id: ClockIdentity,
    entity_capabilities: u32,
    available_index: u32,
    valid_time: Duration,
    time_since_last_advertisement: Duration,
}

/// Table of remote entities discovered via ADP, and the transmit cadence
/// for this entity's own advertisements (spec §4.9).
pub struct AdpTable {
    remotes: HashMap<ClockIdentity, RemoteEntity>,
    advertise_interval: Duration,
    time_since_last_advertise: Duration,
}

impl AdpTable {
    pub fn new(advertise_interval: Duration) -> Self {
        Self {
            remotes: HashMap::new(),
            advertise_interval,
            // Primed to advertise immediately on first tick.
            time_since_last_advertise: advertise_interval,
        }
    }

    /// Advance the aging clock by `dt`. The age-out deadline is `3 ×
    /// valid_time` after the last advertisement (spec §4.9).
    pub fn tick(&mut self, dt: Duration) -> Vec<(ClockIdentity, AdpEvent)> {
        self.time_since_last_advertise += dt;
        let mut events = Vec::new();
        self.remotes.retain(|&entity_id, remote| {
            remote.time_since_last_advertisement += dt;
            let deadline = remote.valid_time * 3;
            if remote.time_since_last_advertisement > deadline {
                events.push((entity_id, AdpEvent::Departed));
                false
            } else {
                true
            }
        });
        events
    }

    /// Whether it's time to transmit this entity's own ENTITY_AVAILABLE.
    pub fn should_advertise(&mut self) -> bool {
        if self.time_since_last_advertise >= self.advertise_interval {
            self.time_since_last_advertise = Duration::ZERO;
            true
        } else {
            false
        }
    }

    /// Record a received advertisement, returning the event it implies.
    /// `EntityDeparting` always departs immediately rather than waiting
    /// for the miss-count deadline.
    pub fn record(&mut self, message: &AdpMessage) -> Option<AdpEvent> {
        match message.message_type {
            AdpMessageType::EntityDiscover => None,
            AdpMessageType::EntityDeparting => {
                self.remotes.remove(&message.entity_id);
                Some(AdpEvent::Departed)
            }
            AdpMessageType::EntityAvailable => match self.remotes.get_mut(&message.entity_id) {
                None => {
                    self.remotes.insert(
                        message.entity_id,
                        RemoteEntity {
                            entity_model_id: message.entity_model_id,
                            entity_capabilities: message.entity_capabilities,
                            available_index: message.available_index,
                            valid_time: message.valid_time,
                            time_since_last_advertisement: Duration::ZERO,
                        },
                    );
                    Some(AdpEvent::Discovered)
                }
                Some(existing) => {
                    let changed = existing.entity_capabilities != message.entity_capabilities
                        || existing.available_index != message.available_index;
                    existing.entity_capabilities = message.entity_capabilities;
                    existing.available_index = message.available_index;
                    existing.valid_time = message.valid_time;
                    existing.time_since_last_advertisement = Duration::ZERO;
                    changed.then_some(AdpEvent::Updated)
                }
            },
        }
    }

    pub fn len(&self) -> usize {
        self.remotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remotes.is_empty()
    }

    pub fn contains(&self, entity_id: ClockIdentity) -> bool {
        self.remotes.contains_key(&entity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> ClockIdentity {
        ClockIdentity([n; 8])
    }

    fn available(entity_id: ClockIdentity, available_index: u32) -> AdpMessage {
        AdpMessage {
            message_type: AdpMessageType::EntityAvailable,
            entity_id,
            entity_model_id: id(0xAA),
            entity_capabilities: 0,
            available_index,
            valid_time: Duration::from_secs(2),
        }
    }

    #[test]
    fn first_advertisement_discovers() {
        let mut table = AdpTable::new(DEFAULT_ADVERTISE_INTERVAL);
        let event = table.record(&available(id(1), 0));
        assert_eq!(event, Some(AdpEvent::Discovered));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn available_index_change_updates() {
        let mut table = AdpTable::new(DEFAULT_ADVERTISE_INTERVAL);
        table.record(&available(id(1), 0));
        let event = table.record(&available(id(1), 1));
        assert_eq!(event, Some(AdpEvent::Updated));
    }

    #[test]
    fn unchanged_readvertisement_is_silent() {
        let mut table = AdpTable::new(DEFAULT_ADVERTISE_INTERVAL);
        table.record(&available(id(1), 0));
        let event = table.record(&available(id(1), 0));
        assert_eq!(event, None);
    }

    #[test]
    fn ages_out_after_three_missed_intervals() {
        let mut table = AdpTable::new(DEFAULT_ADVERTISE_INTERVAL);
        table.record(&available(id(1), 0));
        let events = table.tick(Duration::from_secs(7)); // > 3 * valid_time(2s)
        assert_eq!(events, vec![(id(1), AdpEvent::Departed)]);
        assert!(table.is_empty());
    }

    #[test]
    fn departing_message_is_immediate() {
        let mut table = AdpTable::new(DEFAULT_ADVERTISE_INTERVAL);
        table.record(&available(id(1), 0));
        let departing = AdpMessage {
            message_type: AdpMessageType::EntityDeparting,
            ..available(id(1), 0)
        };
        let event = table.record(&departing);
        assert_eq!(event, Some(AdpEvent::Departed));
        assert!(!table.contains(id(1)));
    }

    #[test]
    fn advertise_cadence() {
        let mut table = AdpTable::new(Duration::from_secs(2));
        assert!(table.should_advertise()); // primed
        table.tick(Duration::from_millis(500));
        assert!(!table.should_advertise());
    }
}
