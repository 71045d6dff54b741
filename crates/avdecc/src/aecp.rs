//! AECP: AVDECC Enumeration and Control Protocol (spec §4.9).

use std::collections::HashMap;
use std::time::Duration;

use tsn_types::ClockIdentity;

use crate::entity_model::{Descriptor, DescriptorRef, DescriptorType, EntityModel};
use crate::error::Result;

/// Command types this responder dispatches (spec §4.9). Milan's
/// vendor-unique MVU commands ride inside [`AecpCommandType::VendorUnique`]
/// (spec §6); the `milan` crate owns their sub-dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AecpCommandType {
    ReadDescriptor,
    AcquireEntity,
    LockEntity,
    SetConfiguration,
    GetConfiguration,
    VendorUnique(u64),
}

/// Response status codes (spec §4.9, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AecpStatus {
    Success,
    NotImplemented,
    NoSuchDescriptor,
    EntityAcquired,
    EntityLocked,
    /// Per the standard (spec §9 open-question resolution: the source
    /// returns an empty byte vector for an unrecognized command, which
    /// this implementation does not reproduce).
    UnknownCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireState {
    Free,
    Acquired(ClockIdentity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockState {
    pub holder: ClockIdentity,
    pub time_since_renewal: Duration,
}

/// Renewal window for an entity lock (spec §4.9).
pub const LOCK_RENEWAL_TIMEOUT: Duration = Duration::from_secs(60);
/// Inflight command timeout before a retry (spec §4.9).
pub const COMMAND_TIMEOUT: Duration = Duration::from_millis(250);
/// Retries attempted before a command surfaces as failed (spec §4.9).
pub const MAX_RETRIES: u32 = 3;

/// A command awaiting a response, tracked on the controller side.
struct InflightCommand {
    sequence_id: u16,
    time_since_sent: Duration,
    retries: u32,
}

/// Controller-side AECP state: sequence_id allocation and retry/backoff
/// tracking for commands sent to a remote entity (spec §4.9).
pub struct AecpController {
    next_sequence_id: u16,
    inflight: HashMap<u16, InflightCommand>,
}

impl AecpController {
    pub fn new() -> Self {
        Self {
            next_sequence_id: 0,
            inflight: HashMap::new(),
        }
    }

    /// Allocate a sequence_id for a newly sent command.
    pub fn send(&mut self) -> u16 {
        let sequence_id = self.next_sequence_id;
        self.next_sequence_id = self.next_sequence_id.wrapping_add(1);
        self.inflight.insert(
            sequence_id,
            InflightCommand {
                sequence_id,
                time_since_sent: Duration::ZERO,
                retries: 0,
            },
        );
        sequence_id
    }

    /// A response arrived; the command is no longer inflight.
    pub fn complete(&mut self, sequence_id: u16) {
        self.inflight.remove(&sequence_id);
    }

    /// Advance every inflight command's clock by `dt`. Returns the
    /// sequence_ids that should be retransmitted this tick (their
    /// exponential backoff window elapsed) and, separately, the ones that
    /// exhausted their retry budget and should surface as
    /// `COMMAND_FAILED` (spec §4.9).
    pub fn tick(&mut self, dt: Duration) -> (Vec<u16>, Vec<u16>) {
        let mut retry = Vec::new();
        let mut failed = Vec::new();
        self.inflight.retain(|&sequence_id, command| {
            command.time_since_sent += dt;
            let backoff = COMMAND_TIMEOUT * 2u32.pow(command.retries);
            if command.time_since_sent < backoff {
                return true;
            }
            if command.retries >= MAX_RETRIES {
                failed.push(sequence_id);
                false
            } else {
                command.retries += 1;
                command.time_since_sent = Duration::ZERO;
                retry.push(sequence_id);
                true
            }
        });
        (retry, failed)
    }
}

impl Default for AecpController {
    fn default() -> Self {
        Self::new()
    }
}

/// Responder-side AECP state: dispatches received commands against the
/// local entity model, enforcing acquire/lock exclusivity (spec §4.9).
pub struct AecpResponder {
    acquire: AcquireState,
    lock: Option<LockState>,
}

impl AecpResponder {
    pub fn new() -> Self {
        Self {
            acquire: AcquireState::Free,
            lock: None,
        }
    }

    pub fn acquire_state(&self) -> AcquireState {
        self.acquire
    }

    /// Process an ACQUIRE_ENTITY command from `controller` (spec §4.9:
    /// "persistent controller ownership; releasable only by the acquiring
    /// controller or by priority override").
    pub fn acquire_entity(&mut self, controller: ClockIdentity, release: bool) -> AecpStatus {
        match (self.acquire, release) {
            (AcquireState::Free, false) => {
                self.acquire = AcquireState::Acquired(controller);
                AecpStatus::Success
            }
            (AcquireState::Acquired(holder), false) if holder == controller => AecpStatus::Success,
            (AcquireState::Acquired(_), false) => AecpStatus::EntityAcquired,
            (AcquireState::Acquired(holder), true) if holder == controller => {
                self.acquire = AcquireState::Free;
                AecpStatus::Success
            }
            (AcquireState::Acquired(_), true) => AecpStatus::EntityAcquired,
            (AcquireState::Free, true) => AecpStatus::Success,
        }
    }

    /// Process a LOCK_ENTITY command (spec §4.9: "transient exclusive
    /// access with a 60 s renewal").
    pub fn lock_entity(&mut self, controller: ClockIdentity, release: bool) -> AecpStatus {
        match (&self.lock, release) {
            (None, false) => {
                self.lock = Some(LockState {
                    holder: controller,
                    time_since_renewal: Duration::ZERO,
                });
                AecpStatus::Success
            }
            (Some(lock), false) if lock.holder == controller => {
                self.lock = Some(LockState {
                    holder: controller,
                    time_since_renewal: Duration::ZERO,
                });
                AecpStatus::Success
            }
            (Some(_), false) => AecpStatus::EntityLocked,
            (Some(lock), true) if lock.holder == controller => {
                self.lock = None;
                AecpStatus::Success
            }
            (Some(_), true) => AecpStatus::EntityLocked,
            (None, true) => AecpStatus::Success,
        }
    }

    /// Age the lock; expires on its own after [`LOCK_RENEWAL_TIMEOUT`]
    /// without renewal.
    pub fn tick(&mut self, dt: Duration) {
        if let Some(lock) = &mut self.lock {
            lock.time_since_renewal += dt;
            if lock.time_since_renewal >= LOCK_RENEWAL_TIMEOUT {
                self.lock = None;
            }
        }
    }

    /// A write command (anything mutating the entity model) is only
    /// admitted from the acquiring controller, and never while a
    /// different controller holds the lock (spec §4.9).
    fn admit_write(&self, controller: ClockIdentity) -> Option<AecpStatus> {
        if let AcquireState::Acquired(holder) = self.acquire {
            if holder != controller {
                return Some(AecpStatus::EntityAcquired);
            }
        }
        if let Some(lock) = &self.lock {
            if lock.holder != controller {
                return Some(AecpStatus::EntityLocked);
            }
        }
        None
    }

    /// READ_DESCRIPTOR is always admitted (spec §4.9 only restricts write
    /// commands).
    pub fn read_descriptor<'a>(
        &self,
        model: &'a EntityModel,
        reference: DescriptorRef,
    ) -> Result<(&'a Descriptor, u32)> {
        Ok(model.read_with_checksum(reference)?)
    }

    /// SET_CONFIGURATION: a write command, subject to acquire/lock
    /// exclusivity (spec §4.9, property 6: "no non-acquiring controller's
    /// write command ever yields SUCCESS while an acquire is held").
    pub fn set_configuration(&mut self, controller: ClockIdentity, model: &mut EntityModel, configuration_index: u16) -> AecpStatus {
        if let Some(status) = self.admit_write(controller) {
            return status;
        }
        let reference = DescriptorRef {
            descriptor_type: DescriptorType::Entity,
            descriptor_index: 0,
        };
        if let Some(Descriptor::Entity(entity)) = model.get_mut(reference) {
            entity.current_configuration = configuration_index;
            entity.available_index += 1;
        }
        AecpStatus::Success
    }

    /// Dispatch an arbitrary command type, returning `UnknownCommand` for
    /// anything this responder doesn't recognize rather than an empty
    /// byte vector (spec §9 open-question resolution: follow the
    /// standard).
    pub fn dispatch_unknown(&self, _command_type: AecpCommandType) -> AecpStatus {
        AecpStatus::UnknownCommand
    }
}

impl Default for AecpResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> ClockIdentity {
        ClockIdentity([n; 8])
    }

    #[test]
    fn acquire_excludes_other_controllers() {
        let mut responder = AecpResponder::new();
        assert_eq!(responder.acquire_entity(id(1), false), AecpStatus::Success);
        assert_eq!(responder.acquire_entity(id(2), false), AecpStatus::EntityAcquired);
        assert_eq!(responder.acquire_entity(id(1), false), AecpStatus::Success);
    }

    /// Property 6 from spec §8.
    #[test]
    fn non_acquiring_write_never_succeeds_while_acquired() {
        let mut responder = AecpResponder::new();
        responder.acquire_entity(id(1), false);
        let mut model = EntityModel::new();
        let status = responder.set_configuration(id(2), &mut model, 1);
        assert_eq!(status, AecpStatus::EntityAcquired);
    }

    #[test]
    fn lock_excludes_other_controllers() {
        let mut responder = AecpResponder::new();
        assert_eq!(responder.lock_entity(id(1), false), AecpStatus::Success);
        assert_eq!(responder.lock_entity(id(2), false), AecpStatus::EntityLocked);
    }

    #[test]
    fn lock_expires_after_renewal_timeout() {
        let mut responder = AecpResponder::new();
        responder.lock_entity(id(1), false);
        responder.tick(LOCK_RENEWAL_TIMEOUT + Duration::from_secs(1));
        assert_eq!(responder.lock_entity(id(2), false), AecpStatus::Success);
    }

    #[test]
    fn unknown_command_returns_status_not_empty_payload() {
        let responder = AecpResponder::new();
        assert_eq!(
            responder.dispatch_unknown(AecpCommandType::VendorUnique(0xDEAD)),
            AecpStatus::UnknownCommand
        );
    }

    #[test]
    fn controller_retries_with_backoff_then_fails() {
        let mut controller = AecpController::new();
        let sequence_id = controller.send();
        let mut total_failed = Vec::new();
        for _ in 0..(MAX_RETRIES + 1) {
            let (retry, failed) = controller.tick(COMMAND_TIMEOUT * 16);
            if failed.contains(&sequence_id) {
                total_failed.extend(failed);
                break;
            }
            assert!(retry.is_empty() || retry.contains(&sequence_id));
        }
        assert_eq!(total_failed, vec![sequence_id]);
    }
}
