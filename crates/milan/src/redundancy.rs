//! Redundant stream pairs and seamless switchover (spec §4.10, scenario
//! S6).

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{MilanError, Result};

/// Default switchover window (spec §4.10).
pub const DEFAULT_SWITCHOVER_TIMEOUT: Duration = Duration::from_millis(50);
/// Consecutive fresh sequence_nums the primary must present before a
/// listener switches back from SECONDARY (spec §9 open-question
/// resolution, scenario S6).
const CONSECUTIVE_FRESH_TO_RESTORE_PRIMARY: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Primary,
    Secondary,
}

/// What the listener currently reports delivering, or that both sides
/// failed (spec §4.10: "when both fail, the stream is reported DOWN").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Delivering(Source),
    Down,
}

#[derive(Debug, Clone, Copy)]
struct SideWatch {
    last_sequence_num: Option<u32>,
    time_since_fresh: Duration,
}

impl SideWatch {
    fn new() -> Self {
        Self {
            last_sequence_num: None,
            time_since_fresh: Duration::ZERO,
        }
    }

    /// Record a received sequence_num. Returns whether it was fresh
    /// (different from the last one observed).
    fn record(&mut self, sequence_num: u32) -> bool {
        let fresh = self.last_sequence_num != Some(sequence_num);
        if fresh {
            self.last_sequence_num = Some(sequence_num);
            self.time_since_fresh = Duration::ZERO;
        }
        fresh
    }

    fn is_fresh(&self, switchover_timeout: Duration) -> bool {
        self.last_sequence_num.is_some() && self.time_since_fresh < switchover_timeout
    }
}

/// One redundant pair's live switchover state.
pub struct RedundantStream {
    pub primary_stream_id: u64,
    pub secondary_stream_id: u64,
    pub primary_avb_interface_index: u16,
    pub secondary_avb_interface_index: u16,
    pub switchover_timeout: Duration,
    primary: SideWatch,
    secondary: SideWatch,
    active: Source,
    consecutive_fresh_primary: u8,
}

impl RedundantStream {
    fn new(
        primary_stream_id: u64,
        secondary_stream_id: u64,
        primary_avb_interface_index: u16,
        secondary_avb_interface_index: u16,
        switchover_timeout: Duration,
    ) -> Self {
        Self {
            primary_stream_id,
            secondary_stream_id,
            primary_avb_interface_index,
            secondary_avb_interface_index,
            switchover_timeout,
            primary: SideWatch::new(),
            secondary: SideWatch::new(),
            active: Source::Primary,
            consecutive_fresh_primary: 0,
        }
    }

    pub fn active_source(&self) -> Source {
        self.active
    }

    /// Feed a received sequence_num from one side of the pair.
    pub fn record_sequence_num(&mut self, source: Source, sequence_num: u32) {
        let fresh = match source {
            Source::Primary => self.primary.record(sequence_num),
            Source::Secondary => self.secondary.record(sequence_num),
        };

        if matches!(self.active, Source::Secondary) && matches!(source, Source::Primary) {
            if fresh {
                self.consecutive_fresh_primary += 1;
                if self.consecutive_fresh_primary >= CONSECUTIVE_FRESH_TO_RESTORE_PRIMARY {
                    self.active = Source::Primary;
                    self.consecutive_fresh_primary = 0;
                }
            } else {
                self.consecutive_fresh_primary = 0;
            }
        }
    }

    /// Advance the switchover clock and recompute which side is active
    /// (spec §4.10: "consumes whichever stream has presented a fresher
    /// sequence_num within the timeout").
    pub fn tick(&mut self, dt: Duration) -> DeliveryState {
        self.primary.time_since_fresh += dt;
        self.secondary.time_since_fresh += dt;

        if matches!(self.active, Source::Primary) && !self.primary.is_fresh(self.switchover_timeout) {
            if self.secondary.is_fresh(self.switchover_timeout) {
                self.active = Source::Secondary;
                self.consecutive_fresh_primary = 0;
            }
        }

        let primary_alive = self.primary.is_fresh(self.switchover_timeout);
        let secondary_alive = self.secondary.is_fresh(self.switchover_timeout);
        if !primary_alive && !secondary_alive {
            return DeliveryState::Down;
        }
        DeliveryState::Delivering(self.active)
    }
}

/// Owns every configured redundant pair, keyed by primary stream_id
/// (spec §9 open-question resolution: `add_redundant_stream` refuses a
/// duplicate primary rather than silently updating it, unlike
/// `add_media_clock_reference`).
#[derive(Default)]
pub struct RedundancyManager {
    pairs: HashMap<u64, RedundantStream>,
}

impl RedundancyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_redundant_stream(
        &mut self,
        primary_stream_id: u64,
        secondary_stream_id: u64,
        primary_avb_interface_index: u16,
        secondary_avb_interface_index: u16,
        switchover_timeout: Duration,
    ) -> Result<()> {
        if self.pairs.contains_key(&primary_stream_id) {
            return Err(MilanError::DuplicateRedundantStream);
        }
        self.pairs.insert(
            primary_stream_id,
            RedundantStream::new(
                primary_stream_id,
                secondary_stream_id,
                primary_avb_interface_index,
                secondary_avb_interface_index,
                switchover_timeout,
            ),
        );
        Ok(())
    }

    pub fn get_mut(&mut self, primary_stream_id: u64) -> Option<&mut RedundantStream> {
        self.pairs.get_mut(&primary_stream_id)
    }

    pub fn tick_all(&mut self, dt: Duration) -> Vec<(u64, DeliveryState)> {
        self.pairs
            .iter_mut()
            .map(|(&id, pair)| (id, pair.tick(dt)))
            .collect()
    }
}
