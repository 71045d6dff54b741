//! Foreign-master dataset store and the Best Master Clock Algorithm
//! (spec §4.3).

use std::collections::HashMap;
use std::time::Duration;
use tsn_types::{ClockIdentity, ClockQuality, PortIdentity};

/// Default capacity of the foreign-master store (spec §3).
pub const DEFAULT_CAPACITY: usize = 16;

/// Minimum number of consecutive announces required before a foreign
/// master is `qualified` (spec §4.3).
const QUALIFICATION_THRESHOLD: u32 = 2;

/// A foreign master's advertised dataset, as tracked by the BMCA engine of
/// the port that received it (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignMasterRecord {
    pub port_identity: PortIdentity,
    pub grandmaster_identity: ClockIdentity,
    pub grandmaster_clock_quality: ClockQuality,
    pub priority1: u8,
    pub priority2: u8,
    pub steps_removed: u16,
    pub last_announce_time: Duration,
    pub announce_interval: Duration,
    pub qualified: bool,
    consecutive_announces: u32,
}

impl ForeignMasterRecord {
    fn new(
        port_identity: PortIdentity,
        grandmaster_identity: ClockIdentity,
        grandmaster_clock_quality: ClockQuality,
        priority1: u8,
        priority2: u8,
        steps_removed: u16,
        now: Duration,
        announce_interval: Duration,
    ) -> Self {
        Self {
            port_identity,
            grandmaster_identity,
            grandmaster_clock_quality,
            priority1,
            priority2,
            steps_removed,
            last_announce_time: now,
            announce_interval,
            qualified: false,
            consecutive_announces: 1,
        }
    }

    fn receipt_timeout(&self, announce_receipt_timeout: u8) -> Duration {
        self.announce_interval * announce_receipt_timeout as u32
    }

    /// True if `now - last_announce_time` has exceeded the receipt timeout.
    /// Boundary: at exactly the timeout the record is not yet expired.
    pub fn is_expired(&self, now: Duration, announce_receipt_timeout: u8) -> bool {
        now.saturating_sub(self.last_announce_time) > self.receipt_timeout(announce_receipt_timeout)
    }
}

/// Dataset-comparison outcome (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    ABetter,
    BBetter,
    /// Same grandmaster identity on both sides.
    Error1,
}

/// Input to the dataset comparison: everything BMCA needs, whether it came
/// from a foreign master's Announce or the local clock's own dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dataset {
    pub grandmaster_identity: ClockIdentity,
    pub priority1: u8,
    pub clock_quality: ClockQuality,
    pub priority2: u8,
    pub steps_removed: u16,
}

/// Ordered dataset comparison (spec §4.3): first non-tie wins.
pub fn compare_datasets(a: &Dataset, b: &Dataset) -> Comparison {
    if a.grandmaster_identity == b.grandmaster_identity {
        return Comparison::Error1;
    }
    if a.priority1 != b.priority1 {
        return if a.priority1 < b.priority1 {
            Comparison::ABetter
        } else {
            Comparison::BBetter
        };
    }
    if a.clock_quality.clock_class != b.clock_quality.clock_class {
        return if a.clock_quality.clock_class < b.clock_quality.clock_class {
            Comparison::ABetter
        } else {
            Comparison::BBetter
        };
    }
    if a.clock_quality.clock_accuracy != b.clock_quality.clock_accuracy {
        return if a.clock_quality.clock_accuracy < b.clock_quality.clock_accuracy {
            Comparison::ABetter
        } else {
            Comparison::BBetter
        };
    }
    if a.clock_quality.offset_scaled_log_variance != b.clock_quality.offset_scaled_log_variance {
        return if a.clock_quality.offset_scaled_log_variance
            < b.clock_quality.offset_scaled_log_variance
        {
            Comparison::ABetter
        } else {
            Comparison::BBetter
        };
    }
    if a.priority2 != b.priority2 {
        return if a.priority2 < b.priority2 {
            Comparison::ABetter
        } else {
            Comparison::BBetter
        };
    }
    if a.grandmaster_identity < b.grandmaster_identity {
        Comparison::ABetter
    } else {
        Comparison::BBetter
    }
}

/// Apply the topology tiebreak (spec §4.3): if `steps_removed` differ by at
/// least 2, the shorter path wins outright at the state-decision step, even
/// if the ordered comparison above was a tie on priority/quality.
fn topology_tiebreak(a: &Dataset, b: &Dataset) -> Option<Comparison> {
    let diff = a.steps_removed as i32 - b.steps_removed as i32;
    if diff <= -2 {
        Some(Comparison::ABetter)
    } else if diff >= 2 {
        Some(Comparison::BBetter)
    } else {
        None
    }
}

/// Outcome of a state decision (spec §4.2, §4.3): which role the port
/// should recommend, and (when not MASTER) which foreign master won.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    Master,
    /// `Uncalibrated` until the first valid Sync is processed for this
    /// grandmaster, then the FSM advances to `Slave` (spec §4.2).
    Uncalibrated { grandmaster: PortIdentity },
    Passive,
}

/// Bounded, aged store of foreign-master records, owned exclusively by the
/// BMCA engine of the port that received them (spec §3, §4.3).
#[derive(Debug, Clone)]
pub struct ForeignMasterStore {
    records: HashMap<PortIdentity, ForeignMasterRecord>,
    capacity: usize,
    announce_receipt_timeout: u8,
}

impl ForeignMasterStore {
    pub fn new(capacity: usize, announce_receipt_timeout: u8) -> Self {
        Self {
            records: HashMap::with_capacity(capacity),
            capacity,
            announce_receipt_timeout,
        }
    }

    /// Record a valid Announce. Creates a new record on first sight;
    /// mutates in place on subsequent Announces (spec §3). Qualification
    /// requires `QUALIFICATION_THRESHOLD` consecutive announces.
    pub fn record_announce(
        &mut self,
        port_identity: PortIdentity,
        grandmaster_identity: ClockIdentity,
        grandmaster_clock_quality: ClockQuality,
        priority1: u8,
        priority2: u8,
        steps_removed: u16,
        now: Duration,
        announce_interval: Duration,
    ) {
        if let Some(existing) = self.records.get_mut(&port_identity) {
            existing.grandmaster_identity = grandmaster_identity;
            existing.grandmaster_clock_quality = grandmaster_clock_quality;
            existing.priority1 = priority1;
            existing.priority2 = priority2;
            existing.steps_removed = steps_removed;
            existing.last_announce_time = now;
            existing.announce_interval = announce_interval;
            existing.consecutive_announces += 1;
            if existing.consecutive_announces >= QUALIFICATION_THRESHOLD {
                existing.qualified = true;
            }
            return;
        }

        if self.records.len() >= self.capacity {
            self.evict_oldest_unqualified();
        }

        self.records.insert(
            port_identity,
            ForeignMasterRecord::new(
                port_identity,
                grandmaster_identity,
                grandmaster_clock_quality,
                priority1,
                priority2,
                steps_removed,
                now,
                announce_interval,
            ),
        );
    }

    /// Resource exhaustion policy (spec §7): evict the oldest non-qualified
    /// record to make room. If every record is qualified, the store stays
    /// full and the new master is simply not admitted this cycle.
    fn evict_oldest_unqualified(&mut self) {
        let victim = self
            .records
            .values()
            .filter(|r| !r.qualified)
            .min_by_key(|r| r.last_announce_time)
            .map(|r| r.port_identity);
        if let Some(victim) = victim {
            self.records.remove(&victim);
        }
    }

    /// Age out expired records (spec §4.2: "SLAVE + timeout -> LISTENING;
    /// foreign masters aged to zero").
    pub fn expire(&mut self, now: Duration) {
        self.records
            .retain(|_, r| !r.is_expired(now, self.announce_receipt_timeout));
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForeignMasterRecord> {
        self.records.values()
    }

    /// The best *qualified* foreign master by dataset comparison, or `None`
    /// if there isn't one.
    pub fn best(&self) -> Option<&ForeignMasterRecord> {
        let mut best: Option<&ForeignMasterRecord> = None;
        for record in self.records.values().filter(|r| r.qualified) {
            best = match best {
                None => Some(record),
                Some(current) => {
                    let a = dataset_of(current);
                    let b = dataset_of(record);
                    match compare_datasets(&a, &b) {
                        Comparison::ABetter => Some(current),
                        _ => Some(record),
                    }
                }
            };
        }
        best
    }
}

fn dataset_of(record: &ForeignMasterRecord) -> Dataset {
    Dataset {
        grandmaster_identity: record.grandmaster_identity,
        priority1: record.priority1,
        clock_quality: record.grandmaster_clock_quality,
        priority2: record.priority2,
        steps_removed: record.steps_removed,
    }
}

/// State decision (spec §4.3): given the local clock's dataset and the
/// foreign-master store, decide the recommended port state.
pub fn state_decision(local: &Dataset, store: &ForeignMasterStore) -> Recommendation {
    let Some(best) = store.best() else {
        return Recommendation::Master;
    };
    let best_dataset = dataset_of(best);

    let mut comparison = compare_datasets(local, &best_dataset);
    if let Some(tiebreak) = topology_tiebreak(local, &best_dataset) {
        comparison = tiebreak;
    }

    match comparison {
        Comparison::ABetter => Recommendation::Master,
        Comparison::BBetter => Recommendation::Uncalibrated {
            grandmaster: best.port_identity,
        },
        Comparison::Error1 => Recommendation::Passive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> ClockIdentity {
        ClockIdentity([n; 8])
    }

    fn pi(n: u8) -> PortIdentity {
        PortIdentity::new(id(n), 1)
    }

    #[test]
    fn comparison_is_antisymmetric() {
        let a = Dataset {
            grandmaster_identity: id(1),
            priority1: 128,
            clock_quality: ClockQuality::new(6, 0x20, 100),
            priority2: 128,
            steps_removed: 1,
        };
        let b = Dataset {
            grandmaster_identity: id(2),
            priority1: 100,
            clock_quality: ClockQuality::new(6, 0x20, 100),
            priority2: 128,
            steps_removed: 1,
        };
        assert_eq!(compare_datasets(&a, &b), Comparison::BBetter);
        assert_eq!(compare_datasets(&b, &a), Comparison::ABetter);
    }

    #[test]
    fn same_grandmaster_is_error1() {
        let a = Dataset {
            grandmaster_identity: id(9),
            priority1: 1,
            clock_quality: ClockQuality::default(),
            priority2: 1,
            steps_removed: 0,
        };
        let b = Dataset {
            priority1: 2,
            ..a
        };
        assert_eq!(compare_datasets(&a, &b), Comparison::Error1);
    }

    /// S1 from spec §8: local(248,248) vs foreigns A(p1=128,class=6),
    /// B(p1=128,class=7) -> recommend UNCALIBRATED, winner = A.
    #[test]
    fn scenario_s1_bmca_ordering() {
        let mut store = ForeignMasterStore::new(DEFAULT_CAPACITY, 3);
        let now = Duration::from_secs(10);
        let interval = Duration::from_secs(1);

        // Two consecutive announces each, to qualify.
        for _ in 0..2 {
            store.record_announce(
                pi(1),
                id(1),
                ClockQuality::new(6, 0x20, 100),
                128,
                128,
                1,
                now,
                interval,
            );
            store.record_announce(
                pi(2),
                id(2),
                ClockQuality::new(7, 0x20, 100),
                128,
                128,
                1,
                now,
                interval,
            );
        }

        let local = Dataset {
            grandmaster_identity: id(0xAA),
            priority1: 248,
            clock_quality: ClockQuality::new(248, 0xFE, 0xFFFF),
            priority2: 248,
            steps_removed: 0,
        };

        match state_decision(&local, &store) {
            Recommendation::Uncalibrated { grandmaster } => assert_eq!(grandmaster, pi(1)),
            other => panic!("expected Uncalibrated, got {other:?}"),
        }
    }

    #[test]
    fn no_foreign_masters_recommends_master() {
        let store = ForeignMasterStore::new(DEFAULT_CAPACITY, 3);
        let local = Dataset {
            grandmaster_identity: id(1),
            priority1: 128,
            clock_quality: ClockQuality::default(),
            priority2: 128,
            steps_removed: 0,
        };
        assert_eq!(state_decision(&local, &store), Recommendation::Master);
    }

    #[test]
    fn announce_timeout_boundary() {
        let mut record = ForeignMasterRecord::new(
            pi(1),
            id(1),
            ClockQuality::default(),
            128,
            128,
            0,
            Duration::from_secs(0),
            Duration::from_secs(1),
        );
        record.qualified = true;
        // exactly at N * interval: not yet expired
        assert!(!record.is_expired(Duration::from_secs(3), 3));
        // one tick past: expired
        assert!(record.is_expired(Duration::from_millis(3001), 3));
    }

    #[test]
    fn store_evicts_oldest_unqualified_when_full() {
        let mut store = ForeignMasterStore::new(2, 3);
        let interval = Duration::from_secs(1);
        store.record_announce(
            pi(1),
            id(1),
            ClockQuality::default(),
            128,
            128,
            0,
            Duration::from_secs(1),
            interval,
        );
        store.record_announce(
            pi(2),
            id(2),
            ClockQuality::default(),
            128,
            128,
            0,
            Duration::from_secs(2),
            interval,
        );
        assert_eq!(store.len(), 2);
        store.record_announce(
            pi(3),
            id(3),
            ClockQuality::default(),
            128,
            128,
            0,
            Duration::from_secs(3),
            interval,
        );
        assert_eq!(store.len(), 2);
        assert!(!store.records.contains_key(&pi(1)));
    }
}
