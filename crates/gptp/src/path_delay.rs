//! Peer-to-peer path-delay mechanism (spec §4.4).

use std::collections::HashMap;
use tsn_types::{PortIdentity, TimeInterval, Timestamp};

/// Valid range for the neighbor rate ratio (spec §3, §4.4).
pub const NEIGHBOR_RATE_RATIO_RANGE: std::ops::RangeInclusive<f64> = 0.998..=1.002;

/// Default EMA filter weight for mean link delay (spec §4.4).
pub const DEFAULT_FILTER_WEIGHT: f64 = 1.0 / 8.0;

/// Default threshold beyond which a link is considered no longer
/// `as_capable` (spec §4.4): 800 microseconds.
pub const DEFAULT_NEIGHBOR_PROP_DELAY_THRESH_NS: i64 = 800_000;

/// Default number of consecutive lost responses tolerated before the path
/// is declared unmeasured (spec §4.4).
pub const DEFAULT_ALLOWED_LOST_RESPONSES: u32 = 3;

/// Milan cessation threshold: consecutive exchanges answered by distinct
/// responders before the initiator must stop sending PDelay_Req on this
/// link (spec §4.4).
pub const DEFAULT_MULTIPLE_RESPONSE_CEASE_THRESHOLD: u32 = 3;

/// A completed (or filtered) path-delay measurement (spec §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathDelayMeasurement {
    pub mean_link_delay: TimeInterval,
    pub neighbor_rate_ratio: f64,
    pub valid: bool,
    pub sequence_id: u16,
}

impl Default for PathDelayMeasurement {
    fn default() -> Self {
        Self {
            mean_link_delay: TimeInterval::ZERO,
            neighbor_rate_ratio: 1.0,
            valid: false,
            sequence_id: 0,
        }
    }
}

/// The four timestamps of one PDelay exchange, from the initiator's point
/// of view (spec §4.4).
#[derive(Debug, Clone, Copy, Default)]
struct Exchange {
    t1: Option<Timestamp>,
    t2: Option<Timestamp>,
    t3: Option<Timestamp>,
    t4: Option<Timestamp>,
    responder: Option<PortIdentity>,
}

/// Result of feeding a completed exchange into the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathDelayOutcome {
    /// A new mean link delay was computed and filtered in.
    Updated(PathDelayMeasurement),
    /// The neighbor rate ratio fell outside its valid range; the filter
    /// was reset and the measurement discarded.
    RateRatioOutOfRange,
}

/// Events the engine's tick/timeout logic can raise, for the owning port's
/// fault/counter handling (spec §4.4, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathDelayEvent {
    /// More than `allowed_lost_responses` consecutive timeouts: path is
    /// unmeasured.
    PathDelayLost,
    /// Milan cessation: the same sequence elicited distinct responders too
    /// many times in a row; stop transmitting until operator reset.
    MultipleResponsesCeaseTransmission,
}

/// Path-delay initiator/responder state for one link (spec §4.4).
pub struct PathDelayEngine {
    filter_weight: f64,
    neighbor_prop_delay_thresh_ns: i64,
    allowed_lost_responses: u32,
    multiple_response_cease_threshold: u32,

    current: Exchange,
    prior_t2: Option<Timestamp>,
    prior_t3: Option<Timestamp>,

    measurement: PathDelayMeasurement,
    as_capable: bool,
    consecutive_lost: u32,
    consecutive_multi_response: u32,
    ceased: bool,
    next_sequence_id: u16,
}

impl PathDelayEngine {
    pub fn new() -> Self {
        Self {
            filter_weight: DEFAULT_FILTER_WEIGHT,
            neighbor_prop_delay_thresh_ns: DEFAULT_NEIGHBOR_PROP_DELAY_THRESH_NS,
            allowed_lost_responses: DEFAULT_ALLOWED_LOST_RESPONSES,
            multiple_response_cease_threshold: DEFAULT_MULTIPLE_RESPONSE_CEASE_THRESHOLD,
            current: Exchange::default(),
            prior_t2: None,
            prior_t3: None,
            measurement: PathDelayMeasurement::default(),
            as_capable: true,
            consecutive_lost: 0,
            consecutive_multi_response: 0,
            ceased: false,
            next_sequence_id: 0,
        }
    }

    pub fn with_filter_weight(mut self, weight: f64) -> Self {
        self.filter_weight = weight;
        self
    }

    pub fn as_capable(&self) -> bool {
        self.as_capable && !self.ceased
    }

    pub fn measurement(&self) -> PathDelayMeasurement {
        self.measurement
    }

    /// Allocate the sequence_id for the next PDelay_Req, if transmission
    /// isn't ceased.
    pub fn next_request(&mut self) -> Option<u16> {
        if self.ceased {
            return None;
        }
        let seq = self.next_sequence_id;
        self.next_sequence_id = self.next_sequence_id.wrapping_add(1);
        self.current = Exchange::default();
        Some(seq)
    }

    /// Initiator: record T1 at the moment the PDelay_Req was transmitted.
    pub fn record_t1(&mut self, t1: Timestamp) {
        self.current.t1 = Some(t1);
    }

    /// Initiator: record T4 (local Rx of PDelay_Resp) and T2 (conveyed by
    /// PDelay_Resp) from a given responder. PDelay_Resp and its Follow_Up
    /// must pair strictly in arrival order (spec §5); a response from a
    /// responder that doesn't match the in-flight exchange is treated as
    /// the "multiple distinct responders" case Milan requires cessation
    /// for.
    pub fn record_resp(&mut self, responder: PortIdentity, t2: Timestamp, t4: Timestamp) {
        match self.current.responder {
            None => {
                self.current.responder = Some(responder);
                self.current.t2 = Some(t2);
                self.current.t4 = Some(t4);
                self.consecutive_multi_response = 0;
            }
            Some(existing) if existing == responder => {
                self.current.t2 = Some(t2);
                self.current.t4 = Some(t4);
            }
            Some(_) => {
                self.consecutive_multi_response += 1;
                if self.consecutive_multi_response >= self.multiple_response_cease_threshold {
                    self.ceased = true;
                }
            }
        }
    }

    /// Initiator: record T3 from the PDelay_Resp_Follow_Up, and if the
    /// exchange is now complete, compute mean link delay and neighbor rate
    /// ratio, returning the outcome. Follow_Up-before-Resp (no prior T2) is
    /// dropped (spec §5 ordering guarantee).
    pub fn record_follow_up(&mut self, responder: PortIdentity, t3: Timestamp) -> Option<PathDelayOutcome> {
        if self.current.responder != Some(responder) || self.current.t2.is_none() {
            return None;
        }
        self.current.t3 = Some(t3);
        self.complete_exchange()
    }

    fn complete_exchange(&mut self) -> Option<PathDelayOutcome> {
        let (t1, t2, t3, t4) = (
            self.current.t1?,
            self.current.t2?,
            self.current.t3?,
            self.current.t4?,
        );
        self.consecutive_lost = 0;

        let ratio = match (self.prior_t2, self.prior_t3) {
            (Some(prior_t2), Some(prior_t3)) => {
                let dt2 = t2.diff(&prior_t2).nanos() as f64;
                let dt3 = t3.diff(&prior_t3).nanos() as f64;
                if dt2 != 0.0 {
                    Some(dt3 / dt2)
                } else {
                    None
                }
            }
            _ => None,
        };
        self.prior_t2 = Some(t2);
        self.prior_t3 = Some(t3);

        if let Some(ratio) = ratio {
            if !NEIGHBOR_RATE_RATIO_RANGE.contains(&ratio) {
                self.measurement = PathDelayMeasurement::default();
                self.prior_t2 = None;
                self.prior_t3 = None;
                return Some(PathDelayOutcome::RateRatioOutOfRange);
            }
            self.measurement.neighbor_rate_ratio = ratio;
        }

        let raw_delay = mean_link_delay(t1, t2, t3, t4);
        let filtered = if self.measurement.valid {
            ema(self.measurement.mean_link_delay.nanos(), raw_delay, self.filter_weight)
        } else {
            raw_delay
        };

        self.measurement.mean_link_delay = TimeInterval(filtered);
        self.measurement.valid = true;
        self.measurement.sequence_id = self.measurement.sequence_id.wrapping_add(1);

        self.as_capable = filtered.abs() <= self.neighbor_prop_delay_thresh_ns;

        Some(PathDelayOutcome::Updated(self.measurement))
    }

    /// No response (or incomplete exchange) by the time the request's
    /// retry window elapsed. Returns `PathDelayLost` once the loss streak
    /// crosses `allowed_lost_responses`.
    pub fn record_timeout(&mut self) -> Option<PathDelayEvent> {
        self.consecutive_lost += 1;
        self.current = Exchange::default();
        if self.consecutive_lost > self.allowed_lost_responses {
            self.measurement.valid = false;
            self.as_capable = false;
            Some(PathDelayEvent::PathDelayLost)
        } else {
            None
        }
    }

    /// Operator reset after a Milan cessation event.
    pub fn reset_cessation(&mut self) {
        self.ceased = false;
        self.consecutive_multi_response = 0;
    }
}

impl Default for PathDelayEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean one-way delay (spec §4.4): `((T4-T1) - (T3-T2)) / 2`.
fn mean_link_delay(t1: Timestamp, t2: Timestamp, t3: Timestamp, t4: Timestamp) -> i64 {
    let forward = t4.diff(&t1).nanos();
    let turnaround = t3.diff(&t2).nanos();
    (forward - turnaround) / 2
}

fn ema(prior: i64, sample: i64, weight: f64) -> i64 {
    ((1.0 - weight) * prior as f64 + weight * sample as f64).trunc() as i64
}

/// Per-link path-delay engines, keyed by peer port identity, for
/// multi-port or multi-peer deployments.
pub type PathDelayByPeer = HashMap<PortIdentity, PathDelayEngine>;

#[cfg(test)]
mod tests {
    use super::*;
    use tsn_types::ClockIdentity;

    fn responder() -> PortIdentity {
        PortIdentity::new(ClockIdentity([2; 8]), 1)
    }

    /// S2 from spec §8: T1=100, T2=10050, T3=10100, T4=250 (ns);
    /// mean_link_delay = 50ns. After EMA (weight 1/8) over prior 40ns ->
    /// 41ns (truncated).
    #[test]
    fn scenario_s2_pdelay_filter() {
        assert_eq!(
            mean_link_delay(
                Timestamp::new(0, 100),
                Timestamp::new(0, 10050),
                Timestamp::new(0, 10100),
                Timestamp::new(0, 250),
            ),
            50
        );
        assert_eq!(ema(40, 50, 1.0 / 8.0), 41);
    }

    #[test]
    fn full_exchange_produces_measurement() {
        let mut engine = PathDelayEngine::new();
        engine.next_request();
        engine.record_t1(Timestamp::new(0, 100));
        engine.record_resp(responder(), Timestamp::new(0, 10050), Timestamp::new(0, 250));
        let outcome = engine.record_follow_up(responder(), Timestamp::new(0, 10100));
        match outcome {
            Some(PathDelayOutcome::Updated(m)) => {
                assert_eq!(m.mean_link_delay, TimeInterval(50));
                assert!(m.valid);
            }
            other => panic!("expected Updated, got {other:?}"),
        }
    }

    #[test]
    fn follow_up_without_prior_resp_is_dropped() {
        let mut engine = PathDelayEngine::new();
        engine.next_request();
        engine.record_t1(Timestamp::new(0, 100));
        // No record_resp call.
        let outcome = engine.record_follow_up(responder(), Timestamp::new(0, 10100));
        assert!(outcome.is_none());
    }

    #[test]
    fn rate_ratio_out_of_range_resets_filter() {
        let mut engine = PathDelayEngine::new();
        // First exchange seeds prior_t2/prior_t3.
        engine.next_request();
        engine.record_t1(Timestamp::new(0, 0));
        engine.record_resp(responder(), Timestamp::new(1, 0), Timestamp::new(1, 100));
        engine.record_follow_up(responder(), Timestamp::new(1, 50));

        // Second exchange: t3 delta wildly different from t2 delta.
        engine.next_request();
        engine.record_t1(Timestamp::new(2, 0));
        engine.record_resp(responder(), Timestamp::new(2, 0), Timestamp::new(2, 100));
        let outcome = engine.record_follow_up(responder(), Timestamp::new(10, 0));
        assert_eq!(outcome, Some(PathDelayOutcome::RateRatioOutOfRange));
        assert!(!engine.measurement().valid);
    }

    #[test]
    fn lost_responses_beyond_threshold_mark_unmeasured() {
        let mut engine = PathDelayEngine::new();
        for _ in 0..DEFAULT_ALLOWED_LOST_RESPONSES {
            assert_eq!(engine.record_timeout(), None);
        }
        assert_eq!(engine.record_timeout(), Some(PathDelayEvent::PathDelayLost));
        assert!(!engine.as_capable());
    }

    #[test]
    fn milan_cessation_on_repeated_distinct_responders() {
        let mut engine = PathDelayEngine::new();
        let other = PortIdentity::new(ClockIdentity([3; 8]), 1);
        engine.record_resp(responder(), Timestamp::new(0, 0), Timestamp::new(0, 1));
        for _ in 0..DEFAULT_MULTIPLE_RESPONSE_CEASE_THRESHOLD {
            engine.record_resp(other, Timestamp::new(0, 0), Timestamp::new(0, 1));
        }
        assert!(!engine.as_capable());
        engine.reset_cessation();
        assert!(engine.as_capable());
    }
}
