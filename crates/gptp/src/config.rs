//! Per-port tunables (spec §3, §4).

use std::time::Duration;

/// Configuration for one [`crate::port::PtpPort`]. Defaults match the
/// values spec §3/§4 name for a Milan-compliant endpoint; callers that need
/// a non-default tuning go through the builder methods rather than
/// constructing the struct literal directly, so new fields don't break
/// existing call sites.
#[derive(Debug, Clone, Copy)]
pub struct PortConfig {
    pub domain_number: u8,
    pub priority1: u8,
    pub priority2: u8,

    pub announce_interval: Duration,
    pub announce_receipt_timeout: u8,
    pub sync_interval: Duration,
    pub sync_receipt_timeout: u8,

    pub foreign_master_capacity: usize,

    pub pdelay_req_interval: Duration,
    pub allowed_lost_responses: u32,
    pub neighbor_prop_delay_thresh_ns: i64,
    pub path_delay_filter_weight: f64,

    pub servo_kp: f64,
    pub servo_ki: f64,
    pub servo_max_freq_adjust_ppb: f64,
    pub servo_step_threshold_ns: i64,

    pub holdover_timeout: Duration,
    /// Milan gPTP-to-gPTP switchover grace period on a redundant interface
    /// (spec §3); not consumed by `gptp` itself but carried here so the
    /// integration layer doesn't need a second per-port config struct.
    pub switchover_timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            domain_number: 0,
            priority1: 248,
            priority2: 248,

            announce_interval: Duration::from_secs(1),
            announce_receipt_timeout: 3,
            sync_interval: Duration::from_millis(125),
            sync_receipt_timeout: 3,

            foreign_master_capacity: crate::bmca::DEFAULT_CAPACITY,

            pdelay_req_interval: Duration::from_secs(1),
            allowed_lost_responses: crate::path_delay::DEFAULT_ALLOWED_LOST_RESPONSES,
            neighbor_prop_delay_thresh_ns: crate::path_delay::DEFAULT_NEIGHBOR_PROP_DELAY_THRESH_NS,
            path_delay_filter_weight: crate::path_delay::DEFAULT_FILTER_WEIGHT,

            servo_kp: crate::servo::DEFAULT_KP,
            servo_ki: crate::servo::DEFAULT_KI,
            servo_max_freq_adjust_ppb: crate::servo::DEFAULT_MAX_FREQ_ADJUST_PPB,
            servo_step_threshold_ns: crate::servo::DEFAULT_STEP_THRESHOLD_NS,

            holdover_timeout: Duration::from_millis(crate::servo::DEFAULT_HOLDOVER_TIMEOUT_MS),
            switchover_timeout: Duration::from_millis(50),
        }
    }
}

impl PortConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain_number(mut self, domain_number: u8) -> Self {
        self.domain_number = domain_number;
        self
    }

    pub fn priorities(mut self, priority1: u8, priority2: u8) -> Self {
        self.priority1 = priority1;
        self.priority2 = priority2;
        self
    }

    pub fn announce_interval(mut self, interval: Duration) -> Self {
        self.announce_interval = interval;
        self
    }

    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    pub fn servo_gains(mut self, kp: f64, ki: f64) -> Self {
        self.servo_kp = kp;
        self.servo_ki = ki;
        self
    }

    fn servo_config(&self) -> crate::servo::ServoConfig {
        crate::servo::ServoConfig {
            kp: self.servo_kp,
            ki: self.servo_ki,
            max_freq_adjust_ppb: self.servo_max_freq_adjust_ppb,
            step_threshold_ns: self.servo_step_threshold_ns,
            ..crate::servo::ServoConfig::default()
        }
    }

    pub(crate) fn build_servo(&self) -> crate::servo::SyncServo {
        crate::servo::SyncServo::new(self.servo_config())
    }

    pub(crate) fn build_path_delay_engine(&self) -> crate::path_delay::PathDelayEngine {
        crate::path_delay::PathDelayEngine::new().with_filter_weight(self.path_delay_filter_weight)
    }

    pub(crate) fn build_foreign_master_store(&self) -> crate::bmca::ForeignMasterStore {
        crate::bmca::ForeignMasterStore::new(self.foreign_master_capacity, self.announce_receipt_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_milan_profile() {
        let config = PortConfig::default();
        assert_eq!(config.announce_interval, Duration::from_secs(1));
        assert_eq!(config.sync_interval, Duration::from_millis(125));
        assert_eq!(config.announce_receipt_timeout, 3);
        assert_eq!(config.switchover_timeout, Duration::from_millis(50));
    }

    #[test]
    fn builder_methods_compose() {
        let config = PortConfig::new()
            .domain_number(1)
            .priorities(100, 200)
            .servo_gains(0.5, 0.1);
        assert_eq!(config.domain_number, 1);
        assert_eq!(config.priority1, 100);
        assert_eq!(config.priority2, 200);
        assert_eq!(config.servo_kp, 0.5);
    }
}
