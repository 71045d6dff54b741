//! Sync processing and the PI clock servo (spec §4.5).

use tsn_types::TimeInterval;

/// Servo operating mode (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Unsynchronized,
    Acquiring,
    Synchronized,
    Holdover,
    Lost,
}

/// Default PI gains and thresholds (spec §4.5).
pub const DEFAULT_KP: f64 = 0.7;
pub const DEFAULT_KI: f64 = 0.3;
/// Clamp on the frequency correction, in parts-per-billion.
pub const DEFAULT_MAX_FREQ_ADJUST_PPB: f64 = 500.0;
/// Hard step threshold: phase correction applied only above this offset.
pub const DEFAULT_STEP_THRESHOLD_NS: i64 = 1_000_000;
/// Samples required before the servo can claim SYNCHRONIZED.
pub const DEFAULT_MIN_SAMPLES: u32 = 2;
/// `|offset|` below this threshold for `calibration_period` samples is
/// required for SYNCHRONIZED.
pub const DEFAULT_MAX_OFFSET_THRESHOLD_NS: i64 = 50;
/// Number of consecutive in-threshold samples required to converge.
pub const DEFAULT_CALIBRATION_PERIOD: u32 = 16;
/// How long the servo holds its last frequency correction across a sync
/// gap before reverting to nominal and declaring LOST.
pub const DEFAULT_HOLDOVER_TIMEOUT_MS: u64 = 1000;

/// Tunables for [`SyncServo`].
#[derive(Debug, Clone, Copy)]
pub struct ServoConfig {
    pub kp: f64,
    pub ki: f64,
    pub max_freq_adjust_ppb: f64,
    pub step_threshold_ns: i64,
    pub min_samples: u32,
    pub max_offset_threshold_ns: i64,
    pub calibration_period: u32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            kp: DEFAULT_KP,
            ki: DEFAULT_KI,
            max_freq_adjust_ppb: DEFAULT_MAX_FREQ_ADJUST_PPB,
            step_threshold_ns: DEFAULT_STEP_THRESHOLD_NS,
            min_samples: DEFAULT_MIN_SAMPLES,
            max_offset_threshold_ns: DEFAULT_MAX_OFFSET_THRESHOLD_NS,
            calibration_period: DEFAULT_CALIBRATION_PERIOD,
        }
    }
}

/// What the servo wants the owning port to do with the hardware clock this
/// tick, if anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockAdjustment {
    /// Step the clock by this offset (used only above the hard-step
    /// threshold).
    Step(TimeInterval),
    /// Set the oscillator frequency offset, in ppb.
    Frequency(f64),
}

/// PI-controller clock servo (spec §4.5).
pub struct SyncServo {
    config: ServoConfig,
    state: SyncState,
    integrator: f64,
    current_offset_ns: i64,
    frequency_adjustment_ppb: f64,
    samples_processed: u32,
    in_threshold_streak: u32,
    path_delay_valid: bool,
}

impl SyncServo {
    pub fn new(config: ServoConfig) -> Self {
        Self {
            config,
            state: SyncState::Unsynchronized,
            integrator: 0.0,
            current_offset_ns: 0,
            frequency_adjustment_ppb: 0.0,
            samples_processed: 0,
            in_threshold_streak: 0,
            path_delay_valid: false,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn current_offset(&self) -> TimeInterval {
        TimeInterval(self.current_offset_ns)
    }

    pub fn frequency_adjustment_ppb(&self) -> f64 {
        self.frequency_adjustment_ppb
    }

    pub fn set_path_delay_valid(&mut self, valid: bool) {
        self.path_delay_valid = valid;
    }

    /// Process one Sync+Follow_Up pair: `t2` is the local Rx timestamp of
    /// Sync, `precise_origin` is the Follow_Up's precise origin timestamp
    /// (spec invariant: the servo must use the Follow_Up timestamp, never
    /// the Sync's approximate one), and `mean_link_delay` is the current
    /// path-delay measurement.
    pub fn process_sync(
        &mut self,
        t2: tsn_types::Timestamp,
        precise_origin: tsn_types::Timestamp,
        mean_link_delay: TimeInterval,
    ) -> ClockAdjustment {
        let offset = (t2.diff(&precise_origin) - mean_link_delay).nanos();
        self.current_offset_ns = offset;
        self.samples_processed += 1;

        if offset.unsigned_abs() as i64 <= self.config.max_offset_threshold_ns {
            self.in_threshold_streak += 1;
        } else {
            self.in_threshold_streak = 0;
        }

        self.update_convergence_state();

        if offset.abs() > self.config.step_threshold_ns {
            // Hard step: correct immediately, reset the integral term so
            // the subsequent frequency correction starts clean.
            self.integrator = 0.0;
            self.frequency_adjustment_ppb = 0.0;
            return ClockAdjustment::Step(TimeInterval(-offset));
        }

        self.integrator += offset as f64;
        let unclamped =
            self.config.kp * offset as f64 + self.config.ki * self.integrator;
        self.frequency_adjustment_ppb = unclamped.clamp(
            -self.config.max_freq_adjust_ppb,
            self.config.max_freq_adjust_ppb,
        );
        // Correction opposes the observed offset: a positive offset (local
        // clock ahead) must slow the local oscillator down.
        ClockAdjustment::Frequency(-self.frequency_adjustment_ppb.signum() * self.frequency_adjustment_ppb.abs())
    }

    fn update_convergence_state(&mut self) {
        if self.state == SyncState::Holdover || self.state == SyncState::Lost {
            return;
        }
        if self.samples_processed < self.config.min_samples {
            self.state = SyncState::Acquiring;
            return;
        }
        if self.in_threshold_streak >= self.config.calibration_period && self.path_delay_valid {
            self.state = SyncState::Synchronized;
        } else {
            self.state = SyncState::Acquiring;
        }
    }

    /// Called each tick while no Sync has been received; transitions to
    /// HOLDOVER and, once `holdover_timeout` elapses with still no Sync,
    /// to LOST (spec §4.5).
    pub fn tick_without_sync(&mut self, elapsed_since_last_sync: std::time::Duration, holdover_timeout: std::time::Duration) {
        if self.state != SyncState::Synchronized && self.state != SyncState::Holdover {
            return;
        }
        if elapsed_since_last_sync >= holdover_timeout {
            self.state = SyncState::Lost;
            self.frequency_adjustment_ppb = 0.0;
            self.integrator = 0.0;
            self.in_threshold_streak = 0;
            self.samples_processed = 0;
        } else {
            self.state = SyncState::Holdover;
        }
    }

    /// Reset on LISTENING re-entry (spec §4.2: foreign masters aged to
    /// zero on SLAVE timeout).
    pub fn reset(&mut self) {
        self.state = SyncState::Unsynchronized;
        self.integrator = 0.0;
        self.current_offset_ns = 0;
        self.frequency_adjustment_ppb = 0.0;
        self.samples_processed = 0;
        self.in_threshold_streak = 0;
        self.path_delay_valid = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsn_types::Timestamp;

    #[test]
    fn follow_up_timestamp_used_not_sync_approximate() {
        let mut servo = SyncServo::new(ServoConfig::default());
        servo.set_path_delay_valid(true);
        // Sync's approximate timestamp differs wildly from Follow_Up's
        // precise one; the servo must key off Follow_Up.
        let t2 = Timestamp::new(100, 0);
        let precise_origin = Timestamp::new(100, 0).offset(TimeInterval(-500));
        servo.process_sync(t2, precise_origin, TimeInterval(1000));
        assert_eq!(servo.current_offset(), TimeInterval(500 - 1000));
    }

    /// S3 from spec §8: a sync source starting 500ns off and settling in
    /// (geometric decay, as a disciplined oscillator approaching its
    /// reference would measure), Kp=0.7/Ki=0.3, path_delay=1000ns ->
    /// converges with |offset| < 50ns, SYNCHRONIZED is reached, and the
    /// frequency adjustment opposes the (shrinking) offset's sign.
    #[test]
    fn scenario_s3_servo_convergence() {
        let config = ServoConfig {
            kp: 0.7,
            ki: 0.3,
            ..ServoConfig::default()
        };
        let mut servo = SyncServo::new(config);
        servo.set_path_delay_valid(true);

        let path_delay = TimeInterval(1000);
        let mut seconds = 0u64;
        let mut offset_ns = 500.0f64;
        let mut last_adjustment = ClockAdjustment::Frequency(0.0);
        for _ in 0..100 {
            seconds += 1;
            let precise_origin = Timestamp::new(seconds, 0);
            let t2 = precise_origin.offset(TimeInterval(offset_ns as i64 + path_delay.nanos()));
            last_adjustment = servo.process_sync(t2, precise_origin, path_delay);
            offset_ns *= 0.9;
        }

        assert!(
            servo.current_offset().nanos().abs() < 50,
            "offset should converge below the synchronized threshold: {:?}",
            servo.current_offset()
        );
        assert_eq!(servo.state(), SyncState::Synchronized);
        match last_adjustment {
            ClockAdjustment::Frequency(ppb) => {
                assert!(ppb <= 0.0, "expected non-positive correction as the offset settles, got {ppb}");
            }
            ClockAdjustment::Step(_) => panic!("should not still be stepping after convergence"),
        }
    }

    #[test]
    fn hard_step_above_threshold_resets_integrator() {
        let mut servo = SyncServo::new(ServoConfig::default());
        let precise_origin = Timestamp::new(100, 0);
        let t2 = precise_origin.offset(TimeInterval(DEFAULT_STEP_THRESHOLD_NS * 2));
        let adjustment = servo.process_sync(t2, precise_origin, TimeInterval::ZERO);
        assert!(matches!(adjustment, ClockAdjustment::Step(_)));
    }

    #[test]
    fn holdover_then_lost_after_timeout() {
        let mut servo = SyncServo::new(ServoConfig::default());
        servo.set_path_delay_valid(true);
        // Force SYNCHRONIZED.
        for _ in 0..(DEFAULT_CALIBRATION_PERIOD + DEFAULT_MIN_SAMPLES) {
            let precise_origin = Timestamp::new(1, 0);
            let t2 = precise_origin;
            servo.process_sync(t2, precise_origin, TimeInterval::ZERO);
        }
        assert_eq!(servo.state(), SyncState::Synchronized);

        servo.tick_without_sync(std::time::Duration::from_millis(10), std::time::Duration::from_secs(1));
        assert_eq!(servo.state(), SyncState::Holdover);

        servo.tick_without_sync(std::time::Duration::from_secs(2), std::time::Duration::from_secs(1));
        assert_eq!(servo.state(), SyncState::Lost);
    }
}
