/// `(clock_class, clock_accuracy, offset_scaled_log_variance)`.
///
/// `Ord` is derived field-by-field in the order the BMCA dataset comparison
/// (spec §4.3) consults them, and lower values win at each step — so
/// `a < b` means `a` is the *better* (more trustworthy) clock quality, not
/// numerically smaller-is-lesser in the usual sense. Callers doing BMCA
/// comparisons can rely on `Ord` directly for this one step; the full
/// dataset comparison in `gptp::bmca` also consults priority1/priority2 and
/// grandmaster identity, which live outside this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockQuality {
    pub clock_class: u8,
    pub clock_accuracy: u8,
    pub offset_scaled_log_variance: u16,
}

impl ClockQuality {
    pub fn new(clock_class: u8, clock_accuracy: u8, offset_scaled_log_variance: u16) -> Self {
        Self {
            clock_class,
            clock_accuracy,
            offset_scaled_log_variance,
        }
    }

    /// clock_class reserved for a free-running / unsynchronized clock per
    /// IEEE 1588, used as the default for a port that has never acquired
    /// time from anywhere.
    pub const DEFAULT_CLOCK_CLASS: u8 = 248;
    /// Default "unknown" accuracy.
    pub const DEFAULT_CLOCK_ACCURACY: u8 = 0xFE;
    /// Default offsetScaledLogVariance for a clock with no measured
    /// stability figure.
    pub const DEFAULT_OFFSET_SCALED_LOG_VARIANCE: u16 = 0xFFFF;
}

impl Default for ClockQuality {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_CLOCK_CLASS,
            Self::DEFAULT_CLOCK_ACCURACY,
            Self::DEFAULT_OFFSET_SCALED_LOG_VARIANCE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_class_is_better_ordering() {
        let good = ClockQuality::new(6, 0x20, 100);
        let worse = ClockQuality::new(7, 0x20, 100);
        assert!(good < worse);
    }

    #[test]
    fn class_dominates_accuracy() {
        let a = ClockQuality::new(6, 0xFE, 0);
        let b = ClockQuality::new(7, 0x00, 0);
        assert!(a < b, "clock_class must be compared before clock_accuracy");
    }
}
