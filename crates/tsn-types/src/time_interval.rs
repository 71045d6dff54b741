use std::ops::{Add, Neg, Sub};

/// Signed nanosecond interval (PTP `TimeInterval`, carried on the wire as a
/// 64-bit 2^16-scaled fixed point in the `correctionField`; this type holds
/// the already-descaled nanosecond value used throughout the servo and
/// path-delay engines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeInterval(pub i64);

impl TimeInterval {
    pub const ZERO: TimeInterval = TimeInterval(0);

    pub fn nanos(&self) -> i64 {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }
}

impl Add for TimeInterval {
    type Output = TimeInterval;
    fn add(self, rhs: Self) -> Self::Output {
        TimeInterval(self.0.saturating_add(rhs.0))
    }
}

impl Sub for TimeInterval {
    type Output = TimeInterval;
    fn sub(self, rhs: Self) -> Self::Output {
        TimeInterval(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for TimeInterval {
    type Output = TimeInterval;
    fn neg(self) -> Self::Output {
        TimeInterval(-self.0)
    }
}

impl From<i64> for TimeInterval {
    fn from(v: i64) -> Self {
        TimeInterval(v)
    }
}
