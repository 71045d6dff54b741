use crate::error::{Result, WireError};
use crate::time_interval::TimeInterval;

/// 48-bit seconds + 32-bit nanoseconds, as carried by PTP `originTimestamp`/
/// `preciseOriginTimestamp` and AVTP `avtp_timestamp` companions.
///
/// Invariant: `nanoseconds < 1_000_000_000`. Arithmetic saturates at the
/// 48-bit seconds boundary rather than wrapping or panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp {
    seconds: u64,
    nanoseconds: u32,
}

/// Largest value representable in PTP's 48-bit seconds field.
pub const MAX_SECONDS_48: u64 = (1u64 << 48) - 1;
const NANOS_PER_SEC: u64 = 1_000_000_000;

impl Timestamp {
    /// Construct a timestamp, normalizing `nanoseconds >= 1e9` by rolling
    /// the surplus into `seconds` (saturating at the 48-bit boundary).
    pub fn new(seconds: u64, nanoseconds: u32) -> Self {
        let extra_secs = nanoseconds as u64 / NANOS_PER_SEC;
        let nanoseconds = (nanoseconds as u64 % NANOS_PER_SEC) as u32;
        let seconds = seconds.saturating_add(extra_secs).min(MAX_SECONDS_48);
        Self {
            seconds,
            nanoseconds,
        }
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }

    pub const ZERO: Timestamp = Timestamp {
        seconds: 0,
        nanoseconds: 0,
    };

    /// Total nanoseconds since the epoch, saturating on overflow. Used for
    /// difference arithmetic where 48-bit-seconds precision is sufficient
    /// (all differences in this workspace are on the order of seconds).
    fn total_nanos(&self) -> i128 {
        self.seconds as i128 * NANOS_PER_SEC as i128 + self.nanoseconds as i128
    }

    /// `self - other`, as a signed nanosecond interval.
    pub fn diff(&self, other: &Timestamp) -> TimeInterval {
        let delta = self.total_nanos() - other.total_nanos();
        TimeInterval(delta.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// `self + interval`, saturating at zero and at the 48-bit seconds
    /// boundary.
    pub fn offset(&self, interval: TimeInterval) -> Timestamp {
        let total = self.total_nanos() + interval.nanos() as i128;
        let total = total.max(0);
        let seconds = (total / NANOS_PER_SEC as i128).min(MAX_SECONDS_48 as i128) as u64;
        let nanoseconds = (total % NANOS_PER_SEC as i128) as u32;
        Timestamp {
            seconds,
            nanoseconds,
        }
    }

    /// Encode as the 10-byte PTP timestamp wire format: 48-bit seconds
    /// (big-endian, top 16 bits of a u64 dropped) followed by a 32-bit
    /// nanoseconds field.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        let secs = self.seconds.to_be_bytes();
        buf.extend_from_slice(&secs[2..8]); // lower 48 bits
        buf.extend_from_slice(&self.nanoseconds.to_be_bytes());
    }

    /// Decode from the 10-byte PTP timestamp wire format.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 10 {
            return Err(WireError::truncated(10, data));
        }
        let mut secs_buf = [0u8; 8];
        secs_buf[2..8].copy_from_slice(&data[0..6]);
        let seconds = u64::from_be_bytes(secs_buf);
        let mut ns_buf = [0u8; 4];
        ns_buf.copy_from_slice(&data[6..10]);
        let nanoseconds = u32::from_be_bytes(ns_buf);
        if nanoseconds >= NANOS_PER_SEC as u32 {
            return Err(WireError::InvalidValue {
                field: "nanoseconds",
                detail: format!("{} >= 1_000_000_000", nanoseconds),
            });
        }
        Ok(Self {
            seconds,
            nanoseconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nanos_rollover_increments_seconds() {
        let ts = Timestamp::new(10, 999_999_999);
        assert_eq!(ts.seconds(), 10);
        assert_eq!(ts.nanoseconds(), 999_999_999);

        let ts = Timestamp::new(10, 1_000_000_000);
        assert_eq!(ts.seconds(), 11);
        assert_eq!(ts.nanoseconds(), 0);
    }

    #[test]
    fn round_trip_wire_format() {
        let ts = Timestamp::new(123_456, 789_012);
        let mut buf = Vec::new();
        ts.encode(&mut buf);
        assert_eq!(buf.len(), 10);
        let decoded = Timestamp::decode(&buf).unwrap();
        assert_eq!(ts, decoded);
    }

    #[test]
    fn decode_rejects_invalid_nanoseconds() {
        let mut buf = vec![0u8; 6];
        buf.extend_from_slice(&1_000_000_000u32.to_be_bytes());
        assert!(Timestamp::decode(&buf).is_err());
    }

    #[test]
    fn diff_matches_pdelay_example() {
        // S2 from spec: T1=100, T4=250 (ns)
        let t1 = Timestamp::new(0, 100);
        let t4 = Timestamp::new(0, 250);
        assert_eq!(t4.diff(&t1), TimeInterval(150));
    }

    #[test]
    fn saturates_at_48_bit_boundary() {
        let ts = Timestamp::new(MAX_SECONDS_48, 0);
        let bumped = ts.offset(TimeInterval(NANOS_PER_SEC as i64 * 10));
        assert_eq!(bumped.seconds(), MAX_SECONDS_48);
    }
}
