use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A data rate expressed as bits per second(bps).
///
/// Internally the value is tracked as a floating point number for accuracy in the presence of
/// repeated calculations that can yield decimal values, such as the EWMA in the bandwidth
/// estimate.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bitrate(f64);

impl Bitrate {
    /// No bits at all.
    pub const ZERO: Self = Self::new(0);

    /// Creates a bitrate from bits per second.
    pub const fn new(bps: u64) -> Self {
        Bitrate(bps as f64)
    }

    /// Creates a bitrate from kilobits per second.
    pub const fn kbps(kbps: u64) -> Self {
        Self::new(kbps * 10_u64.pow(3))
    }

    /// Creates a bitrate from megabits per second.
    pub const fn mbps(mbps: u64) -> Self {
        Self::new(mbps * 10_u64.pow(6))
    }

    /// Converts a raw transport reading in bytes per second.
    pub fn from_bytes_per_sec(bytes_per_sec: u32) -> Self {
        Bitrate(bytes_per_sec as f64 * 8.0)
    }

    /// The value in bits per second.
    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// The value rounded to the nearest whole bits per second, saturating at both ends.
    ///
    /// Negative values and NaN become 0, values above `u64::MAX` become `u64::MAX`.
    pub fn as_u64(&self) -> u64 {
        if self.0.is_nan() || self.0 <= 0.0 {
            return 0;
        }
        self.0.round().min(u64::MAX as f64) as u64
    }

    /// Same as [`Bitrate::as_u64()`], narrowed to `u32`.
    pub fn as_u32(&self) -> u32 {
        self.as_u64().min(u32::MAX as u64) as u32
    }

    /// Finite and not negative.
    pub fn is_valid(&self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }

    /// Finite and above zero.
    pub fn is_positive(&self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }

    /// Restricts the value to `min..=max`.
    pub fn clamp(&self, min: Self, max: Self) -> Self {
        Self(self.0.clamp(min.0, max.0))
    }

    /// The smaller of two bitrates.
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// The larger of two bitrates.
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }
}

impl From<u64> for Bitrate {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<u32> for Bitrate {
    fn from(value: u32) -> Self {
        Self::new(value as u64)
    }
}

impl From<f64> for Bitrate {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl Add for Bitrate {
    type Output = Bitrate;

    fn add(self, rhs: Self) -> Self::Output {
        Bitrate(self.0 + rhs.0)
    }
}

/// Subtraction saturates at [`Bitrate::ZERO`].
impl Sub for Bitrate {
    type Output = Bitrate;

    fn sub(self, rhs: Self) -> Self::Output {
        Bitrate((self.0 - rhs.0).max(0.0))
    }
}

impl Mul<f64> for Bitrate {
    type Output = Bitrate;

    fn mul(self, rhs: f64) -> Self::Output {
        Bitrate(self.0 * rhs)
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rate = self.0;
        if rate < 1.0 {
            return write!(f, "{rate}bit/s");
        }
        let log = rate.log10().floor() as u64;

        match log {
            0..=2 => write!(f, "{rate}bit/s"),
            3..=5 => write!(f, "{:.3}kbit/s", rate / 10.0_f64.powf(3.0)),
            6..=8 => write!(f, "{:.3}Mbit/s", rate / 10.0_f64.powf(6.0)),
            9..=11 => write!(f, "{:.3}Gbit/s", rate / 10.0_f64.powf(9.0)),
            12.. => write!(f, "{:.3}Tbit/s", rate / 10.0_f64.powf(12.0)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Bitrate;

    #[test]
    fn test_bitrate_display() {
        let rate = Bitrate::new(0);
        assert_eq!(rate.to_string(), "0bit/s");

        let rate = Bitrate::new(123);
        assert_eq!(rate.to_string(), "123bit/s");

        let rate = Bitrate::new(150_000);
        assert_eq!(rate.to_string(), "150.000kbit/s");

        let rate = Bitrate::new(1234567);
        assert_eq!(rate.to_string(), "1.235Mbit/s");

        let rate = Bitrate::new(1234567898);
        assert_eq!(rate.to_string(), "1.235Gbit/s");
    }

    #[test]
    fn test_from_bytes_per_sec() {
        let rate = Bitrate::from_bytes_per_sec(250_000);
        assert_eq!(rate.as_u64(), 2_000_000);
    }

    #[test]
    fn test_as_u32_saturates() {
        assert_eq!(Bitrate::from(-5.0).as_u32(), 0);
        assert_eq!(Bitrate::from(f64::NAN).as_u32(), 0);
        assert_eq!(Bitrate::from(1e12).as_u32(), u32::MAX);
        assert_eq!(Bitrate::from(1_149_999.6).as_u32(), 1_150_000);
    }

    #[test]
    fn test_u64_and_u32_round_alike() {
        for v in [1_149_999.4, 1_149_999.5, 1_800_000.4, 0.4, -0.6] {
            let rate = Bitrate::from(v);
            assert_eq!(rate.as_u64(), rate.as_u32() as u64, "{v}");
        }
        assert_eq!(Bitrate::from(1_149_999.4).as_u64(), 1_149_999);
    }

    #[test]
    fn test_validity() {
        assert!(Bitrate::ZERO.is_valid());
        assert!(!Bitrate::ZERO.is_positive());
        assert!(Bitrate::kbps(1).is_positive());
        for v in [f64::NAN, f64::INFINITY, -1.0] {
            assert!(!Bitrate::from(v).is_valid(), "{v}");
            assert!(!Bitrate::from(v).is_positive(), "{v}");
        }
    }

    #[test]
    fn test_sub_saturates() {
        let rate = Bitrate::kbps(100) - Bitrate::kbps(300);
        assert_eq!(rate, Bitrate::ZERO);
    }
}
