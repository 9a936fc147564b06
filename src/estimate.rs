use crate::Bitrate;

/// The hysteresis threshold as a fraction of the bandwidth estimate.
pub(crate) const THRESHOLD_RATIO: f64 = 0.75;

/// Default smoothing constant of the low pass filter.
pub const DEFAULT_LOW_PASS_FILTER_SCALAR: f64 = 0.08;

/// A single throughput reading from the transport.
///
/// The transport reports bytes per second, everything in the controller works in bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputSample(Bitrate);

impl ThroughputSample {
    /// Sample from a raw bytes per second reading.
    pub fn from_bytes_per_sec(bytes_per_sec: u32) -> Self {
        ThroughputSample(Bitrate::from_bytes_per_sec(bytes_per_sec))
    }

    /// The sample in bits per second.
    pub fn bitrate(&self) -> Bitrate {
        self.0
    }
}

/// Low pass filtered bandwidth estimate and the threshold derived from it.
///
/// `threshold` is always `THRESHOLD_RATIO * bandwidth`.
#[derive(Debug, Clone)]
pub(crate) struct BandwidthEstimate {
    alpha: f64,
    bandwidth: f64,
    threshold: f64,
}

impl BandwidthEstimate {
    /// The caller guarantees `alpha` is in `(0, 1]`.
    pub fn new(start: Bitrate, alpha: f64) -> Self {
        let mut estimate = BandwidthEstimate {
            alpha,
            bandwidth: 0.0,
            threshold: 0.0,
        };
        estimate.reset(start);
        estimate
    }

    pub fn update(&mut self, sample: ThroughputSample) {
        let value = sample.bitrate().as_f64();
        self.bandwidth = value * self.alpha + self.bandwidth * (1.0 - self.alpha);
        self.threshold = self.bandwidth * THRESHOLD_RATIO;
    }

    pub fn reset(&mut self, bitrate: Bitrate) {
        self.bandwidth = bitrate.as_f64();
        self.threshold = self.bandwidth * THRESHOLD_RATIO;
    }

    pub fn bandwidth(&self) -> Bitrate {
        self.bandwidth.into()
    }

    pub fn threshold(&self) -> Bitrate {
        self.threshold.into()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample(bps: u32) -> ThroughputSample {
        ThroughputSample::from_bytes_per_sec(bps / 8)
    }

    #[test]
    fn seeded_from_start_bitrate() {
        let e = BandwidthEstimate::new(Bitrate::mbps(1), DEFAULT_LOW_PASS_FILTER_SCALAR);
        assert_eq!(e.bandwidth().as_f64(), 1_000_000.0);
        assert_eq!(e.threshold().as_f64(), 750_000.0);
    }

    #[test]
    fn single_update_is_weighted() {
        let mut e = BandwidthEstimate::new(Bitrate::mbps(1), DEFAULT_LOW_PASS_FILTER_SCALAR);
        e.update(sample(2_000_000));

        // 2M * 0.08 + 1M * 0.92
        assert!((e.bandwidth().as_f64() - 1_080_000.0).abs() < 1e-6);
        assert!((e.threshold().as_f64() - 810_000.0).abs() < 1e-6);
    }

    #[test]
    fn converges_to_constant_sample() {
        let mut e = BandwidthEstimate::new(Bitrate::kbps(300), DEFAULT_LOW_PASS_FILTER_SCALAR);

        for _ in 0..1000 {
            e.update(sample(4_000_000));
            assert_eq!(e.threshold().as_f64(), e.bandwidth().as_f64() * 0.75);
        }

        assert!((e.bandwidth().as_f64() - 4_000_000.0).abs() < 1e-3);
    }

    #[test]
    fn alpha_one_tracks_raw_sample() {
        let mut e = BandwidthEstimate::new(Bitrate::mbps(1), 1.0);
        e.update(sample(640_000));
        assert_eq!(e.bandwidth().as_f64(), 640_000.0);
    }

    #[test]
    fn reset_reseeds() {
        let mut e = BandwidthEstimate::new(Bitrate::mbps(1), DEFAULT_LOW_PASS_FILTER_SCALAR);
        e.update(sample(8_000_000));
        e.reset(Bitrate::mbps(2));
        assert_eq!(e.bandwidth().as_f64(), 2_000_000.0);
        assert_eq!(e.threshold().as_f64(), 1_500_000.0);
    }
}
