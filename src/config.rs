use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::estimate::DEFAULT_LOW_PASS_FILTER_SCALAR;
use crate::profile::ProfileCatalog;
use crate::window::DEFAULT_WINDOW_CAPACITY;
use crate::{AbrController, AbrError, Bitrate};

/// Default fixed step of the increase path.
pub const DEFAULT_INCREASE_STEP: Bitrate = Bitrate::kbps(150);

/// Default proportional factor of the decrease path.
pub const DEFAULT_DECREASE_FACTOR: f64 = 0.2;

/// Default minimum time between two adjustments.
pub const DEFAULT_COOLDOWN_PERIOD: Duration = Duration::from_secs(3);

/// Customized config for creating an [`AbrController`] instance.
///
/// ```
/// use std::time::Duration;
/// use ratesteer::{AbrConfig, Bitrate};
///
/// let abr = AbrConfig::new()
///     .set_start_bitrate(Bitrate::mbps(1))
///     .set_target_bitrate(Bitrate::mbps(5))
///     .set_cooldown_period(Duration::from_secs(2))
///     .build()
///     .unwrap();
/// ```
///
/// The config is (de)serializable so it can be part of a host's own configuration file.
/// Missing fields take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbrConfig {
    pub(crate) start_bitrate: Bitrate,
    pub(crate) target_bitrate: Bitrate,
    pub(crate) cooldown_period: Duration,
    pub(crate) low_pass_filter_scalar: f64,
    pub(crate) increase_step: Bitrate,
    pub(crate) decrease_factor: f64,
    pub(crate) min_bitrate: Bitrate,
    pub(crate) window_capacity: usize,
    pub(crate) catalog: ProfileCatalog,
}

impl AbrConfig {
    /// Creates a new default config.
    pub fn new() -> Self {
        AbrConfig::default()
    }

    /// The bitrate the stream starts at. Seeds the bandwidth estimate and the initial profile.
    pub fn start_bitrate(&self) -> Bitrate {
        self.start_bitrate
    }

    /// Set the bitrate the stream starts at.
    ///
    /// Defaults to 1Mbit/s.
    pub fn set_start_bitrate(mut self, bitrate: Bitrate) -> Self {
        self.start_bitrate = bitrate;
        self
    }

    /// Upper bound for the increase path.
    pub fn target_bitrate(&self) -> Bitrate {
        self.target_bitrate
    }

    /// Set the upper bound for the increase path. Must not be zero.
    ///
    /// Defaults to 5Mbit/s.
    pub fn set_target_bitrate(mut self, bitrate: Bitrate) -> Self {
        self.target_bitrate = bitrate;
        self
    }

    /// Minimum time between two adjustments.
    pub fn cooldown_period(&self) -> Duration {
        self.cooldown_period
    }

    /// Set the minimum time between two adjustments.
    ///
    /// Defaults to 3 seconds.
    pub fn set_cooldown_period(mut self, period: Duration) -> Self {
        self.cooldown_period = period;
        self
    }

    /// Smoothing constant of the bandwidth estimate.
    pub fn low_pass_filter_scalar(&self) -> f64 {
        self.low_pass_filter_scalar
    }

    /// Set the smoothing constant of the bandwidth estimate. Must lie in `(0, 1]`, where
    /// higher values follow the raw samples more closely.
    ///
    /// Defaults to 0.08.
    pub fn set_low_pass_filter_scalar(mut self, alpha: f64) -> Self {
        self.low_pass_filter_scalar = alpha;
        self
    }

    /// Fixed step added by the increase path.
    pub fn increase_step(&self) -> Bitrate {
        self.increase_step
    }

    /// Set the fixed step added by the increase path. Must not be zero.
    ///
    /// Defaults to 150kbit/s.
    pub fn set_increase_step(mut self, step: Bitrate) -> Self {
        self.increase_step = step;
        self
    }

    /// Share of the gap between bitrate and bandwidth removed by the decrease path.
    pub fn decrease_factor(&self) -> f64 {
        self.decrease_factor
    }

    /// Set the share of the gap between bitrate and bandwidth removed by the decrease path.
    /// Must lie in `(0, 1]`.
    ///
    /// Defaults to 0.2.
    pub fn set_decrease_factor(mut self, factor: f64) -> Self {
        self.decrease_factor = factor;
        self
    }

    /// Floor for the decrease path.
    pub fn min_bitrate(&self) -> Bitrate {
        self.min_bitrate
    }

    /// Set a floor for the decrease path. A decrease that would go at or above the current
    /// bitrate because of the floor is not applied.
    ///
    /// Defaults to zero.
    pub fn set_min_bitrate(mut self, bitrate: Bitrate) -> Self {
        self.min_bitrate = bitrate;
        self
    }

    /// Number of samples averaged for the decrease decision.
    pub fn window_capacity(&self) -> usize {
        self.window_capacity
    }

    /// Set the number of samples averaged for the decrease decision. Must not be zero.
    ///
    /// Defaults to 10.
    pub fn set_window_capacity(mut self, capacity: usize) -> Self {
        self.window_capacity = capacity;
        self
    }

    /// The tiers profiles are selected from.
    pub fn catalog(&self) -> &ProfileCatalog {
        &self.catalog
    }

    /// Set the tiers profiles are selected from.
    ///
    /// Defaults to [`ProfileCatalog::default()`].
    pub fn set_catalog(mut self, catalog: ProfileCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), AbrError> {
        let alpha = self.low_pass_filter_scalar;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(AbrError::InvalidLowPassFilterScalar(alpha));
        }

        let factor = self.decrease_factor;
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(AbrError::InvalidDecreaseFactor(factor));
        }

        if !self.target_bitrate.is_positive() {
            return Err(AbrError::InvalidTargetBitrate(self.target_bitrate));
        }

        if !self.increase_step.is_positive() {
            return Err(AbrError::InvalidIncreaseStep(self.increase_step));
        }

        if !self.start_bitrate.is_valid() {
            return Err(AbrError::InvalidStartBitrate(self.start_bitrate));
        }

        if !self.min_bitrate.is_valid() {
            return Err(AbrError::InvalidMinBitrate(self.min_bitrate));
        }

        if self.window_capacity == 0 {
            return Err(AbrError::ZeroWindowCapacity);
        }

        Ok(())
    }

    /// Create a [`AbrController`] from the configuration.
    pub fn build(self) -> Result<AbrController, AbrError> {
        AbrController::new_from_config(self)
    }
}

impl Default for AbrConfig {
    fn default() -> Self {
        Self {
            start_bitrate: Bitrate::mbps(1),
            target_bitrate: Bitrate::mbps(5),
            cooldown_period: DEFAULT_COOLDOWN_PERIOD,
            low_pass_filter_scalar: DEFAULT_LOW_PASS_FILTER_SCALAR,
            increase_step: DEFAULT_INCREASE_STEP,
            decrease_factor: DEFAULT_DECREASE_FACTOR,
            min_bitrate: Bitrate::ZERO,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            catalog: ProfileCatalog::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AbrConfig::default().validate().is_ok());
    }

    #[test]
    fn low_pass_filter_scalar_bounds() {
        for alpha in [0.0, -0.1, 1.01, f64::NAN] {
            let err = AbrConfig::new()
                .set_low_pass_filter_scalar(alpha)
                .validate()
                .unwrap_err();
            assert!(matches!(err, AbrError::InvalidLowPassFilterScalar(_)));
        }

        assert!(AbrConfig::new()
            .set_low_pass_filter_scalar(1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn decrease_factor_bounds() {
        let err = AbrConfig::new()
            .set_decrease_factor(0.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AbrError::InvalidDecreaseFactor(_)));
    }

    #[test]
    fn zero_values_rejected() {
        let err = AbrConfig::new()
            .set_target_bitrate(Bitrate::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AbrError::InvalidTargetBitrate(_)));

        let err = AbrConfig::new()
            .set_increase_step(Bitrate::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AbrError::InvalidIncreaseStep(_)));

        let err = AbrConfig::new()
            .set_window_capacity(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AbrError::ZeroWindowCapacity));
    }

    #[test]
    fn non_finite_bitrates_rejected() {
        for v in [f64::NAN, f64::INFINITY] {
            let v = Bitrate::from(v);

            let err = AbrConfig::new().set_target_bitrate(v).validate().unwrap_err();
            assert!(matches!(err, AbrError::InvalidTargetBitrate(_)));

            let err = AbrConfig::new().set_increase_step(v).validate().unwrap_err();
            assert!(matches!(err, AbrError::InvalidIncreaseStep(_)));

            let err = AbrConfig::new().set_start_bitrate(v).validate().unwrap_err();
            assert!(matches!(err, AbrError::InvalidStartBitrate(_)));

            let err = AbrConfig::new().set_min_bitrate(v).validate().unwrap_err();
            assert!(matches!(err, AbrError::InvalidMinBitrate(_)));
        }

        let err = AbrConfig::new()
            .set_start_bitrate(Bitrate::from(-1.0))
            .validate()
            .unwrap_err();
        assert!(matches!(err, AbrError::InvalidStartBitrate(_)));

        // Zero start is allowed, the estimate climbs from nothing.
        assert!(AbrConfig::new()
            .set_start_bitrate(Bitrate::ZERO)
            .validate()
            .is_ok());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config: AbrConfig =
            serde_json::from_str(r#"{"target_bitrate": 2500000.0, "increase_step": 50000.0}"#)
                .unwrap();

        assert_eq!(config.target_bitrate(), Bitrate::kbps(2_500));
        assert_eq!(config.increase_step(), Bitrate::kbps(50));
        assert_eq!(config.decrease_factor(), DEFAULT_DECREASE_FACTOR);
        assert_eq!(config.catalog(), &ProfileCatalog::default());
    }

    #[test]
    fn json_round_trip() {
        let config = AbrConfig::new()
            .set_cooldown_period(Duration::from_millis(1500))
            .set_min_bitrate(Bitrate::kbps(300));

        let json = serde_json::to_string(&config).unwrap();
        let back: AbrConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
