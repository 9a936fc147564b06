use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use crate::command::{Actuator, Adjustment, Direction, ProfileChange};
use crate::cooldown::CooldownGate;
use crate::estimate::{BandwidthEstimate, ThroughputSample};
use crate::orientation::{oriented_resolution, FixedOrientation, OrientationSource};
use crate::profile::{ProfileCatalog, StreamingProfile};
use crate::stats::AbrStats;
use crate::window::DowngradeWindow;
use crate::{AbrConfig, AbrError, Bitrate, Input};

/// Closed loop bitrate controller for one outbound stream.
///
/// Feed it the transport's throughput samples and bandwidth signals through
/// [`AbrController::handle_input()`], then drain decisions with
/// [`AbrController::poll_adjustment()`].
///
/// ```
/// # use std::time::Instant;
/// # use ratesteer::{AbrConfig, Input};
/// let mut abr = AbrConfig::new().build().unwrap();
/// let now = Instant::now();
///
/// abr.handle_input(Input::StatsTick { bytes_per_sec: 250_000 });
/// abr.handle_input(Input::SufficientBandwidth {
///     now,
///     bytes_per_sec: 250_000,
///     current_bitrate: 1_000_000,
/// });
///
/// // Forward to the encoder with `Adjustment::apply()`.
/// let adjustment = abr.poll_adjustment().unwrap();
/// assert_eq!(adjustment.bits(), 1_150_000);
/// ```
pub struct AbrController {
    estimate: BandwidthEstimate,
    window: DowngradeWindow,
    cooldown: CooldownGate,
    catalog: ProfileCatalog,
    profile: StreamingProfile,
    target_bitrate: Bitrate,
    increase_step: Bitrate,
    decrease_factor: f64,
    min_bitrate: Bitrate,
    orientation: Box<dyn OrientationSource>,
    pending: VecDeque<Adjustment>,
    counters: Counters,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    ticks: u64,
    increases: u64,
    decreases: u64,
    suppressed: u64,
}

impl AbrController {
    /// Creates a controller with the default [`AbrConfig`] but the given bitrates.
    pub fn new(start_bitrate: Bitrate, target_bitrate: Bitrate) -> Result<Self, AbrError> {
        AbrConfig::new()
            .set_start_bitrate(start_bitrate)
            .set_target_bitrate(target_bitrate)
            .build()
    }

    pub(crate) fn new_from_config(config: AbrConfig) -> Result<Self, AbrError> {
        config.validate()?;

        let profile = config.catalog.select(config.start_bitrate).clone();
        debug!(
            "Start at {} with target {}, {}x{}",
            config.start_bitrate, config.target_bitrate, profile.width, profile.height
        );

        Ok(AbrController {
            estimate: BandwidthEstimate::new(config.start_bitrate, config.low_pass_filter_scalar),
            window: DowngradeWindow::new(config.window_capacity),
            cooldown: CooldownGate::new(config.cooldown_period),
            catalog: config.catalog,
            profile,
            target_bitrate: config.target_bitrate,
            increase_step: config.increase_step,
            decrease_factor: config.decrease_factor,
            min_bitrate: config.min_bitrate,
            orientation: Box::new(FixedOrientation::default()),
            pending: VecDeque::new(),
            counters: Counters::default(),
        })
    }

    /// Replace the orientation source. Defaults to [`FixedOrientation::Landscape`].
    ///
    /// Only consulted when a profile change is emitted.
    pub fn set_orientation(&mut self, source: impl OrientationSource + 'static) {
        self.orientation = Box::new(source);
    }

    /// Drive the controller with transport input.
    pub fn handle_input(&mut self, input: Input) {
        match input {
            Input::StatsTick { bytes_per_sec } => {
                self.on_stats_tick(bytes_per_sec);
            }
            Input::SufficientBandwidth {
                now,
                bytes_per_sec,
                current_bitrate,
            } => {
                self.on_sufficient_bandwidth(now, bytes_per_sec, current_bitrate);
            }
            Input::InsufficientBandwidth {
                now,
                bytes_per_sec,
                current_bitrate,
            } => {
                self.on_insufficient_bandwidth(now, bytes_per_sec, current_bitrate);
            }
        }
    }

    /// Periodic throughput report. Always updates the estimate, the cooldown does not apply.
    pub fn on_stats_tick(&mut self, bytes_per_sec: u32) {
        let sample = ThroughputSample::from_bytes_per_sec(bytes_per_sec);

        self.estimate.update(sample);
        self.window.push(sample.bitrate());
        self.counters.ticks += 1;

        trace!(
            "Sample {} bandwidth: {} threshold: {}",
            sample.bitrate(),
            self.estimate.bandwidth(),
            self.estimate.threshold()
        );
        crate::log_stat!(
            "ABR_BANDWIDTH",
            sample.bitrate().as_f64(),
            self.estimate.bandwidth().as_f64(),
            self.estimate.threshold().as_f64()
        );
    }

    /// The transport reports the bandwidth as sufficient.
    ///
    /// Adds the fixed increase step when the raw sample is above the threshold, the current
    /// bitrate is below the estimate and the result stays strictly below the target.
    pub fn on_sufficient_bandwidth(
        &mut self,
        now: Instant,
        bytes_per_sec: u32,
        current_bitrate: u32,
    ) {
        if self.is_cooling_down(now, Direction::Increase) {
            return;
        }

        let current_bps = ThroughputSample::from_bytes_per_sec(bytes_per_sec).bitrate();
        let current = Bitrate::from(current_bitrate);
        let bandwidth = self.estimate.bandwidth();
        let threshold = self.estimate.threshold();

        let candidate = (current + self.increase_step).min(self.target_bitrate);

        let should_increase =
            current_bps > threshold && current < bandwidth && candidate < self.target_bitrate;

        if !should_increase {
            trace!(
                "No increase, sample: {} threshold: {} current: {} bandwidth: {} candidate: {}",
                current_bps,
                threshold,
                current,
                bandwidth,
                candidate
            );
            return;
        }

        self.adjust(now, Direction::Increase, current, candidate);
    }

    /// The transport reports the bandwidth as insufficient.
    ///
    /// Removes a share of the gap between the current bitrate and the estimate when the
    /// downgrade window average is above the threshold and the current bitrate is above the
    /// estimate.
    pub fn on_insufficient_bandwidth(
        &mut self,
        now: Instant,
        bytes_per_sec: u32,
        current_bitrate: u32,
    ) {
        if self.is_cooling_down(now, Direction::Decrease) {
            return;
        }

        let current_bps = ThroughputSample::from_bytes_per_sec(bytes_per_sec).bitrate();
        self.window.push(current_bps);
        let Some(moving_average) = self.window.average() else {
            return;
        };

        let current = Bitrate::from(current_bitrate);
        let bandwidth = self.estimate.bandwidth();
        let threshold = self.estimate.threshold();

        let adjustment = (current - bandwidth) * self.decrease_factor;
        let candidate = (current - adjustment).max(self.min_bitrate);

        let should_decrease = moving_average > threshold && current > bandwidth;

        if !should_decrease {
            trace!(
                "No decrease, average: {} threshold: {} current: {} bandwidth: {}",
                moving_average,
                threshold,
                current,
                bandwidth
            );
            return;
        }

        // The encoder only sees whole bits, the narrowed value must go down.
        if candidate.as_u32() >= current_bitrate {
            trace!(
                "No decrease, {} is held at {} (min bitrate {})",
                current,
                candidate,
                self.min_bitrate
            );
            return;
        }

        self.adjust(now, Direction::Decrease, current, candidate);
    }

    fn is_cooling_down(&mut self, now: Instant, direction: Direction) -> bool {
        if !self.cooldown.is_blocked(now) {
            return false;
        }
        self.counters.suppressed += 1;
        trace!(
            "Skip {}, last adjustment less than {:?} ago",
            direction,
            self.cooldown.period()
        );
        true
    }

    fn adjust(&mut self, now: Instant, direction: Direction, previous: Bitrate, bitrate: Bitrate) {
        let selected = self.catalog.select(bitrate).clone();

        let profile = if selected != self.profile {
            let (width, height) = oriented_resolution(&selected, &*self.orientation);
            debug!(
                "Profile {}x{} -> {}x{} (keyframe interval {:?})",
                self.profile.width,
                self.profile.height,
                width,
                height,
                selected.keyframe_interval
            );
            self.profile = selected.clone();
            Some(ProfileChange {
                width,
                height,
                keyframe_interval: selected.keyframe_interval,
                profile: selected,
            })
        } else {
            None
        };

        self.cooldown.record(now);
        match direction {
            Direction::Increase => self.counters.increases += 1,
            Direction::Decrease => self.counters.decreases += 1,
        }

        debug!(
            "Bitrate {}: {} -> {} (bandwidth: {}, threshold: {})",
            direction,
            previous,
            bitrate,
            self.estimate.bandwidth(),
            self.estimate.threshold()
        );
        crate::log_stat!(
            "ABR_ADJUSTMENT",
            direction,
            previous.as_f64(),
            bitrate.as_f64()
        );

        self.pending.push_back(Adjustment {
            direction,
            previous_bitrate: previous,
            bitrate,
            profile,
        });
    }

    /// Take the next decided adjustment, oldest first.
    pub fn poll_adjustment(&mut self) -> Option<Adjustment> {
        self.pending.pop_front()
    }

    /// Drain all pending adjustments into an actuator, returning how many were applied.
    pub fn apply_pending<A: Actuator + ?Sized>(&mut self, actuator: &mut A) -> usize {
        let mut count = 0;
        while let Some(adjustment) = self.poll_adjustment() {
            adjustment.apply(actuator);
            count += 1;
        }
        count
    }

    /// Change the ceiling of the increase path.
    ///
    /// Re-seeds the bandwidth estimate at `target` and clears the downgrade window. The
    /// cooldown and the current profile are left as they are.
    pub fn reset_target_bitrate(&mut self, target: Bitrate) -> Result<(), AbrError> {
        if !target.is_positive() {
            return Err(AbrError::InvalidTargetBitrate(target));
        }

        debug!("Reset target {} -> {}", self.target_bitrate, target);
        self.estimate.reset(target);
        self.target_bitrate = target;
        self.window.clear();

        Ok(())
    }

    /// Low pass filtered bandwidth estimate.
    pub fn bandwidth(&self) -> Bitrate {
        self.estimate.bandwidth()
    }

    /// Hysteresis threshold, 75% of [`AbrController::bandwidth()`].
    pub fn threshold(&self) -> Bitrate {
        self.estimate.threshold()
    }

    /// Current ceiling of the increase path.
    pub fn target_bitrate(&self) -> Bitrate {
        self.target_bitrate
    }

    /// The tier the encoder was last configured for.
    pub fn current_profile(&self) -> &StreamingProfile {
        &self.profile
    }

    /// The catalog profiles are selected from.
    pub fn catalog(&self) -> &ProfileCatalog {
        &self.catalog
    }

    /// Snapshot of the controller state.
    pub fn stats(&self) -> AbrStats {
        AbrStats {
            bandwidth: self.estimate.bandwidth(),
            threshold: self.estimate.threshold(),
            target_bitrate: self.target_bitrate,
            window_average: self.window.average(),
            window_len: self.window.len(),
            profile: self.profile.clone(),
            last_adjustment: self.cooldown.last_adjustment(),
            ticks: self.counters.ticks,
            increases: self.counters.increases,
            decreases: self.counters.decreases,
            suppressed: self.counters.suppressed,
        }
    }
}

impl fmt::Debug for AbrController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbrController")
            .field("estimate", &self.estimate)
            .field("window", &self.window)
            .field("cooldown", &self.cooldown)
            .field("profile", &self.profile)
            .field("target_bitrate", &self.target_bitrate)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
