//! Snapshot of the controller state for hosts that report it.

use std::time::Instant;

use crate::profile::StreamingProfile;
use crate::Bitrate;

/// Point in time view of an [`AbrController`][crate::AbrController].
///
/// Obtained via [`AbrController::stats()`][crate::AbrController::stats].
#[derive(Debug, Clone, PartialEq)]
pub struct AbrStats {
    /// Low pass filtered bandwidth estimate.
    pub bandwidth: Bitrate,
    /// Hysteresis threshold, 75% of `bandwidth`.
    pub threshold: Bitrate,
    /// Current ceiling of the increase path.
    pub target_bitrate: Bitrate,
    /// Average of the downgrade window, `None` while the window is empty.
    pub window_average: Option<Bitrate>,
    /// Number of samples in the downgrade window.
    pub window_len: usize,
    /// The tier the encoder was last configured for.
    pub profile: StreamingProfile,
    /// When the last adjustment was emitted.
    pub last_adjustment: Option<Instant>,
    /// Number of stats ticks handled.
    pub ticks: u64,
    /// Number of increase adjustments emitted.
    pub increases: u64,
    /// Number of decrease adjustments emitted.
    pub decreases: u64,
    /// Signals dropped because of the cooldown.
    pub suppressed: u64,
}
