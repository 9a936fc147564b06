//! A Sans I/O adaptive bitrate controller for live outbound streams.
//!
//! The controller estimates the available throughput from the transport's periodic
//! statistics and re-targets the encoder bitrate, and at coarser granularity the resolution
//! and keyframe interval, to track it. It neither sends bytes nor encodes frames.
//!
//! This is a [Sans I/O][sansio] implementation meaning the [`AbrController`] is not talking
//! to any network or encoder. It has no internal threads, async tasks or timers. All
//! operations happen from the calls of the public API, and time is passed in with the
//! [`Input`].
//!
//! # Decision rules
//!
//! * Every stats tick updates a low pass filtered bandwidth estimate (EWMA) and a hysteresis
//!   threshold at 75% of it. It also feeds a short window of the most recent samples.
//! * When the transport reports sufficient bandwidth, the bitrate goes up by a fixed step if
//!   the raw sample is above the threshold, the current bitrate is below the estimate and the
//!   result stays strictly below the target ceiling.
//! * When the transport reports insufficient bandwidth, the bitrate goes down by a share of
//!   the gap between the current bitrate and the estimate, if the window average is above the
//!   threshold and the current bitrate is above the estimate.
//! * Both paths share a cooldown: no two adjustments are closer than the cooldown period.
//! * Every adjustment picks a [`StreamingProfile`] from the [`ProfileCatalog`]. A changed
//!   tier is emitted together with the bitrate.
//!
//! # Run loop
//!
//! ```
//! # use std::time::{Duration, Instant};
//! # use ratesteer::{Actuator, AbrConfig, Bitrate, Input};
//! struct Encoder;
//!
//! impl Actuator for Encoder {
//!     fn set_bitrate(&mut self, bits: u32) {
//!         // Reconfigure the encoder bitrate.
//!     }
//!
//!     fn set_profile(&mut self, width: u32, height: u32, keyframe_interval: Duration) {
//!         // Reconfigure resolution and GOP.
//!     }
//! }
//!
//! let mut abr = AbrConfig::new()
//!     .set_start_bitrate(Bitrate::mbps(1))
//!     .set_target_bitrate(Bitrate::mbps(5))
//!     .build()
//!     .unwrap();
//!
//! let mut encoder = Encoder;
//!
//! // Each of these comes from the transport at its own cadence.
//! let inputs = [
//!     Input::StatsTick { bytes_per_sec: 250_000 },
//!     Input::SufficientBandwidth {
//!         now: Instant::now(),
//!         bytes_per_sec: 250_000,
//!         current_bitrate: 1_000_000,
//!     },
//! ];
//!
//! for input in inputs {
//!     abr.handle_input(input);
//!
//!     while let Some(adjustment) = abr.poll_adjustment() {
//!         adjustment.apply(&mut encoder);
//!     }
//! }
//! ```
//!
//! [sansio]: https://sans-io.readthedocs.io

#![forbid(unsafe_code)]
#![allow(clippy::new_without_default)]
#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

use std::time::Instant;

use thiserror::Error;

mod bitrate;
pub use bitrate::Bitrate;

mod command;
pub use command::{Actuator, Adjustment, Direction, ProfileChange};

mod config;
pub use config::AbrConfig;
pub use config::{DEFAULT_COOLDOWN_PERIOD, DEFAULT_DECREASE_FACTOR, DEFAULT_INCREASE_STEP};

mod controller;
pub use controller::AbrController;

pub mod cooldown;

mod estimate;
pub use estimate::{ThroughputSample, DEFAULT_LOW_PASS_FILTER_SCALAR};

mod orientation;
pub use orientation::{FixedOrientation, OrientationSource};

pub mod profile;
pub use profile::{FallbackPolicy, ProfileCatalog, StreamingProfile};

pub mod stats;
pub use stats::AbrStats;

mod window;
pub use window::DEFAULT_WINDOW_CAPACITY;

/// Errors for the controller.
///
/// These only happen when constructing or re-targeting. Handling input never fails.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AbrError {
    /// The low pass filter scalar must lie in `(0, 1]`.
    #[error("low pass filter scalar must be in (0, 1]: {0}")]
    InvalidLowPassFilterScalar(f64),

    /// The decrease factor must lie in `(0, 1]`.
    #[error("decrease factor must be in (0, 1]: {0}")]
    InvalidDecreaseFactor(f64),

    /// The target bitrate must be positive and finite.
    #[error("target bitrate must be positive and finite: {0}")]
    InvalidTargetBitrate(Bitrate),

    /// The increase step must be positive and finite.
    #[error("increase step must be positive and finite: {0}")]
    InvalidIncreaseStep(Bitrate),

    /// The start bitrate must be finite and not negative.
    #[error("start bitrate must be finite and not negative: {0}")]
    InvalidStartBitrate(Bitrate),

    /// The min bitrate must be finite and not negative.
    #[error("min bitrate must be finite and not negative: {0}")]
    InvalidMinBitrate(Bitrate),

    /// A profile bitrate must be finite and not negative.
    #[error("profile bitrate must be finite and not negative: {0}")]
    InvalidProfileBitrate(Bitrate),

    /// The downgrade window has no room for samples.
    #[error("window capacity must not be zero")]
    ZeroWindowCapacity,

    /// The profile catalog has no profiles.
    #[error("profile catalog is empty")]
    EmptyCatalog,
}

/// Input as expected by [`AbrController::handle_input()`].
///
/// All three come from the transport. Raw readings are in bytes per second as reported by
/// the transport, `current_bitrate` is the encoder bitrate in bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Periodic throughput statistics.
    StatsTick {
        /// Bytes sent per second.
        bytes_per_sec: u32,
    },
    /// The transport considers the bandwidth sufficient.
    SufficientBandwidth {
        /// Current time.
        now: Instant,
        /// Bytes sent per second.
        bytes_per_sec: u32,
        /// The encoder bitrate in bits per second.
        current_bitrate: u32,
    },
    /// The transport considers the bandwidth insufficient.
    InsufficientBandwidth {
        /// Current time.
        now: Instant,
        /// Bytes sent per second.
        bytes_per_sec: u32,
        /// The encoder bitrate in bits per second.
        current_bitrate: u32,
    },
}

/// Log a statistic to stdout for plotting.
///
/// This macro turns into a NO-OP if the `_internal_dont_use_log_stats` feature is not enabled
macro_rules! log_stat {
    ($name:expr, $($arg:expr),+) => {
        #[cfg(feature = "_internal_dont_use_log_stats")]
        {
            use std::time::SystemTime;
            use std::io::{self, Write};

            let now = SystemTime::now();
            let since_epoch = now.duration_since(SystemTime::UNIX_EPOCH).unwrap();
            let unix_time_ms = since_epoch.as_millis();
            let mut lock = io::stdout().lock();
            write!(lock, "{} ", $name).expect("Failed to write to stdout");

            $(
                write!(lock, "{},", $arg).expect("Failed to write to stdout");
            )+
            writeln!(lock, "{}", unix_time_ms).expect("Failed to write to stdout");
        }
    };
}
pub(crate) use log_stat;
