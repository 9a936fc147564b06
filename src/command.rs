use std::fmt;
use std::time::Duration;

use crate::profile::StreamingProfile;
use crate::Bitrate;

/// Encoder side of the loop. Applies what the controller decides.
///
/// The controller never calls this itself, see [`Adjustment::apply()`].
pub trait Actuator {
    /// Set the target encoder bitrate in bits per second.
    fn set_bitrate(&mut self, bits: u32);

    /// Set the encoder resolution and keyframe interval.
    fn set_profile(&mut self, width: u32, height: u32, keyframe_interval: Duration);
}

/// Which decision rule produced an [`Adjustment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Bandwidth was reported sufficient and the bitrate goes up.
    Increase,
    /// Bandwidth was reported insufficient and the bitrate goes down.
    Decrease,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Increase => write!(f, "increase"),
            Direction::Decrease => write!(f, "decrease"),
        }
    }
}

/// A change of resolution and keyframe interval, already oriented for the device.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileChange {
    /// Width in pixels to configure.
    pub width: u32,
    /// Height in pixels to configure.
    pub height: u32,
    /// Keyframe interval to configure.
    pub keyframe_interval: Duration,
    /// The tier this change was resolved from.
    pub profile: StreamingProfile,
}

/// One actuation command.
///
/// Produced by [`AbrController::poll_adjustment()`][crate::AbrController::poll_adjustment].
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    /// The rule that produced this adjustment.
    pub direction: Direction,
    /// Bitrate reported by the transport at the time of the decision.
    pub previous_bitrate: Bitrate,
    /// The new encoder bitrate.
    pub bitrate: Bitrate,
    /// Set when the selected tier differs from the current one.
    pub profile: Option<ProfileChange>,
}

impl Adjustment {
    /// The new bitrate narrowed for the encoder.
    pub fn bits(&self) -> u32 {
        self.bitrate.as_u32()
    }

    /// Forward the adjustment to an actuator.
    ///
    /// The profile, if any, is set before the bitrate.
    pub fn apply<A: Actuator + ?Sized>(&self, actuator: &mut A) {
        if let Some(change) = &self.profile {
            actuator.set_profile(change.width, change.height, change.keyframe_interval);
        }
        actuator.set_bitrate(self.bits());
    }
}
