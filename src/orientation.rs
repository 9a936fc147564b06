//! Device orientation, used only to orient the resolution of a profile.

use crate::profile::StreamingProfile;

/// Source of the current device orientation.
///
/// Implemented for closures returning `bool`, so a host can hand in whatever it queries its
/// platform with.
///
/// ```
/// # use ratesteer::OrientationSource;
/// let source = || true;
/// assert!(source.is_landscape());
/// ```
pub trait OrientationSource: Send {
    /// Whether the device is currently in landscape.
    fn is_landscape(&self) -> bool;
}

impl<F> OrientationSource for F
where
    F: Fn() -> bool + Send,
{
    fn is_landscape(&self) -> bool {
        (self)()
    }
}

/// An orientation that never changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FixedOrientation {
    /// Wider than tall.
    #[default]
    Landscape,
    /// Taller than wide.
    Portrait,
}

impl OrientationSource for FixedOrientation {
    fn is_landscape(&self) -> bool {
        matches!(self, FixedOrientation::Landscape)
    }
}

/// Width and height of a profile as it should be configured on the encoder.
///
/// Swapped when the device orientation differs from the profile's own.
pub(crate) fn oriented_resolution(
    profile: &StreamingProfile,
    source: &dyn OrientationSource,
) -> (u32, u32) {
    if source.is_landscape() == profile.is_landscape() {
        (profile.width, profile.height)
    } else {
        (profile.height, profile.width)
    }
}
