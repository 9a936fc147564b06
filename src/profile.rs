//! Streaming profiles and the catalog they are picked from.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AbrError, Bitrate};

/// A bitrate tier coupled with the resolution and keyframe interval used at that tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingProfile {
    /// The bitrate this tier is meant to be streamed at.
    pub bitrate: Bitrate,
    /// Width in pixels, in the profile's own orientation.
    pub width: u32,
    /// Height in pixels, in the profile's own orientation.
    pub height: u32,
    /// Time between two keyframes.
    pub keyframe_interval: Duration,
}

impl StreamingProfile {
    /// Creates a new profile.
    pub const fn new(
        bitrate: Bitrate,
        width: u32,
        height: u32,
        keyframe_interval: Duration,
    ) -> Self {
        StreamingProfile {
            bitrate,
            width,
            height,
            keyframe_interval,
        }
    }

    /// Whether the profile's own resolution is landscape (or square).
    pub fn is_landscape(&self) -> bool {
        self.width >= self.height
    }
}

/// What [`ProfileCatalog::select()`] returns when the candidate is above every tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Fall back to the lowest tier.
    ///
    /// This is the historical behavior of the controller.
    #[default]
    Lowest,
    /// Fall back to the highest tier.
    Highest,
}

/// Ordered, immutable set of [`StreamingProfile`].
///
/// The profiles are kept in ascending bitrate order regardless of the order they are given in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogRepr", into = "CatalogRepr")]
pub struct ProfileCatalog {
    profiles: Vec<StreamingProfile>,
    fallback: FallbackPolicy,
}

impl ProfileCatalog {
    /// Creates a catalog. Fails with [`AbrError::EmptyCatalog`] if `profiles` is empty.
    pub fn new(profiles: Vec<StreamingProfile>) -> Result<Self, AbrError> {
        if profiles.is_empty() {
            return Err(AbrError::EmptyCatalog);
        }

        if let Some(p) = profiles.iter().find(|p| !p.bitrate.is_valid()) {
            return Err(AbrError::InvalidProfileBitrate(p.bitrate));
        }

        let mut profiles = profiles;
        profiles.sort_by(|a, b| a.bitrate.as_f64().total_cmp(&b.bitrate.as_f64()));

        Ok(ProfileCatalog {
            profiles,
            fallback: FallbackPolicy::default(),
        })
    }

    /// Change what [`ProfileCatalog::select()`] does for candidates above the highest tier.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// The fallback policy in use.
    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Pick the tier for a candidate bitrate.
    ///
    /// This is the tier with the smallest bitrate that is still at or above `candidate`. When
    /// the candidate is above every tier, the [`FallbackPolicy`] decides.
    pub fn select(&self, candidate: Bitrate) -> &StreamingProfile {
        self.profiles
            .iter()
            .find(|p| p.bitrate >= candidate)
            .unwrap_or_else(|| match self.fallback {
                FallbackPolicy::Lowest => self.lowest(),
                FallbackPolicy::Highest => self.highest(),
            })
    }

    /// The tier with the lowest bitrate.
    pub fn lowest(&self) -> &StreamingProfile {
        // new() guarantees at least one profile.
        &self.profiles[0]
    }

    /// The tier with the highest bitrate.
    pub fn highest(&self) -> &StreamingProfile {
        &self.profiles[self.profiles.len() - 1]
    }

    /// All tiers in ascending bitrate order.
    pub fn profiles(&self) -> &[StreamingProfile] {
        &self.profiles
    }
}

impl Default for ProfileCatalog {
    /// 480p at 1Mbit/s, 720p at 3.5Mbit/s and 1080p at 5Mbit/s.
    fn default() -> Self {
        ProfileCatalog {
            profiles: vec![
                StreamingProfile::new(Bitrate::mbps(1), 854, 480, Duration::from_secs(5)),
                StreamingProfile::new(Bitrate::kbps(3_500), 1280, 720, Duration::from_secs(2)),
                StreamingProfile::new(Bitrate::mbps(5), 1920, 1080, Duration::from_secs(2)),
            ],
            fallback: FallbackPolicy::default(),
        }
    }
}

// Deserializing goes through new() so the ordering and non-empty invariants hold.
#[derive(Serialize, Deserialize)]
struct CatalogRepr {
    profiles: Vec<StreamingProfile>,
    #[serde(default)]
    fallback: FallbackPolicy,
}

impl TryFrom<CatalogRepr> for ProfileCatalog {
    type Error = AbrError;

    fn try_from(value: CatalogRepr) -> Result<Self, Self::Error> {
        Ok(ProfileCatalog::new(value.profiles)?.with_fallback(value.fallback))
    }
}

impl From<ProfileCatalog> for CatalogRepr {
    fn from(value: ProfileCatalog) -> Self {
        CatalogRepr {
            profiles: value.profiles,
            fallback: value.fallback,
        }
    }
}
