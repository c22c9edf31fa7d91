//! Remote collaborators: background removal, upscaling, and rewarded ads
//!
//! Each external service sits behind an async trait so the edit session can
//! be driven with mock implementations in tests. The HTTP clients apply the
//! configured timeout to every call; a timeout surfaces as
//! `EditorError::RemoteService` like any other failure.

mod removebg;
mod upscale;

pub use removebg::RemoveBgClient;
pub use upscale::SrganClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Upscaling factor supported by the super-resolution service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpscaleFactor {
    X2,
    X4,
}

impl UpscaleFactor {
    /// Numeric multiplier
    #[must_use]
    pub fn multiplier(self) -> u32 {
        match self {
            Self::X2 => 2,
            Self::X4 => 4,
        }
    }
}

impl std::fmt::Display for UpscaleFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.multiplier())
    }
}

/// Result reported by the rewarded-ad SDK after the ad closes
///
/// Depending on the SDK version the completion signal arrives as a boolean
/// flag, a reward amount, or both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewardOutcome {
    /// Completion flag
    pub rewarded: bool,
    /// Reward amount granted
    pub amount: u32,
}

impl RewardOutcome {
    /// Whether either completion signal fired
    #[must_use]
    pub fn is_rewarded(&self) -> bool {
        self.rewarded || self.amount > 0
    }
}

/// Removes the background from an encoded image, returning an encoded image
/// with alpha transparency
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// # Errors
    ///
    /// Returns `EditorError::RemoteService` when the service rejects the
    /// request, times out, or returns an empty body.
    async fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>>;
}

/// Upscales an encoded image by an integral factor
#[async_trait]
pub trait Upscaler: Send + Sync {
    /// # Errors
    ///
    /// Returns `EditorError::RemoteService` when the service rejects the
    /// request, times out, or returns an empty body.
    async fn upscale(&self, image: &[u8], factor: UpscaleFactor) -> Result<Vec<u8>>;
}

/// Shows a rewarded ad and reports how it ended
///
/// `prepare` preloads ad inventory; `show` blocks until the ad closes and the
/// outcome is known. The session only interprets a genuine SDK callback, never
/// a timer standing in for one.
#[async_trait]
pub trait RewardedAdProvider: Send + Sync {
    /// Preload ad inventory
    ///
    /// # Errors
    ///
    /// Returns `EditorError::RemoteService` when no inventory is available.
    async fn prepare(&self) -> Result<()>;

    /// Display the ad and wait for it to close
    ///
    /// # Errors
    ///
    /// Returns `EditorError::RemoteService` when the ad fails to display.
    async fn show(&self) -> Result<RewardOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upscale_factor_multiplier() {
        assert_eq!(UpscaleFactor::X2.multiplier(), 2);
        assert_eq!(UpscaleFactor::X4.multiplier(), 4);
        assert_eq!(UpscaleFactor::X4.to_string(), "4x");
    }

    #[test]
    fn test_reward_outcome_signals() {
        assert!(!RewardOutcome::default().is_rewarded());
        assert!(RewardOutcome {
            rewarded: true,
            amount: 0
        }
        .is_rewarded());
        assert!(RewardOutcome {
            rewarded: false,
            amount: 1
        }
        .is_rewarded());
    }
}
