//! Monetization gate: free vs. premium feature access
//!
//! A small state machine consulted before watermark removal, high-quality
//! export, and AI upscaling. It replaces the original UI's scattered boolean
//! flags with explicit states and transitions.

use crate::remote::RewardOutcome;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Account tier within the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountTier {
    Free,
    Premium,
}

/// Features permitted only for premium users or after a rewarded ad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatedAction {
    WatermarkRemoval,
    HighQualityExport,
    Upscale,
}

/// Outcome of consulting the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The action may proceed
    Allowed,
    /// The caller must complete a rewarded ad or upgrade first
    NeedsAdOrPremium,
}

/// Session-scoped monetization state
///
/// Invariant: a premium account never shows the watermark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonetizationGate {
    tier: AccountTier,
    watermark_visible: bool,
    reward_earned: bool,
}

impl MonetizationGate {
    /// New session: free tier, watermark visible
    #[must_use]
    pub fn new() -> Self {
        Self {
            tier: AccountTier::Free,
            watermark_visible: true,
            reward_earned: false,
        }
    }

    #[must_use]
    pub fn tier(&self) -> AccountTier {
        self.tier
    }

    #[must_use]
    pub fn is_premium(&self) -> bool {
        self.tier == AccountTier::Premium
    }

    #[must_use]
    pub fn watermark_visible(&self) -> bool {
        self.watermark_visible
    }

    /// Decide whether a gated action may proceed right now
    #[must_use]
    pub fn request_gated_action(&self, action: GatedAction) -> GateDecision {
        if self.is_premium() || self.reward_earned {
            return GateDecision::Allowed;
        }
        match action {
            // A free user who already earned watermark removal keeps it
            GatedAction::WatermarkRemoval if !self.watermark_visible => GateDecision::Allowed,
            _ => GateDecision::NeedsAdOrPremium,
        }
    }

    /// Record the outcome of an externally shown rewarded ad
    ///
    /// The ad SDK reports completion both as a boolean flag and as a reward
    /// amount depending on plugin version, so either signal counts. A
    /// confirmed reward clears the watermark and unlocks gated actions for the
    /// rest of the session; it never grants premium. Returns whether the
    /// reward was accepted.
    pub fn complete_rewarded_ad(&mut self, outcome: &RewardOutcome) -> bool {
        if !outcome.is_rewarded() {
            info!("rewarded ad dismissed without completion, watermark unchanged");
            return false;
        }
        self.watermark_visible = false;
        self.reward_earned = true;
        info!("rewarded ad completed, watermark cleared for this session");
        true
    }

    /// Upgrade to premium; irreversible within the session
    pub fn grant_premium(&mut self) {
        self.tier = AccountTier::Premium;
        self.watermark_visible = false;
        info!("premium granted, watermark cleared");
    }
}

impl Default for MonetizationGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_user_is_gated() {
        let gate = MonetizationGate::new();
        assert_eq!(gate.tier(), AccountTier::Free);
        assert!(gate.watermark_visible());
        for action in [
            GatedAction::WatermarkRemoval,
            GatedAction::HighQualityExport,
            GatedAction::Upscale,
        ] {
            assert_eq!(
                gate.request_gated_action(action),
                GateDecision::NeedsAdOrPremium
            );
        }
    }

    #[test]
    fn test_grant_premium_allows_everything() {
        let mut gate = MonetizationGate::new();
        gate.grant_premium();
        assert!(gate.is_premium());
        assert!(!gate.watermark_visible());
        for action in [
            GatedAction::WatermarkRemoval,
            GatedAction::HighQualityExport,
            GatedAction::Upscale,
        ] {
            assert_eq!(gate.request_gated_action(action), GateDecision::Allowed);
        }
    }

    #[test]
    fn test_rewarded_ad_unlocks_without_premium() {
        let mut gate = MonetizationGate::new();
        let accepted = gate.complete_rewarded_ad(&RewardOutcome {
            rewarded: true,
            amount: 0,
        });
        assert!(accepted);
        assert!(!gate.watermark_visible());
        assert!(!gate.is_premium());
        // The earned reward unlocks gated actions for the session
        assert_eq!(
            gate.request_gated_action(GatedAction::WatermarkRemoval),
            GateDecision::Allowed
        );
        assert_eq!(
            gate.request_gated_action(GatedAction::HighQualityExport),
            GateDecision::Allowed
        );
    }

    #[test]
    fn test_reward_amount_counts_as_completion() {
        let mut gate = MonetizationGate::new();
        assert!(gate.complete_rewarded_ad(&RewardOutcome {
            rewarded: false,
            amount: 5,
        }));
        assert!(!gate.watermark_visible());
    }

    #[test]
    fn test_dismissed_ad_changes_nothing() {
        let mut gate = MonetizationGate::new();
        assert!(!gate.complete_rewarded_ad(&RewardOutcome {
            rewarded: false,
            amount: 0,
        }));
        assert!(gate.watermark_visible());
        assert!(!gate.is_premium());
    }

    #[test]
    fn test_premium_watermark_invariant() {
        let mut gate = MonetizationGate::new();
        gate.grant_premium();
        // No sequence of reward outcomes may resurface the watermark
        gate.complete_rewarded_ad(&RewardOutcome {
            rewarded: false,
            amount: 0,
        });
        assert!(gate.is_premium());
        assert!(!gate.watermark_visible());
    }
}
