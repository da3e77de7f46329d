//! Five-tier traffic-light summary of a machine's unresolved issues.
//!
//! Dashboards render three lamps (green, yellow, red) that can be solid, dim
//! or blinking, plus a work-in-progress marker. The tier depends only on the
//! highest fault probability among issues that are not yet fixed.

use serde::Serialize;

use crate::issue::{Issue, IssueStatus};

/// Probability at or above which only the red lamp is lit.
pub const CRITICAL_PROBABILITY: i32 = 70;

/// Probability at or above which the red lamp blinks alongside yellow.
pub const HIGH_PROBABILITY: i32 = 50;

/// Probability at or above which yellow is lit solid.
pub const ELEVATED_PROBABILITY: i32 = 30;

/// Lowest non-zero probability; shows a dim yellow lamp.
pub const LOW_PROBABILITY: i32 = 1;

/// Severity tier, ordered from all-clear to critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LightTier {
    Clear,
    Low,
    Elevated,
    High,
    Critical,
}

impl LightTier {
    /// Classify a fault probability.
    pub fn from_probability(probability: i32) -> Self {
        if probability >= CRITICAL_PROBABILITY {
            LightTier::Critical
        } else if probability >= HIGH_PROBABILITY {
            LightTier::High
        } else if probability >= ELEVATED_PROBABILITY {
            LightTier::Elevated
        } else if probability >= LOW_PROBABILITY {
            LightTier::Low
        } else {
            LightTier::Clear
        }
    }
}

/// Lamp states consumed by the dashboards.
///
/// `green_dim` is part of the lamp protocol but no tier currently lights it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightStatus {
    pub tier: LightTier,
    pub green: bool,
    pub green_dim: bool,
    pub yellow: bool,
    pub yellow_dim: bool,
    pub red: bool,
    pub red_blink: bool,
    /// Any unresolved issue is being repaired. Rendered as a modifier, not a
    /// tier.
    pub work_in_progress: bool,
}

impl LightStatus {
    /// Lamps for a tier, with no work-in-progress marker.
    pub fn for_tier(tier: LightTier) -> Self {
        let lamps = LightStatus {
            tier,
            green: false,
            green_dim: false,
            yellow: false,
            yellow_dim: false,
            red: false,
            red_blink: false,
            work_in_progress: false,
        };
        match tier {
            LightTier::Critical => LightStatus { red: true, ..lamps },
            LightTier::High => LightStatus {
                red: true,
                red_blink: true,
                yellow: true,
                ..lamps
            },
            LightTier::Elevated => LightStatus {
                yellow: true,
                green: true,
                ..lamps
            },
            LightTier::Low => LightStatus {
                green: true,
                yellow_dim: true,
                ..lamps
            },
            LightTier::Clear => LightStatus {
                green: true,
                ..lamps
            },
        }
    }

    /// Green only: nothing unresolved.
    pub fn all_clear() -> Self {
        Self::for_tier(LightTier::Clear)
    }
}

impl Default for LightStatus {
    fn default() -> Self {
        Self::all_clear()
    }
}

/// Highest probability among issues that are not fixed.
pub fn max_unresolved_probability(issues: &[Issue]) -> Option<i32> {
    issues
        .iter()
        .filter(|i| i.status.is_unresolved())
        .map(|i| i.fault_probability)
        .max()
}

/// Derive the lamp states for one machine from its issues.
///
/// Fixed issues in the input are ignored.
pub fn compute_light_status(issues: &[Issue]) -> LightStatus {
    let Some(max_probability) = max_unresolved_probability(issues) else {
        return LightStatus::all_clear();
    };

    let work_in_progress = issues.iter().any(|i| i.status == IssueStatus::InProgress);

    LightStatus {
        work_in_progress,
        ..LightStatus::for_tier(LightTier::from_probability(max_probability))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
