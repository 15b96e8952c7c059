//! Skill / Weakness Tracker
//!
//! Two independent pure operations over per-skill state:
//!
//! - an EWMA fold of one classified outcome into accuracy and speed, with a
//!   one-step difficulty band adjustment,
//! - a weakness priority score over a recent window of error events, used to
//!   rank skills when selecting practice content.
//!
//! Both are side-effect free; persisting the merged state is the caller's
//! responsibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    DifficultyBand, ErrorEvent, OutcomeTag, SkillState, DEFAULT_ACCURACY, DEFAULT_SPEED_S,
};

// ==================== EWMA Fold ====================

/// EWMA weights for folding one outcome into a skill state
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EwmaParams {
    /// Weight kept on the prior estimate
    pub prior_weight: f64,
    /// Weight given to the newest observation
    pub sample_weight: f64,
}

impl Default for EwmaParams {
    fn default() -> Self {
        Self {
            prior_weight: 0.8,
            sample_weight: 0.2,
        }
    }
}

/// Fold one classified outcome into a skill state.
///
/// With no prior state the EWMA runs from `DEFAULT_ACCURACY` /
/// `DEFAULT_SPEED_S` and the resulting band is the attempted item's band.
/// Band stepping applies only when a prior state exists: correct-and-fast
/// steps one band up, any non-correct outcome steps one band down,
/// correct-but-slow holds the band. Steps saturate at D1 and D5.
pub fn update_skill_state(
    prior: Option<&SkillState>,
    outcome: OutcomeTag,
    time_spent_s: f64,
    item_band: DifficultyBand,
    now: DateTime<Utc>,
    params: &EwmaParams,
) -> SkillState {
    let is_correct = outcome.is_correct();
    let prior_accuracy = prior.map_or(DEFAULT_ACCURACY, |s| s.accuracy);
    let prior_speed = prior.map_or(DEFAULT_SPEED_S, |s| s.speed);

    let accuracy = params.prior_weight * prior_accuracy
        + params.sample_weight * if is_correct { 1.0 } else { 0.0 };
    let speed = params.prior_weight * prior_speed + params.sample_weight * time_spent_s;

    let difficulty_band = match prior {
        Some(state) if outcome.is_fast() => state.difficulty_band.harder(),
        Some(state) if !is_correct => state.difficulty_band.easier(),
        Some(state) => state.difficulty_band,
        None => item_band,
    };

    SkillState {
        accuracy,
        speed,
        difficulty_band,
        last_updated: now,
    }
}

// ==================== Weakness Score ====================

/// Weights of the weakness priority score
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeaknessParams {
    /// Qualifying errors per unit of frequency weight
    pub error_weight_divisor: f64,
    /// Per-item time budget in seconds
    pub time_budget_s: f64,
    /// Multiple of the budget past which the time penalty applies
    pub overrun_factor: f64,
    /// Penalty multiplier applied past the overrun point
    pub time_penalty: f64,
}

impl Default for WeaknessParams {
    fn default() -> Self {
        Self {
            error_weight_divisor: 10.0,
            time_budget_s: 75.0,
            overrun_factor: 1.2,
            time_penalty: 1.5,
        }
    }
}

/// Weakness priority for one skill:
/// `(1 - accuracy) * (1 + qualifying / divisor) * time_penalty`.
///
/// A qualifying error is a wrong answer carrying a diagnosed root cause;
/// skips, guesses, and timeouts never qualify. The time window over
/// `recent_errors` is the caller's policy (typically the last 7 days).
/// With no recorded state the documented defaults apply.
pub fn weakness_score(
    state: Option<&SkillState>,
    recent_errors: &[ErrorEvent],
    params: &WeaknessParams,
) -> f64 {
    let accuracy = state.map_or(DEFAULT_ACCURACY, |s| s.accuracy);
    let avg_time = state.map_or(DEFAULT_SPEED_S, |s| s.speed);

    let qualifying = recent_errors
        .iter()
        .filter(|event| event.root_cause.is_some() && event.outcome.is_wrong())
        .count();

    let frequency_weight = 1.0 + qualifying as f64 / params.error_weight_divisor;
    let time_penalty = if avg_time > params.time_budget_s * params.overrun_factor {
        params.time_penalty
    } else {
        1.0
    };

    (1.0 - accuracy) * frequency_weight * time_penalty
}
