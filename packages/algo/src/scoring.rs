//! Score Mapper
//!
//! Linear theta → scaled-score mapping with a fixed-width 90% confidence
//! interval and a smoothed routing probability.
//!
//! The mapping normalizes theta from the nominal [-3, +3] domain onto the
//! 200-800 section scale. Both the linear map and the 30-point interval
//! half-width are acknowledged simplifications of operational equating; the
//! interval is not derived from sample size.

use serde::{Deserialize, Serialize};

use crate::types::Section;

/// Probability intercept at the cutoff when theta routes harder
const PROB_INTERCEPT_HARDER: f64 = 0.7;

/// Probability intercept below the cutoff
const PROB_INTERCEPT_STANDARD: f64 = 0.3;

/// Probability slope per theta unit
const PROB_SLOPE: f64 = 0.1;

/// Constants of the theta → scaled-score map
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreScale {
    /// Lower end of the nominal theta domain
    pub min_theta: f64,
    /// Upper end of the nominal theta domain
    pub max_theta: f64,
    /// Lowest reportable section score
    pub min_score: i32,
    /// Highest reportable section score
    pub max_score: i32,
    /// Half-width of the 90% confidence interval, in score points
    pub ci_half_width: i32,
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self {
            min_theta: -3.0,
            max_theta: 3.0,
            min_score: 200,
            max_score: 800,
            ci_half_width: 30,
        }
    }
}

/// Scaled section score with interval and routing probability
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub section: Section,
    pub score_estimate: i32,
    pub score_ci90: [i32; 2],
    #[serde(rename = "routing_prob_M2_H")]
    pub routing_prob_harder: f64,
}

/// Map a theta estimate onto the section score scale.
///
/// The rounded score and both interval bounds are clamped into
/// `[min_score, max_score]`, which keeps out-of-domain thetas reportable.
/// `section` is carried through unchanged: both sections share one linear
/// map today, but per-section equating is an expected extension and callers
/// already supply it.
pub fn scaled_score(theta: f64, section: Section, scale: &ScoreScale) -> ScoreResult {
    let normalized = (theta - scale.min_theta) / (scale.max_theta - scale.min_theta);
    let raw = scale.min_score as f64 + normalized * (scale.max_score - scale.min_score) as f64;
    let score_estimate = (raw.round() as i32).clamp(scale.min_score, scale.max_score);

    let score_ci90 = [
        (score_estimate - scale.ci_half_width).max(scale.min_score),
        (score_estimate + scale.ci_half_width).min(scale.max_score),
    ];

    ScoreResult {
        section,
        score_estimate,
        score_ci90,
        routing_prob_harder: routing_probability(theta),
    }
}

/// Smoothed counterpart of the router's hard cutoff, for display only.
/// The step at 0.0 mirrors the binary routing decision; clamped to [0, 1].
pub fn routing_probability(theta: f64) -> f64 {
    let raw = if theta >= 0.0 {
        PROB_INTERCEPT_HARDER + theta * PROB_SLOPE
    } else {
        PROB_INTERCEPT_STANDARD + theta * PROB_SLOPE
    };
    raw.clamp(0.0, 1.0)
}

/// Combine two section scores into the composite total (400-1600).
pub fn total_score(rw_score: i32, math_score: i32) -> i32 {
    rw_score + math_score
}
