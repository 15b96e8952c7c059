//! # satprep-algo - Adaptive assessment core
//!
//! Pure-Rust algorithm crate behind the SAT practice platform:
//!
//! - **Ability Estimator** - difficulty-anchored theta estimate over one module
//! - **Module Router** - Module 1 → Module 2 form selection plus an
//!   early-warning routing-risk check
//! - **Score Mapper** - theta → 200-800 scaled score with a 90% interval and
//!   a smoothed routing probability
//! - **Skill Tracker** - EWMA accuracy/speed fold, difficulty band stepping,
//!   weakness priority scoring
//! - **Drill Planning** - error-frequency ranking and difficulty windows for
//!   practice selection
//!
//! Every operation is a pure function of its inputs: no I/O, no clocks, no
//! globals. Persistence and the HTTP surface live in the backend crate.
//!
//! ## Module structure
//!
//! - [`types`] - shared domain types and constants
//! - [`estimator`] - ability estimation
//! - [`routing`] - module routing and risk checks
//! - [`scoring`] - scaled scores and intervals
//! - [`skills`] - skill state folds and weakness scores
//! - [`drill`] - drill planning helpers
//!
//! ## Example
//!
//! ```rust
//! use satprep_algo::{
//!     estimate_theta, route_to_module2, scaled_score, DifficultyBand, ItemParams,
//!     Module2Form, ModuleResponse, QuestionFormat, ScoreScale, Section,
//! };
//!
//! let responses = vec![
//!     ModuleResponse {
//!         correct: true,
//!         time_spent_s: 52.0
//!     };
//!     3
//! ];
//! let params =
//!     vec![ItemParams::for_band(DifficultyBand::D2, QuestionFormat::MultipleChoice); 3];
//!
//! let theta = estimate_theta(&responses, &params);
//! assert_eq!(route_to_module2(theta), Module2Form::Standard);
//!
//! let score = scaled_score(theta, Section::ReadingAndWriting, &ScoreScale::default());
//! assert_eq!(score.score_estimate, 400);
//! ```

// ============================================================================
// Module declarations
// ============================================================================

pub mod drill;
pub mod estimator;
pub mod routing;
pub mod scoring;
pub mod skills;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

/// Re-export all shared domain types
pub use types::*;

/// Re-export the ability estimator
pub use estimator::estimate_theta;

/// Re-export the module router and risk check
pub use routing::{
    check_routing_risk, route_to_module2, Module2Form, RoutingRisk, RoutingRiskParams,
    THETA_CUTOFF,
};

/// Re-export the score mapper
pub use scoring::{routing_probability, scaled_score, total_score, ScoreResult, ScoreScale};

/// Re-export the skill tracker
pub use skills::{update_skill_state, weakness_score, EwmaParams, WeaknessParams};

/// Re-export drill planning helpers
pub use drill::{
    average_band_number, band_window, rank_error_types, DEFAULT_DIFFICULTY_RANGE,
    DEFAULT_ITEM_COUNT, MAX_TARGET_TYPES,
};
