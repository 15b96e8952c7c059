//! Module Router
//!
//! Maps a Module 1 ability estimate to the Module 2 form, and runs an
//! early-warning check over the opening stretch of Module 1 so a session
//! can flag a likely down-route before the module finishes.

use serde::{Deserialize, Serialize};

use crate::types::{DifficultyBand, ModuleResponse};

/// Theta cutoff between the two Module 2 forms; the boundary routes harder
pub const THETA_CUTOFF: f64 = 0.0;

// ==================== Module 2 Forms ====================

/// Second-module form selected after Module 1
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Module2Form {
    #[serde(rename = "M2_H")]
    Harder,
    #[serde(rename = "M2_L")]
    Standard,
}

impl Module2Form {
    pub fn as_str(&self) -> &'static str {
        match self {
            Module2Form::Harder => "M2_H",
            Module2Form::Standard => "M2_L",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "M2_H" => Some(Module2Form::Harder),
            "M2_L" => Some(Module2Form::Standard),
            _ => None,
        }
    }

    /// Bands items are drawn from when assembling this form
    pub fn difficulty_range(&self) -> [DifficultyBand; 3] {
        match self {
            Module2Form::Harder => [DifficultyBand::D3, DifficultyBand::D4, DifficultyBand::D5],
            Module2Form::Standard => [DifficultyBand::D1, DifficultyBand::D2, DifficultyBand::D3],
        }
    }
}

/// Pick the Module 2 form from the Module 1 theta estimate.
pub fn route_to_module2(theta: f64) -> Module2Form {
    if theta >= THETA_CUTOFF {
        Module2Form::Harder
    } else {
        Module2Form::Standard
    }
}

// ==================== Routing Risk ====================

/// Thresholds for the Module 1 early-warning check
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutingRiskParams {
    /// Number of opening responses inspected
    pub window: usize,
    /// Accuracy floor over the window
    pub min_accuracy: f64,
    /// Per-item time budget in seconds
    pub time_budget_s: f64,
    /// Multiple of the budget at which average pace counts as overrun
    pub overrun_factor: f64,
    /// Error count ceiling over the window
    pub max_errors: usize,
}

impl Default for RoutingRiskParams {
    fn default() -> Self {
        Self {
            window: 10,
            min_accuracy: 0.6,
            time_budget_s: 71.0,
            overrun_factor: 1.2,
            max_errors: 3,
        }
    }
}

/// Outcome of the early-warning check
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutingRisk {
    pub at_risk: bool,
    pub reasons: Vec<String>,
}

/// Inspect the first `params.window` responses and collect every triggered
/// warning. `at_risk` is true iff at least one reason fired. Fewer responses
/// than the window is fine; an empty slice is never at risk.
pub fn check_routing_risk(responses: &[ModuleResponse], params: &RoutingRiskParams) -> RoutingRisk {
    let window = &responses[..responses.len().min(params.window)];
    if window.is_empty() {
        return RoutingRisk {
            at_risk: false,
            reasons: Vec::new(),
        };
    }

    let correct = window.iter().filter(|r| r.correct).count();
    let accuracy = correct as f64 / window.len() as f64;
    let avg_time = window.iter().map(|r| r.time_spent_s).sum::<f64>() / window.len() as f64;
    let errors = window.len() - correct;

    let mut reasons = Vec::new();
    if accuracy < params.min_accuracy {
        reasons.push(format!(
            "Accuracy below {:.0}% in first {} questions",
            params.min_accuracy * 100.0,
            params.window
        ));
    }
    if avg_time > params.time_budget_s * params.overrun_factor {
        reasons.push(format!(
            "Average time exceeds time budget by {:.0}%",
            (params.overrun_factor - 1.0) * 100.0
        ));
    }
    if errors > params.max_errors {
        reasons.push(format!(
            "More than {} errors in first {} questions",
            params.max_errors, params.window
        ));
    }

    RoutingRisk {
        at_risk: !reasons.is_empty(),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(correct: bool, time_spent_s: f64) -> ModuleResponse {
        ModuleResponse {
            correct,
            time_spent_s,
        }
    }

    #[test]
    fn test_boundary_theta_routes_harder() {
        assert_eq!(route_to_module2(0.0), Module2Form::Harder);
        assert_eq!(route_to_module2(0.0001), Module2Form::Harder);
        assert_eq!(route_to_module2(-0.0001), Module2Form::Standard);
        assert_eq!(route_to_module2(2.5), Module2Form::Harder);
        assert_eq!(route_to_module2(-1.0), Module2Form::Standard);
    }

    #[test]
    fn test_form_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&Module2Form::Harder).unwrap(),
            "\"M2_H\""
        );
        assert_eq!(
            serde_json::to_string(&Module2Form::Standard).unwrap(),
            "\"M2_L\""
        );
        assert_eq!(Module2Form::from_str("M2_L"), Some(Module2Form::Standard));
        assert_eq!(Module2Form::from_str("M2_X"), None);
    }

    #[test]
    fn test_form_difficulty_ranges() {
        assert_eq!(
            Module2Form::Harder.difficulty_range(),
            [DifficultyBand::D3, DifficultyBand::D4, DifficultyBand::D5]
        );
        assert_eq!(
            Module2Form::Standard.difficulty_range(),
            [DifficultyBand::D1, DifficultyBand::D2, DifficultyBand::D3]
        );
    }

    #[test]
    fn test_clean_window_is_not_at_risk() {
        let responses = vec![answer(true, 50.0); 10];
        let risk = check_routing_risk(&responses, &RoutingRiskParams::default());
        assert!(!risk.at_risk);
        assert!(risk.reasons.is_empty());
    }

    #[test]
    fn test_empty_window_is_not_at_risk() {
        let risk = check_routing_risk(&[], &RoutingRiskParams::default());
        assert!(!risk.at_risk);
    }

    #[test]
    fn test_error_count_alone_triggers() {
        // Four errors: accuracy 0.6 stays at the floor, error ceiling breaks.
        let mut responses = vec![answer(true, 50.0); 6];
        responses.extend(vec![answer(false, 50.0); 4]);
        let risk = check_routing_risk(&responses, &RoutingRiskParams::default());
        assert!(risk.at_risk);
        assert_eq!(
            risk.reasons,
            vec!["More than 3 errors in first 10 questions".to_string()]
        );
    }

    #[test]
    fn test_slow_pace_alone_triggers() {
        let responses = vec![answer(true, 90.0); 10];
        let risk = check_routing_risk(&responses, &RoutingRiskParams::default());
        assert!(risk.at_risk);
        assert_eq!(
            risk.reasons,
            vec!["Average time exceeds time budget by 20%".to_string()]
        );
    }

    #[test]
    fn test_all_reasons_collected_together() {
        let responses = vec![answer(false, 120.0); 10];
        let risk = check_routing_risk(&responses, &RoutingRiskParams::default());
        assert!(risk.at_risk);
        assert_eq!(
            risk.reasons,
            vec![
                "Accuracy below 60% in first 10 questions".to_string(),
                "Average time exceeds time budget by 20%".to_string(),
                "More than 3 errors in first 10 questions".to_string(),
            ]
        );
    }

    #[test]
    fn test_responses_past_window_are_ignored() {
        let mut responses = vec![answer(true, 50.0); 10];
        // A disastrous back half must not change the verdict.
        responses.extend(vec![answer(false, 300.0); 12]);
        let risk = check_routing_risk(&responses, &RoutingRiskParams::default());
        assert!(!risk.at_risk);
    }

    #[test]
    fn test_short_window_uses_available_responses() {
        let responses = vec![answer(false, 50.0); 5];
        let risk = check_routing_risk(&responses, &RoutingRiskParams::default());
        assert!(risk.at_risk);
        assert!(risk
            .reasons
            .contains(&"Accuracy below 60% in first 10 questions".to_string()));
        assert!(risk
            .reasons
            .contains(&"More than 3 errors in first 10 questions".to_string()));
    }
}
