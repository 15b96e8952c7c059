//! Ability Estimator
//!
//! Difficulty-anchored theta estimate over one module of responses.
//!
//! Each response is paired positionally with its item's IRT triple and
//! contributes `b - 0.5` when correct or `b + 0.5` when wrong; theta is the
//! unweighted mean of the contributions. This is a fixed design constant,
//! not a maximum-likelihood 2PL/3PL fit. Swapping in a real likelihood
//! solver changes routing and scoring behavior and must not happen silently.

use crate::types::{ItemParams, ModuleResponse};

/// Evidence offset applied around an item's difficulty `b`
const EVIDENCE_OFFSET: f64 = 0.5;

/// Estimate ability from one module's responses.
///
/// `responses[i]` pairs with `params[i]`. When `params` is shorter than
/// `responses`, the missing indices fall back to [`ItemParams::default`]
/// rather than failing. Empty input returns the neutral prior `0.0`.
pub fn estimate_theta(responses: &[ModuleResponse], params: &[ItemParams]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }

    let sum: f64 = responses
        .iter()
        .enumerate()
        .map(|(index, response)| {
            let b = params.get(index).copied().unwrap_or_default().b;
            if response.correct {
                b - EVIDENCE_OFFSET
            } else {
                b + EVIDENCE_OFFSET
            }
        })
        .sum();

    sum / responses.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DifficultyBand, QuestionFormat};

    fn answer(correct: bool) -> ModuleResponse {
        ModuleResponse {
            correct,
            time_spent_s: 60.0,
        }
    }

    fn band_params(band: DifficultyBand) -> ItemParams {
        ItemParams::for_band(band, QuestionFormat::MultipleChoice)
    }

    #[test]
    fn test_empty_input_returns_neutral_prior() {
        assert_eq!(estimate_theta(&[], &[]), 0.0);
    }

    #[test]
    fn test_three_correct_d2_items() {
        let responses = vec![answer(true), answer(true), answer(true)];
        let params = vec![band_params(DifficultyBand::D2); 3];
        let theta = estimate_theta(&responses, &params);
        assert!((theta - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_single_response_offsets() {
        let params = vec![band_params(DifficultyBand::D3)];
        assert_eq!(estimate_theta(&[answer(true)], &params), 0.0);
        assert_eq!(estimate_theta(&[answer(false)], &params), 1.0);
    }

    #[test]
    fn test_missing_params_fall_back_to_default() {
        // Only the first item has calibrated params; the rest use b = 0.0.
        let responses = vec![answer(true), answer(true), answer(false)];
        let params = vec![band_params(DifficultyBand::D5)];
        let theta = estimate_theta(&responses, &params);
        let expected = ((2.5 - 0.5) + (0.0 - 0.5) + (0.0 + 0.5)) / 3.0;
        assert!((theta - expected).abs() < 1e-12);
    }

    #[test]
    fn test_each_correct_answer_shifts_theta_by_full_offset() {
        // Flipping one response from wrong to correct moves its contribution
        // from b + 0.5 to b - 0.5, so theta drops by exactly 1.0 / n.
        let params = vec![band_params(DifficultyBand::D3); 5];
        let mut responses = vec![answer(false); 5];
        let mut previous = estimate_theta(&responses, &params);
        for flip in 0..5 {
            responses[flip] = answer(true);
            let theta = estimate_theta(&responses, &params);
            assert!((previous - theta - 0.2).abs() < 1e-12);
            previous = theta;
        }
    }

    #[test]
    fn test_harder_items_anchor_higher_theta() {
        let responses = vec![answer(true), answer(true)];
        let low = estimate_theta(&responses, &vec![band_params(DifficultyBand::D1); 2]);
        let high = estimate_theta(&responses, &vec![band_params(DifficultyBand::D5); 2]);
        assert!(high > low);
    }

    #[test]
    fn test_theta_bounded_by_band_range() {
        // With band-derived difficulties, contributions live in [-2.0, 3.0].
        let all_wrong_hardest = estimate_theta(
            &vec![answer(false); 4],
            &vec![band_params(DifficultyBand::D5); 4],
        );
        let all_correct_easiest = estimate_theta(
            &vec![answer(true); 4],
            &vec![band_params(DifficultyBand::D1); 4],
        );
        assert_eq!(all_wrong_hardest, 3.0);
        assert_eq!(all_correct_easiest, -2.0);
    }
}
