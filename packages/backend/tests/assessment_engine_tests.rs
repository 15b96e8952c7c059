//! Integration tests for the assessment core across full section walkthroughs.
//!
//! Each walkthrough follows the production data flow: module-1 responses are
//! estimated, the estimate picks the module-2 form, the combined responses
//! produce the section score, and the wrong answers feed the skill tracker
//! and drill planning.

use chrono::{DateTime, TimeZone, Utc};

use satprep_algo::{
    average_band_number, band_window, check_routing_risk, estimate_theta, rank_error_types,
    route_to_module2, routing_probability, scaled_score, update_skill_state, weakness_score,
    DifficultyBand, ErrorEvent, ErrorRootCause, EwmaParams, ItemParams, Module2Form,
    ModuleResponse, OutcomeTag, QuestionFormat, RoutingRiskParams, ScoreScale, Section,
    SkillState, WeaknessParams, DEFAULT_DIFFICULTY_RANGE,
};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn answered(correct: bool, count: usize) -> Vec<ModuleResponse> {
    vec![
        ModuleResponse {
            correct,
            time_spent_s: 60.0,
        };
        count
    ]
}

fn cycle_bands(range: &[DifficultyBand], count: usize) -> Vec<DifficultyBand> {
    range.iter().copied().cycle().take(count).collect()
}

fn params_for(bands: &[DifficultyBand]) -> Vec<ItemParams> {
    bands
        .iter()
        .map(|band| ItemParams::for_band(*band, QuestionFormat::MultipleChoice))
        .collect()
}

// =============================================================================
// Section walkthroughs: module 1 -> routing -> module 2 -> score
// =============================================================================

#[test]
fn upper_band_module_routes_harder_and_scores_the_section() {
    let section = Section::ReadingAndWriting;
    let count = section.module_item_count();

    // Module 1 drawn from the upper bands, 20 of 27 correct.
    let module1_bands = cycle_bands(
        &[DifficultyBand::D3, DifficultyBand::D4, DifficultyBand::D5],
        count,
    );
    let mut module1 = answered(true, 20);
    module1.extend(answered(false, 7));

    let theta1 = estimate_theta(&module1, &params_for(&module1_bands));
    // Sum of b is 40.5; 20 correct and 7 wrong shift it by -6.5.
    assert!(
        (theta1 - 34.0 / 27.0).abs() < 1e-12,
        "module-1 theta drifted: {theta1}"
    );

    let form = route_to_module2(theta1);
    assert_eq!(form, Module2Form::Harder);
    assert!(
        routing_probability(theta1) > 0.5,
        "probability disagrees with the harder route"
    );

    // A clean opening raises no early warning.
    let risk = check_routing_risk(&module1, &RoutingRiskParams::default());
    assert!(!risk.at_risk);

    // Module 2 drawn from the routed form, 22 of 27 correct.
    let module2_bands = cycle_bands(&form.difficulty_range(), count);
    let mut module2 = answered(true, 22);
    module2.extend(answered(false, 5));

    let mut all_responses = module1;
    all_responses.extend(module2);
    let mut all_params = params_for(&module1_bands);
    all_params.extend(params_for(&module2_bands));

    let theta = estimate_theta(&all_responses, &all_params);
    assert!((theta - 66.0 / 54.0).abs() < 1e-12, "final theta drifted: {theta}");

    let score = scaled_score(theta, section, &ScoreScale::default());
    assert_eq!(score.section, section);
    assert_eq!(score.score_estimate, 622);
    assert_eq!(score.score_ci90, [592, 652]);
}

#[test]
fn lower_band_module_routes_standard_after_a_flagged_opening() {
    let section = Section::Math;
    let count = section.module_item_count();

    // Module 1 drawn from the lower bands; the 7 misses come first.
    let module1_bands = cycle_bands(
        &[DifficultyBand::D1, DifficultyBand::D2, DifficultyBand::D3],
        count,
    );
    let mut module1 = answered(false, 7);
    module1.extend(answered(true, 15));

    let theta1 = estimate_theta(&module1, &params_for(&module1_bands));
    // Sum of b is -12; 15 correct and 7 wrong shift it by -4.
    assert!(
        (theta1 - (-8.0 / 11.0)).abs() < 1e-12,
        "module-1 theta drifted: {theta1}"
    );

    let form = route_to_module2(theta1);
    assert_eq!(form, Module2Form::Standard);
    assert!(
        routing_probability(theta1) < 0.5,
        "probability disagrees with the standard route"
    );

    // Seven early misses trip both the accuracy floor and the error ceiling.
    let risk = check_routing_risk(&module1, &RoutingRiskParams::default());
    assert!(risk.at_risk);
    assert_eq!(
        risk.reasons,
        vec![
            "Accuracy below 60% in first 10 questions".to_string(),
            "More than 3 errors in first 10 questions".to_string(),
        ]
    );

    // Module 2 drawn from the standard form, 18 of 22 correct.
    let module2_bands = cycle_bands(&form.difficulty_range(), count);
    let mut module2 = answered(true, 18);
    module2.extend(answered(false, 4));

    let mut all_responses = module1;
    all_responses.extend(module2);
    let mut all_params = params_for(&module1_bands);
    all_params.extend(params_for(&module2_bands));

    let theta = estimate_theta(&all_responses, &all_params);
    assert!(
        (theta - (-35.0 / 44.0)).abs() < 1e-12,
        "final theta drifted: {theta}"
    );

    let score = scaled_score(theta, section, &ScoreScale::default());
    assert_eq!(score.section, section);
    assert_eq!(score.score_estimate, 420);
    assert_eq!(score.score_ci90, [390, 450]);
}

// =============================================================================
// Skill tracking across a practice run
// =============================================================================

#[test]
fn skill_state_walks_bands_across_a_practice_run() {
    let params = EwmaParams::default();

    // No history: the item's band is adopted without a step.
    let state = update_skill_state(
        None,
        OutcomeTag::CorrectFast,
        40.0,
        DifficultyBand::D3,
        fixed_now(),
        &params,
    );
    assert_eq!(state.difficulty_band, DifficultyBand::D3);
    assert!((state.accuracy - 0.6).abs() < 1e-9);
    assert!((state.speed - 56.0).abs() < 1e-9);

    // A second fast correct answer steps up.
    let state = update_skill_state(
        Some(&state),
        OutcomeTag::CorrectFast,
        38.0,
        DifficultyBand::D3,
        fixed_now(),
        &params,
    );
    assert_eq!(state.difficulty_band, DifficultyBand::D4);
    assert!((state.accuracy - 0.68).abs() < 1e-9);

    // A miss at the new level steps back down.
    let state = update_skill_state(
        Some(&state),
        OutcomeTag::WrongTrap,
        70.0,
        DifficultyBand::D4,
        fixed_now(),
        &params,
    );
    assert_eq!(state.difficulty_band, DifficultyBand::D3);
    assert!((state.accuracy - 0.544).abs() < 1e-9);

    // Correct but slow holds the band.
    let state = update_skill_state(
        Some(&state),
        OutcomeTag::CorrectSlow,
        85.0,
        DifficultyBand::D3,
        fixed_now(),
        &params,
    );
    assert_eq!(state.difficulty_band, DifficultyBand::D3);
    assert!((state.accuracy - 0.6352).abs() < 1e-9);
    assert!((state.speed - 61.736).abs() < 1e-9);
}

// =============================================================================
// Error stream into weakness scoring and drill planning
// =============================================================================

#[test]
fn error_stream_drives_weakness_ranking_and_the_drill_window() {
    // Seven misses across three question types, most on linear equations.
    let occurrences: Vec<String> = ["MATH_ALG_LINEAR"; 4]
        .iter()
        .chain(["MATH_GEO_AREA"; 2].iter())
        .chain(["MATH_DATA_RATIO"; 1].iter())
        .map(|s| s.to_string())
        .collect();

    let ranked = rank_error_types(&occurrences);
    assert_eq!(
        ranked,
        vec![
            "MATH_ALG_LINEAR".to_string(),
            "MATH_GEO_AREA".to_string(),
            "MATH_DATA_RATIO".to_string(),
        ]
    );

    // The hammered skill scores far weaker than a healthy one.
    let weak = SkillState {
        accuracy: 0.4,
        speed: 80.0,
        difficulty_band: DifficultyBand::D2,
        last_updated: fixed_now(),
    };
    let weak_events = vec![
        ErrorEvent {
            outcome: OutcomeTag::WrongProcess,
            root_cause: Some(ErrorRootCause::EProcess),
        };
        4
    ];
    let weak_score = weakness_score(Some(&weak), &weak_events, &WeaknessParams::default());
    assert!((weak_score - 0.84).abs() < 1e-9, "weak score drifted: {weak_score}");

    let strong = SkillState {
        accuracy: 0.9,
        speed: 55.0,
        difficulty_band: DifficultyBand::D4,
        last_updated: fixed_now(),
    };
    let strong_score = weakness_score(Some(&strong), &[], &WeaknessParams::default());
    assert!((strong_score - 0.1).abs() < 1e-9);
    assert!(weak_score > strong_score);

    // The drill window follows the user's band average; no states at all
    // falls back to the stored default range.
    let window = band_window(average_band_number(&[
        weak.difficulty_band,
        strong.difficulty_band,
    ]));
    assert_eq!(
        window,
        vec![DifficultyBand::D3, DifficultyBand::D4, DifficultyBand::D5]
    );
    assert_eq!(
        band_window(average_band_number(&[])),
        DEFAULT_DIFFICULTY_RANGE.to_vec()
    );
}
