//! Benchmark suite for satprep-algo
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use satprep_algo::{
    check_routing_risk, estimate_theta, rank_error_types, scaled_score, update_skill_state,
    DifficultyBand, EwmaParams, ItemParams, ModuleResponse, OutcomeTag, QuestionFormat,
    RoutingRiskParams, ScoreScale, Section, SkillState,
};

fn module_fixture(len: usize) -> (Vec<ModuleResponse>, Vec<ItemParams>) {
    let responses = (0..len)
        .map(|i| ModuleResponse {
            correct: i % 3 != 0,
            time_spent_s: 40.0 + (i % 7) as f64 * 11.0,
        })
        .collect();
    let params = (0..len)
        .map(|i| {
            ItemParams::for_band(
                DifficultyBand::ALL[i % 5],
                QuestionFormat::MultipleChoice,
            )
        })
        .collect();
    (responses, params)
}

fn bench_estimate_theta(c: &mut Criterion) {
    let (responses, params) = module_fixture(27);
    c.bench_function("estimate_theta/27", |b| {
        b.iter(|| estimate_theta(black_box(&responses), black_box(&params)))
    });
}

fn bench_scaled_score(c: &mut Criterion) {
    let scale = ScoreScale::default();
    c.bench_function("scaled_score", |b| {
        b.iter(|| scaled_score(black_box(0.73), Section::Math, &scale))
    });
}

fn bench_routing_risk(c: &mut Criterion) {
    let (responses, _) = module_fixture(27);
    let params = RoutingRiskParams::default();
    c.bench_function("check_routing_risk/27", |b| {
        b.iter(|| check_routing_risk(black_box(&responses), &params))
    });
}

fn bench_skill_fold(c: &mut Criterion) {
    let prior = SkillState {
        accuracy: 0.62,
        speed: 58.0,
        difficulty_band: DifficultyBand::D3,
        last_updated: chrono::Utc::now(),
    };
    let params = EwmaParams::default();
    c.bench_function("update_skill_state", |b| {
        b.iter(|| {
            update_skill_state(
                Some(black_box(&prior)),
                OutcomeTag::CorrectFast,
                45.0,
                DifficultyBand::D3,
                prior.last_updated,
                &params,
            )
        })
    });
}

fn bench_rank_error_types(c: &mut Criterion) {
    let type_ids = ["RW_EOI", "RW_IA_INF", "RW_IA_CENTRAL", "RW_CS_PURPOSE"];
    let occurrences: Vec<String> = (0..100)
        .map(|i| type_ids[i % type_ids.len()].to_string())
        .collect();
    c.bench_function("rank_error_types/100", |b| {
        b.iter(|| rank_error_types(black_box(&occurrences)))
    });
}

criterion_group!(
    benches,
    bench_estimate_theta,
    bench_scaled_score,
    bench_routing_risk,
    bench_skill_fold,
    bench_rank_error_types
);
criterion_main!(benches);
