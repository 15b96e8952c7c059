use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, QueryBuilder, Row};
use uuid::Uuid;

use satprep_algo::{
    estimate_theta, route_to_module2, scaled_score, DifficultyBand, ItemParams, Module2Form,
    ModuleResponse, OutcomeTag, QuestionFormat, Section,
};

use crate::db::DatabaseProxy;
use crate::services::skill_tracking;
use crate::state::EngineParams;

/// A submitted response is considered a timeout past this many seconds.
const TIMEOUT_THRESHOLD_S: f64 = 90.0;

#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// Lifecycle of one simulation row. Transitions are one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationState {
    Module1InProgress,
    Module1Complete,
    SectionComplete,
}

impl SimulationState {
    pub fn as_str(self) -> &'static str {
        match self {
            SimulationState::Module1InProgress => "MODULE1_IN_PROGRESS",
            SimulationState::Module1Complete => "MODULE1_COMPLETE",
            SimulationState::SectionComplete => "SECTION_COMPLETE",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "MODULE1_IN_PROGRESS" => Some(SimulationState::Module1InProgress),
            "MODULE1_COMPLETE" => Some(SimulationState::Module1Complete),
            "SECTION_COMPLETE" => Some(SimulationState::SectionComplete),
            _ => None,
        }
    }
}

/// One answer as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemResponse {
    pub item_id: Uuid,
    pub answer: String,
    #[serde(default)]
    pub time_spent_s: f64,
}

/// One answer after scoring against the stored key. Persisted with the
/// simulation so the routing-risk check can replay module 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResponse {
    pub item_id: Uuid,
    pub correct: bool,
    pub time_spent_s: f64,
}

/// A full simulation row.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRecord {
    pub id: Uuid,
    pub user_id: String,
    pub section: Section,
    pub state: SimulationState,
    pub module1_item_ids: Vec<Uuid>,
    pub module1_responses: Option<Vec<ScoredResponse>>,
    pub module2_item_ids: Option<Vec<Uuid>>,
    pub module2_form: Option<Module2Form>,
    pub theta_estimate: Option<f64>,
    pub score_estimate: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct StartedSimulation {
    pub simulation_id: Uuid,
    pub module1_item_ids: Vec<Uuid>,
    pub state: SimulationState,
}

#[derive(Debug, Serialize)]
pub struct Module1Outcome {
    pub simulation_id: Uuid,
    pub routing_result: Module2Form,
    pub module2_item_ids: Vec<Uuid>,
    pub theta_estimate: f64,
    pub state: SimulationState,
}

#[derive(Debug, Serialize)]
pub struct Module2Outcome {
    pub simulation_id: Uuid,
    pub section_score: i32,
    pub score_ci90: [i32; 2],
    pub theta_estimate: f64,
    pub state: SimulationState,
}

struct ItemMeta {
    correct_answer: String,
    band: DifficultyBand,
    question_type_id: String,
}

/// Creates a simulation in `MODULE1_IN_PROGRESS` with a module-1 item set
/// drawn across all bands, easiest first.
pub async fn start_simulation(
    proxy: &DatabaseProxy,
    user_id: &str,
    section: Section,
) -> Result<StartedSimulation, AssessmentError> {
    let pool = proxy.pool();
    let item_count = section.module_item_count();

    let rows = sqlx::query("SELECT id FROM items ORDER BY difficulty ASC, id ASC LIMIT $1")
        .bind(item_count as i64)
        .fetch_all(pool)
        .await?;

    let module1_item_ids: Vec<Uuid> = rows
        .iter()
        .filter_map(|row| row.try_get("id").ok())
        .collect();

    let simulation_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO simulations (id, user_id, section, state, module1_item_ids)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(simulation_id)
    .bind(user_id)
    .bind(section.as_str())
    .bind(SimulationState::Module1InProgress.as_str())
    .bind(Json(&module1_item_ids))
    .execute(pool)
    .await?;

    Ok(StartedSimulation {
        simulation_id,
        module1_item_ids,
        state: SimulationState::Module1InProgress,
    })
}

/// Scores module 1, estimates theta, routes to a module-2 form and selects
/// its item set. Wrong answers are logged to the error stream and folded
/// into the user's skill states.
pub async fn submit_module1(
    proxy: &DatabaseProxy,
    engine: &EngineParams,
    simulation_id: Uuid,
    responses: &[ItemResponse],
) -> Result<Module1Outcome, AssessmentError> {
    let pool = proxy.pool();
    let simulation = load_simulation(pool, simulation_id).await?;

    let items = load_items(pool, &simulation.module1_item_ids).await?;
    let scored = score_responses(responses, &items);

    let (module_responses, params) = irt_inputs(&scored, &items);
    let theta = estimate_theta(&module_responses, &params);
    let form = route_to_module2(theta);

    let module2_item_ids = select_items_in_bands(
        pool,
        &form.difficulty_range(),
        simulation.section.module_item_count(),
    )
    .await?;

    sqlx::query(
        r#"
        UPDATE simulations
        SET module2_form = $2,
            module2_item_ids = $3,
            module1_responses = $4,
            theta_estimate = $5,
            state = $6
        WHERE id = $1
        "#,
    )
    .bind(simulation_id)
    .bind(form.as_str())
    .bind(Json(&module2_item_ids))
    .bind(Json(&scored))
    .bind(theta)
    .bind(SimulationState::Module1Complete.as_str())
    .execute(pool)
    .await?;

    log_wrong_responses(proxy, engine, &simulation.user_id, &scored, &items).await;

    Ok(Module1Outcome {
        simulation_id,
        routing_result: form,
        module2_item_ids,
        theta_estimate: theta,
        state: SimulationState::Module1Complete,
    })
}

/// Scores module 2 over the union of both modules' items, maps theta to a
/// section score and completes the simulation.
pub async fn submit_module2(
    proxy: &DatabaseProxy,
    engine: &EngineParams,
    simulation_id: Uuid,
    responses: &[ItemResponse],
) -> Result<Module2Outcome, AssessmentError> {
    let pool = proxy.pool();
    let simulation = load_simulation(pool, simulation_id).await?;

    let mut all_item_ids = simulation.module1_item_ids.clone();
    if let Some(module2_ids) = &simulation.module2_item_ids {
        all_item_ids.extend_from_slice(module2_ids);
    }

    let items = load_items(pool, &all_item_ids).await?;
    let scored = score_responses(responses, &items);

    let (module_responses, params) = irt_inputs(&scored, &items);
    let theta = estimate_theta(&module_responses, &params);
    let score = scaled_score(theta, simulation.section, &engine.score_scale);

    sqlx::query(
        r#"
        UPDATE simulations
        SET theta_estimate = $2,
            score_estimate = $3,
            state = $4,
            completed_at = $5
        WHERE id = $1
        "#,
    )
    .bind(simulation_id)
    .bind(theta)
    .bind(score.score_estimate)
    .bind(SimulationState::SectionComplete.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    log_wrong_responses(proxy, engine, &simulation.user_id, &scored, &items).await;

    Ok(Module2Outcome {
        simulation_id,
        section_score: score.score_estimate,
        score_ci90: score.score_ci90,
        theta_estimate: theta,
        state: SimulationState::SectionComplete,
    })
}

pub async fn get_simulation(
    proxy: &DatabaseProxy,
    simulation_id: Uuid,
) -> Result<SimulationRecord, AssessmentError> {
    load_simulation(proxy.pool(), simulation_id).await
}

/// The scored module-1 responses of a given simulation, or of the user's
/// most recent one. Empty when module 1 has not been submitted yet.
pub async fn module1_responses(
    proxy: &DatabaseProxy,
    user_id: &str,
    simulation_id: Option<Uuid>,
) -> Result<Vec<ScoredResponse>, AssessmentError> {
    let pool = proxy.pool();

    let row = match simulation_id {
        Some(id) => {
            sqlx::query(
                "SELECT module1_responses FROM simulations WHERE id = $1 AND user_id = $2",
            )
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT module1_responses FROM simulations
                WHERE user_id = $1
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(user_id)
            .fetch_optional(pool)
            .await?
        }
    };

    let Some(row) = row else {
        return Err(AssessmentError::NotFound(
            "Simulation not found".to_string(),
        ));
    };

    let responses = row
        .try_get::<Option<Json<Vec<ScoredResponse>>>, _>("module1_responses")
        .unwrap_or(None)
        .map(|json| json.0)
        .unwrap_or_default();

    Ok(responses)
}

async fn load_simulation(
    pool: &PgPool,
    simulation_id: Uuid,
) -> Result<SimulationRecord, AssessmentError> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, section, state,
               module1_item_ids, module1_responses, module2_item_ids, module2_form,
               theta_estimate, score_estimate, created_at, completed_at
        FROM simulations
        WHERE id = $1
        LIMIT 1
        "#,
    )
    .bind(simulation_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Err(AssessmentError::NotFound(
            "Simulation not found".to_string(),
        ));
    };

    map_simulation_row(&row)
}

fn map_simulation_row(row: &PgRow) -> Result<SimulationRecord, AssessmentError> {
    let section_raw: String = row.try_get("section").unwrap_or_default();
    let section = Section::from_str(&section_raw).ok_or_else(|| {
        AssessmentError::Validation(format!("stored section is invalid: {section_raw}"))
    })?;

    let state_raw: String = row.try_get("state").unwrap_or_default();
    let state = SimulationState::from_str(&state_raw).ok_or_else(|| {
        AssessmentError::Validation(format!("stored state is invalid: {state_raw}"))
    })?;

    let module2_form = row
        .try_get::<Option<String>, _>("module2_form")
        .unwrap_or(None)
        .as_deref()
        .and_then(Module2Form::from_str);

    Ok(SimulationRecord {
        id: row.try_get("id").unwrap_or_default(),
        user_id: row.try_get("user_id").unwrap_or_default(),
        section,
        state,
        module1_item_ids: row
            .try_get::<Json<Vec<Uuid>>, _>("module1_item_ids")
            .map(|json| json.0)
            .unwrap_or_default(),
        module1_responses: row
            .try_get::<Option<Json<Vec<ScoredResponse>>>, _>("module1_responses")
            .unwrap_or(None)
            .map(|json| json.0),
        module2_item_ids: row
            .try_get::<Option<Json<Vec<Uuid>>>, _>("module2_item_ids")
            .unwrap_or(None)
            .map(|json| json.0),
        module2_form,
        theta_estimate: row.try_get("theta_estimate").unwrap_or(None),
        score_estimate: row.try_get("score_estimate").unwrap_or(None),
        created_at: row.try_get("created_at").unwrap_or_else(|_| Utc::now()),
        completed_at: row.try_get("completed_at").unwrap_or(None),
    })
}

async fn load_items(
    pool: &PgPool,
    item_ids: &[Uuid],
) -> Result<HashMap<Uuid, ItemMeta>, AssessmentError> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb = QueryBuilder::<sqlx::Postgres>::new(
        "SELECT id, correct_answer, difficulty, question_type_id FROM items WHERE id IN (",
    );
    {
        let mut sep = qb.separated(", ");
        for id in item_ids {
            sep.push_bind(*id);
        }
        sep.push_unseparated(")");
    }

    let rows = qb.build().fetch_all(pool).await?;

    let mut items = HashMap::with_capacity(rows.len());
    for row in &rows {
        let id: Uuid = match row.try_get("id") {
            Ok(id) => id,
            Err(_) => continue,
        };
        let band = row
            .try_get::<String, _>("difficulty")
            .ok()
            .and_then(|raw| DifficultyBand::from_str(&raw));
        let Some(band) = band else {
            tracing::warn!(item_id = %id, "item has an invalid difficulty band, skipping");
            continue;
        };
        items.insert(
            id,
            ItemMeta {
                correct_answer: row.try_get("correct_answer").unwrap_or_default(),
                band,
                question_type_id: row.try_get("question_type_id").unwrap_or_default(),
            },
        );
    }

    Ok(items)
}

async fn select_items_in_bands(
    pool: &PgPool,
    bands: &[DifficultyBand],
    limit: usize,
) -> Result<Vec<Uuid>, AssessmentError> {
    let mut qb = QueryBuilder::<sqlx::Postgres>::new("SELECT id FROM items WHERE difficulty IN (");
    {
        let mut sep = qb.separated(", ");
        for band in bands {
            sep.push_bind(band.as_str());
        }
        sep.push_unseparated(")");
    }
    qb.push(" ORDER BY difficulty ASC, id ASC LIMIT ");
    qb.push_bind(limit as i64);

    let rows = qb.build().fetch_all(pool).await?;

    Ok(rows
        .iter()
        .filter_map(|row| row.try_get("id").ok())
        .collect())
}

/// An answer is scored against the stored key; responses to items outside
/// the loaded set count as incorrect.
fn score_responses(
    responses: &[ItemResponse],
    items: &HashMap<Uuid, ItemMeta>,
) -> Vec<ScoredResponse> {
    responses
        .iter()
        .map(|response| ScoredResponse {
            item_id: response.item_id,
            correct: items
                .get(&response.item_id)
                .map(|item| item.correct_answer == response.answer)
                .unwrap_or(false),
            time_spent_s: response.time_spent_s,
        })
        .collect()
}

/// Pairs each scored response with the IRT params of its own item. The
/// simulation path treats every item as multiple choice.
fn irt_inputs(
    scored: &[ScoredResponse],
    items: &HashMap<Uuid, ItemMeta>,
) -> (Vec<ModuleResponse>, Vec<ItemParams>) {
    let mut module_responses = Vec::with_capacity(scored.len());
    let mut params = Vec::with_capacity(scored.len());

    for response in scored {
        module_responses.push(ModuleResponse {
            correct: response.correct,
            time_spent_s: response.time_spent_s,
        });
        params.push(
            items
                .get(&response.item_id)
                .map(|item| ItemParams::for_band(item.band, QuestionFormat::MultipleChoice))
                .unwrap_or_default(),
        );
    }

    (module_responses, params)
}

/// Error logging mirrors the client flow: a slow miss is a timeout, any
/// other miss is provisionally tagged as a trap until triaged. Failures
/// here never fail the submission.
async fn log_wrong_responses(
    proxy: &DatabaseProxy,
    engine: &EngineParams,
    user_id: &str,
    scored: &[ScoredResponse],
    items: &HashMap<Uuid, ItemMeta>,
) {
    for response in scored {
        if response.correct {
            continue;
        }
        let Some(item) = items.get(&response.item_id) else {
            continue;
        };

        let outcome = if response.time_spent_s > TIMEOUT_THRESHOLD_S {
            OutcomeTag::Timeout
        } else {
            OutcomeTag::WrongTrap
        };

        if let Err(err) = skill_tracking::insert_error_event(
            proxy,
            response.item_id,
            user_id,
            outcome,
            None,
            Some(response.time_spent_s),
        )
        .await
        {
            tracing::warn!(error = %err, item_id = %response.item_id, "failed to log error event");
            continue;
        }

        if let Err(err) = skill_tracking::apply_outcome(
            proxy,
            engine,
            user_id,
            &item.question_type_id,
            outcome,
            Some(response.time_spent_s),
            item.band,
        )
        .await
        {
            tracing::warn!(error = %err, item_id = %response.item_id, "failed to fold skill state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(correct_answer: &str, band: DifficultyBand) -> ItemMeta {
        ItemMeta {
            correct_answer: correct_answer.to_string(),
            band,
            question_type_id: "RW_IA_INF".to_string(),
        }
    }

    #[test]
    fn test_score_responses_matches_stored_key() {
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();
        let mut items = HashMap::new();
        items.insert(id_a, meta("B", DifficultyBand::D2));
        items.insert(id_b, meta("C", DifficultyBand::D4));

        let responses = vec![
            ItemResponse {
                item_id: id_a,
                answer: "B".to_string(),
                time_spent_s: 40.0,
            },
            ItemResponse {
                item_id: id_b,
                answer: "A".to_string(),
                time_spent_s: 95.0,
            },
        ];

        let scored = score_responses(&responses, &items);
        assert!(scored[0].correct);
        assert!(!scored[1].correct);
    }

    #[test]
    fn test_score_responses_unknown_item_is_incorrect() {
        let items = HashMap::new();
        let responses = vec![ItemResponse {
            item_id: Uuid::new_v4(),
            answer: "B".to_string(),
            time_spent_s: 10.0,
        }];

        let scored = score_responses(&responses, &items);
        assert!(!scored[0].correct);
    }

    #[test]
    fn test_irt_inputs_pair_params_by_item() {
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();
        let mut items = HashMap::new();
        items.insert(id_a, meta("B", DifficultyBand::D1));
        items.insert(id_b, meta("C", DifficultyBand::D5));

        let scored = vec![
            ScoredResponse {
                item_id: id_b,
                correct: true,
                time_spent_s: 30.0,
            },
            ScoredResponse {
                item_id: id_a,
                correct: false,
                time_spent_s: 50.0,
            },
        ];

        let (module_responses, params) = irt_inputs(&scored, &items);
        assert_eq!(module_responses.len(), 2);
        assert_eq!(params[0].b, DifficultyBand::D5.irt_b());
        assert_eq!(params[1].b, DifficultyBand::D1.irt_b());
    }

    #[test]
    fn test_irt_inputs_default_params_for_unknown_item() {
        let items = HashMap::new();
        let scored = vec![ScoredResponse {
            item_id: Uuid::new_v4(),
            correct: true,
            time_spent_s: 30.0,
        }];

        let (_, params) = irt_inputs(&scored, &items);
        assert_eq!(params[0].b, ItemParams::default().b);
    }

    #[test]
    fn test_simulation_state_round_trips() {
        for state in [
            SimulationState::Module1InProgress,
            SimulationState::Module1Complete,
            SimulationState::SectionComplete,
        ] {
            assert_eq!(SimulationState::from_str(state.as_str()), Some(state));
        }
    }
}
