use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use satprep_algo::{check_routing_risk, weakness_score, DifficultyBand, ModuleResponse, SkillState};

use crate::response::AppError;
use crate::services::assessment::{self, AssessmentError};
use crate::services::skill_tracking::{self, SkillTrackingError};
use crate::state::AppState;

/// Error events feeding the weakness score are drawn from this many days.
const WEAKNESS_WINDOW_DAYS: i64 = 7;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct SkillsEnvelope {
    skills: Vec<SkillRow>,
}

#[derive(Serialize)]
struct SkillRow {
    user_id: String,
    question_type_id: String,
    accuracy: f64,
    speed: f64,
    difficulty_band: String,
    last_updated: DateTime<Utc>,
    weakness_score: f64,
}

#[derive(Debug, Deserialize)]
struct RoutingRiskQuery {
    simulation_id: Option<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/skills/:user_id", get(skills))
        .route("/routing-risk/:user_id", get(routing_risk))
}

async fn skills(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(proxy) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database unavailable"));
    };
    let engine = state.engine();

    let states = skill_tracking::list_skill_states(proxy.as_ref(), &user_id)
        .await
        .map_err(|err| handle_skill_error(SkillTrackingError::from(err)))?;
    let recent_errors =
        skill_tracking::recent_errors_by_question_type(proxy.as_ref(), &user_id, WEAKNESS_WINDOW_DAYS)
            .await
            .map_err(|err| AppError::internal(format!("error event sql failed: {err}")))?;

    let skills: Vec<SkillRow> = states
        .into_iter()
        .map(|record| {
            let prior = DifficultyBand::from_str(&record.difficulty_band).map(|band| SkillState {
                accuracy: record.accuracy,
                speed: record.speed,
                difficulty_band: band,
                last_updated: record.last_updated,
            });
            let events = recent_errors
                .get(&record.question_type_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let weakness = weakness_score(prior.as_ref(), events, &engine.weakness);

            SkillRow {
                user_id: record.user_id,
                question_type_id: record.question_type_id,
                accuracy: record.accuracy,
                speed: record.speed,
                difficulty_band: record.difficulty_band,
                last_updated: record.last_updated,
                weakness_score: weakness,
            }
        })
        .collect();

    Ok(Json(SuccessResponse {
        success: true,
        data: SkillsEnvelope { skills },
    }))
}

async fn routing_risk(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<RoutingRiskQuery>,
) -> Result<impl IntoResponse, AppError> {
    let Some(proxy) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database unavailable"));
    };
    let engine = state.engine();

    let scored = assessment::module1_responses(proxy.as_ref(), &user_id, query.simulation_id)
        .await
        .map_err(handle_assessment_error)?;

    let responses: Vec<ModuleResponse> = scored
        .iter()
        .map(|response| ModuleResponse {
            correct: response.correct,
            time_spent_s: response.time_spent_s,
        })
        .collect();

    let risk = check_routing_risk(&responses, &engine.routing_risk);

    Ok(Json(SuccessResponse {
        success: true,
        data: risk,
    }))
}

fn handle_skill_error(err: SkillTrackingError) -> AppError {
    match err {
        SkillTrackingError::Validation(msg) => AppError::validation(msg),
        SkillTrackingError::NotFound(msg) => AppError::not_found(msg),
        SkillTrackingError::Sql(sql_err) => {
            AppError::internal(format!("skill state sql failed: {sql_err}"))
        }
    }
}

fn handle_assessment_error(err: AssessmentError) -> AppError {
    match err {
        AssessmentError::Validation(msg) => AppError::validation(msg),
        AssessmentError::NotFound(msg) => AppError::not_found(msg),
        AssessmentError::Sql(sql_err) => {
            AppError::internal(format!("simulation sql failed: {sql_err}"))
        }
    }
}
