use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use satprep_algo::Section;

use crate::response::AppError;
use crate::services::assessment::{self, AssessmentError, ItemResponse, SimulationRecord};
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
struct StartSimulationRequest {
    user_id: Option<String>,
    section: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModuleSubmission {
    responses: Vec<ItemResponse>,
}

#[derive(Serialize)]
struct SimulationEnvelope {
    simulation: SimulationRecord,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start))
        .route("/:id", get(get_one))
        .route("/:id/module1", post(submit_module1))
        .route("/:id/module2", post(submit_module2))
}

async fn start(
    State(state): State<AppState>,
    Json(payload): Json<StartSimulationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = payload
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("user_id is required"))?;

    let section = payload
        .section
        .as_deref()
        .and_then(Section::from_str)
        .ok_or_else(|| {
            AppError::validation("section must be \"ReadingAndWriting\" or \"Math\"")
        })?;

    let Some(proxy) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database unavailable"));
    };

    let started = assessment::start_simulation(proxy.as_ref(), user_id, section)
        .await
        .map_err(handle_service_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            data: started,
        }),
    ))
}

async fn submit_module1(
    State(state): State<AppState>,
    Path(simulation_id): Path<Uuid>,
    Json(payload): Json<ModuleSubmission>,
) -> Result<impl IntoResponse, AppError> {
    let Some(proxy) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database unavailable"));
    };
    let engine = state.engine();

    let outcome = assessment::submit_module1(
        proxy.as_ref(),
        engine.as_ref(),
        simulation_id,
        &payload.responses,
    )
    .await
    .map_err(handle_service_error)?;

    Ok(Json(SuccessResponse {
        success: true,
        data: outcome,
    }))
}

async fn submit_module2(
    State(state): State<AppState>,
    Path(simulation_id): Path<Uuid>,
    Json(payload): Json<ModuleSubmission>,
) -> Result<impl IntoResponse, AppError> {
    let Some(proxy) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database unavailable"));
    };
    let engine = state.engine();

    let outcome = assessment::submit_module2(
        proxy.as_ref(),
        engine.as_ref(),
        simulation_id,
        &payload.responses,
    )
    .await
    .map_err(handle_service_error)?;

    Ok(Json(SuccessResponse {
        success: true,
        data: outcome,
    }))
}

async fn get_one(
    State(state): State<AppState>,
    Path(simulation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let Some(proxy) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database unavailable"));
    };

    let simulation = assessment::get_simulation(proxy.as_ref(), simulation_id)
        .await
        .map_err(handle_service_error)?;

    Ok(Json(SuccessResponse {
        success: true,
        data: SimulationEnvelope { simulation },
    }))
}

fn handle_service_error(err: AssessmentError) -> AppError {
    match err {
        AssessmentError::Validation(msg) => AppError::validation(msg),
        AssessmentError::NotFound(msg) => AppError::not_found(msg),
        AssessmentError::Sql(sql_err) => {
            AppError::internal(format!("simulation sql failed: {sql_err}"))
        }
    }
}
