use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use satprep_algo::{ErrorRootCause, OutcomeTag};

use crate::response::AppError;
use crate::services::skill_tracking::{self, ErrorEventRecord, SkillTrackingError};
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
struct CreateErrorEventRequest {
    item_id: Option<Uuid>,
    user_id: Option<String>,
    outcome: Option<String>,
    error_root_cause: Option<String>,
    time_spent_s: Option<f64>,
}

#[derive(Serialize)]
struct EventEnvelope {
    event: ErrorEventRecord,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create))
}

async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateErrorEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = payload
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let (Some(item_id), Some(user_id), Some(outcome_raw)) =
        (payload.item_id, user_id, payload.outcome.as_deref())
    else {
        return Err(AppError::validation(
            "item_id, user_id and outcome are required",
        ));
    };

    let outcome = OutcomeTag::from_str(outcome_raw).ok_or_else(|| {
        AppError::validation(format!("outcome is not a recognized tag: {outcome_raw}"))
    })?;

    let root_cause = match payload.error_root_cause.as_deref() {
        Some(raw) => Some(ErrorRootCause::from_str(raw).ok_or_else(|| {
            AppError::validation(format!("error_root_cause is not a recognized cause: {raw}"))
        })?),
        None => None,
    };

    let Some(proxy) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database unavailable"));
    };
    let engine = state.engine();

    let event = skill_tracking::record_error_event(
        proxy.as_ref(),
        engine.as_ref(),
        item_id,
        user_id,
        outcome,
        root_cause,
        payload.time_spent_s,
    )
    .await
    .map_err(handle_service_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            data: EventEnvelope { event },
        }),
    ))
}

fn handle_service_error(err: SkillTrackingError) -> AppError {
    match err {
        SkillTrackingError::Validation(msg) => AppError::validation(msg),
        SkillTrackingError::NotFound(msg) => AppError::not_found(msg),
        SkillTrackingError::Sql(sql_err) => {
            AppError::internal(format!("error event sql failed: {sql_err}"))
        }
    }
}
