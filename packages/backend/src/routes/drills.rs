use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use satprep_algo::DifficultyBand;

use crate::response::AppError;
use crate::services::drills::{self, DrillError};
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
struct GenerateDrillRequest {
    user_id: Option<String>,
    target_skill_ids: Option<Vec<String>>,
    difficulty_range: Option<Vec<String>>,
    item_count: Option<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/generate", post(generate))
}

async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateDrillRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = payload
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("user_id is required"))?;

    let difficulty_range = match payload.difficulty_range {
        Some(raw_bands) => {
            let mut bands = Vec::with_capacity(raw_bands.len());
            for raw in &raw_bands {
                let band = DifficultyBand::from_str(raw).ok_or_else(|| {
                    AppError::validation(format!("difficulty_range has an unknown band: {raw}"))
                })?;
                bands.push(band);
            }
            Some(bands)
        }
        None => None,
    };

    let Some(proxy) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database unavailable"));
    };

    let drill = drills::generate_drill(
        proxy.as_ref(),
        user_id,
        payload.target_skill_ids,
        difficulty_range,
        payload.item_count,
    )
    .await
    .map_err(handle_service_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            data: drill,
        }),
    ))
}

fn handle_service_error(err: DrillError) -> AppError {
    match err {
        DrillError::Validation(msg) => AppError::validation(msg),
        DrillError::Sql(sql_err) => AppError::internal(format!("drill sql failed: {sql_err}")),
    }
}
