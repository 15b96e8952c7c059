use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use satprep_algo::DifficultyBand;

use crate::response::AppError;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 10;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
struct ListItemsQuery {
    question_type_id: Option<String>,
    difficulty: Option<String>,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreateItemRequest {
    question_type_id: Option<String>,
    difficulty: Option<String>,
    stimulus: Option<String>,
    options: Option<Value>,
    correct_answer: Option<String>,
    explanation: Option<String>,
    trap_ids: Option<Value>,
    irt_b: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ItemRecord {
    id: Uuid,
    question_type_id: String,
    difficulty: String,
    stimulus: String,
    options: Option<Value>,
    correct_answer: String,
    explanation: Option<String>,
    trap_ids: Value,
    irt_b: f64,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ItemsEnvelope {
    items: Vec<ItemRecord>,
}

#[derive(Serialize)]
struct ItemEnvelope {
    item: ItemRecord,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list).post(create))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let band_filter = match query.difficulty.as_deref() {
        Some(raw) => Some(DifficultyBand::from_str(raw).ok_or_else(|| {
            AppError::validation(format!("difficulty is not a recognized band: {raw}"))
        })?),
        None => None,
    };
    let limit = query.limit.filter(|n| *n > 0).unwrap_or(DEFAULT_LIST_LIMIT);

    let Some(proxy) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database unavailable"));
    };

    let mut qb = QueryBuilder::<sqlx::Postgres>::new(
        "SELECT id, question_type_id, difficulty, stimulus, options, correct_answer, \
         explanation, trap_ids, irt_b, created_at FROM items WHERE 1 = 1",
    );
    if let Some(type_id) = query.question_type_id.as_deref().filter(|t| !t.is_empty()) {
        qb.push(" AND question_type_id = ");
        qb.push_bind(type_id.to_string());
    }
    if let Some(band) = band_filter {
        qb.push(" AND difficulty = ");
        qb.push_bind(band.as_str());
    }
    qb.push(" ORDER BY created_at DESC LIMIT ");
    qb.push_bind(limit);

    let rows = qb
        .build()
        .fetch_all(proxy.pool())
        .await
        .map_err(|err| AppError::internal(format!("item sql failed: {err}")))?;

    let items: Vec<ItemRecord> = rows.iter().map(map_item_row).collect();

    Ok(Json(SuccessResponse {
        success: true,
        data: ItemsEnvelope { items },
    }))
}

async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let required = (
        payload
            .question_type_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty()),
        payload.difficulty.as_deref(),
        payload.stimulus.as_deref().filter(|v| !v.is_empty()),
        payload.correct_answer.as_deref().filter(|v| !v.is_empty()),
    );
    let (Some(question_type_id), Some(difficulty_raw), Some(stimulus), Some(correct_answer)) =
        required
    else {
        return Err(AppError::validation(
            "question_type_id, difficulty, stimulus and correct_answer are required",
        ));
    };

    let band = DifficultyBand::from_str(difficulty_raw).ok_or_else(|| {
        AppError::validation(format!("difficulty is not a recognized band: {difficulty_raw}"))
    })?;

    let Some(proxy) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database unavailable"));
    };

    let item = ItemRecord {
        id: Uuid::new_v4(),
        question_type_id: question_type_id.to_string(),
        difficulty: band.as_str().to_string(),
        stimulus: stimulus.to_string(),
        options: payload.options,
        correct_answer: correct_answer.to_string(),
        explanation: payload.explanation,
        trap_ids: payload.trap_ids.unwrap_or_else(|| Value::Array(Vec::new())),
        irt_b: payload.irt_b.unwrap_or_else(|| band.irt_b()),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO items
          (id, question_type_id, difficulty, stimulus, options, correct_answer,
           explanation, trap_ids, irt_b, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(item.id)
    .bind(&item.question_type_id)
    .bind(&item.difficulty)
    .bind(&item.stimulus)
    .bind(&item.options)
    .bind(&item.correct_answer)
    .bind(&item.explanation)
    .bind(&item.trap_ids)
    .bind(item.irt_b)
    .bind(item.created_at)
    .execute(proxy.pool())
    .await
    .map_err(|err| AppError::internal(format!("item sql failed: {err}")))?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            success: true,
            data: ItemEnvelope { item },
        }),
    ))
}

fn map_item_row(row: &PgRow) -> ItemRecord {
    ItemRecord {
        id: row.try_get("id").unwrap_or_default(),
        question_type_id: row.try_get("question_type_id").unwrap_or_default(),
        difficulty: row.try_get("difficulty").unwrap_or_default(),
        stimulus: row.try_get("stimulus").unwrap_or_default(),
        options: row.try_get("options").unwrap_or(None),
        correct_answer: row.try_get("correct_answer").unwrap_or_default(),
        explanation: row.try_get("explanation").unwrap_or(None),
        trap_ids: row
            .try_get("trap_ids")
            .unwrap_or_else(|_| Value::Array(Vec::new())),
        irt_b: row.try_get("irt_b").unwrap_or(0.0),
        created_at: row.try_get("created_at").unwrap_or_else(|_| Utc::now()),
    }
}
