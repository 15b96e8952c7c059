use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use satprep_algo::{
    update_skill_state, DifficultyBand, ErrorEvent, ErrorRootCause, OutcomeTag, SkillState,
    DEFAULT_SPEED_S,
};

use crate::db::DatabaseProxy;
use crate::state::EngineParams;

#[derive(Debug, thiserror::Error)]
pub enum SkillTrackingError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// One row of `user_skill_states` as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct SkillStateRecord {
    pub user_id: String,
    pub question_type_id: String,
    pub accuracy: f64,
    pub speed: f64,
    pub difficulty_band: String,
    pub last_updated: DateTime<Utc>,
}

/// One row of `error_events` as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEventRecord {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: String,
    pub outcome: OutcomeTag,
    pub error_root_cause: Option<ErrorRootCause>,
    pub time_spent_s: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Inserts an error event and folds it into the per-question-type skill
/// state of the user. The item must exist; its question type and band drive
/// the fold.
pub async fn record_error_event(
    proxy: &DatabaseProxy,
    engine: &EngineParams,
    item_id: Uuid,
    user_id: &str,
    outcome: OutcomeTag,
    root_cause: Option<ErrorRootCause>,
    time_spent_s: Option<f64>,
) -> Result<ErrorEventRecord, SkillTrackingError> {
    let pool = proxy.pool();

    let item = sqlx::query("SELECT question_type_id, difficulty FROM items WHERE id = $1 LIMIT 1")
        .bind(item_id)
        .fetch_optional(pool)
        .await?;

    let Some(item) = item else {
        return Err(SkillTrackingError::NotFound("Item not found".to_string()));
    };

    let question_type_id: String = item.try_get("question_type_id").unwrap_or_default();
    let item_band = item
        .try_get::<String, _>("difficulty")
        .ok()
        .and_then(|raw| DifficultyBand::from_str(&raw))
        .ok_or_else(|| {
            SkillTrackingError::Validation(format!("item {item_id} has an invalid difficulty band"))
        })?;

    let event = insert_error_event(proxy, item_id, user_id, outcome, root_cause, time_spent_s)
        .await?;

    apply_outcome(
        proxy,
        engine,
        user_id,
        &question_type_id,
        outcome,
        time_spent_s,
        item_band,
    )
    .await?;

    Ok(event)
}

/// Bare insert into the error log. Callers that already know the item's
/// question type fold the skill state themselves.
pub async fn insert_error_event(
    proxy: &DatabaseProxy,
    item_id: Uuid,
    user_id: &str,
    outcome: OutcomeTag,
    root_cause: Option<ErrorRootCause>,
    time_spent_s: Option<f64>,
) -> Result<ErrorEventRecord, sqlx::Error> {
    let event_id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO error_events
          (id, item_id, user_id, outcome, error_root_cause, time_spent_s, timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(event_id)
    .bind(item_id)
    .bind(user_id)
    .bind(outcome.as_str())
    .bind(root_cause.map(|cause| cause.as_str()))
    .bind(time_spent_s)
    .bind(now)
    .execute(proxy.pool())
    .await?;

    Ok(ErrorEventRecord {
        id: event_id,
        item_id,
        user_id: user_id.to_string(),
        outcome,
        error_root_cause: root_cause,
        time_spent_s,
        timestamp: now,
    })
}

/// Read-modify-write of one skill state row. The row is locked for the
/// duration of the transaction so concurrent folds of the same skill
/// serialize instead of losing updates.
pub async fn apply_outcome(
    proxy: &DatabaseProxy,
    engine: &EngineParams,
    user_id: &str,
    question_type_id: &str,
    outcome: OutcomeTag,
    time_spent_s: Option<f64>,
    item_band: DifficultyBand,
) -> Result<SkillStateRecord, SkillTrackingError> {
    let mut tx = proxy.pool().begin().await?;

    let prior_row = sqlx::query(
        r#"
        SELECT accuracy, speed, difficulty_band, last_updated
        FROM user_skill_states
        WHERE user_id = $1 AND question_type_id = $2
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(question_type_id)
    .fetch_optional(&mut *tx)
    .await?;

    // A row with an unparsable band is treated as no history.
    let prior = prior_row.as_ref().and_then(map_prior_state);

    // A missing time sample leaves the speed average where it was.
    let time = time_spent_s.unwrap_or_else(|| {
        prior
            .as_ref()
            .map(|state| state.speed)
            .unwrap_or(DEFAULT_SPEED_S)
    });

    let next = update_skill_state(
        prior.as_ref(),
        outcome,
        time,
        item_band,
        Utc::now(),
        &engine.ewma,
    );

    sqlx::query(
        r#"
        INSERT INTO user_skill_states
          (user_id, question_type_id, accuracy, speed, difficulty_band, last_updated)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id, question_type_id) DO UPDATE SET
          accuracy = EXCLUDED.accuracy,
          speed = EXCLUDED.speed,
          difficulty_band = EXCLUDED.difficulty_band,
          last_updated = EXCLUDED.last_updated
        "#,
    )
    .bind(user_id)
    .bind(question_type_id)
    .bind(next.accuracy)
    .bind(next.speed)
    .bind(next.difficulty_band.as_str())
    .bind(next.last_updated)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(SkillStateRecord {
        user_id: user_id.to_string(),
        question_type_id: question_type_id.to_string(),
        accuracy: next.accuracy,
        speed: next.speed,
        difficulty_band: next.difficulty_band.as_str().to_string(),
        last_updated: next.last_updated,
    })
}

/// All skill states of a user, weakest accuracy first.
pub async fn list_skill_states(
    proxy: &DatabaseProxy,
    user_id: &str,
) -> Result<Vec<SkillStateRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT user_id, question_type_id, accuracy, speed, difficulty_band, last_updated
        FROM user_skill_states
        WHERE user_id = $1
        ORDER BY accuracy ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(proxy.pool())
    .await?;

    Ok(rows.iter().map(map_state_row).collect())
}

/// Recent error events of a user grouped by the question type of the item
/// they were logged against. Feeds the weakness score.
pub async fn recent_errors_by_question_type(
    proxy: &DatabaseProxy,
    user_id: &str,
    window_days: i64,
) -> Result<HashMap<String, Vec<ErrorEvent>>, sqlx::Error> {
    let since = Utc::now() - Duration::days(window_days);

    let rows = sqlx::query(
        r#"
        SELECT e.outcome, e.error_root_cause, i.question_type_id
        FROM error_events e
        JOIN items i ON i.id = e.item_id
        WHERE e.user_id = $1 AND e.timestamp >= $2
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(proxy.pool())
    .await?;

    let mut grouped: HashMap<String, Vec<ErrorEvent>> = HashMap::new();
    for row in &rows {
        let question_type_id: String = row.try_get("question_type_id").unwrap_or_default();
        let Some(outcome) = row
            .try_get::<String, _>("outcome")
            .ok()
            .and_then(|raw| OutcomeTag::from_str(&raw))
        else {
            continue;
        };
        let root_cause = row
            .try_get::<Option<String>, _>("error_root_cause")
            .ok()
            .flatten()
            .and_then(|raw| ErrorRootCause::from_str(&raw));

        grouped
            .entry(question_type_id)
            .or_default()
            .push(ErrorEvent {
                outcome,
                root_cause,
            });
    }

    Ok(grouped)
}

fn map_prior_state(row: &PgRow) -> Option<SkillState> {
    let band: String = row.try_get("difficulty_band").ok()?;
    Some(SkillState {
        accuracy: row.try_get("accuracy").ok()?,
        speed: row.try_get("speed").ok()?,
        difficulty_band: DifficultyBand::from_str(&band)?,
        last_updated: row.try_get("last_updated").ok()?,
    })
}

fn map_state_row(row: &PgRow) -> SkillStateRecord {
    SkillStateRecord {
        user_id: row.try_get("user_id").unwrap_or_default(),
        question_type_id: row.try_get("question_type_id").unwrap_or_default(),
        accuracy: row.try_get("accuracy").unwrap_or(0.0),
        speed: row.try_get("speed").unwrap_or(0.0),
        difficulty_band: row.try_get("difficulty_band").unwrap_or_default(),
        last_updated: row.try_get("last_updated").unwrap_or_else(|_| Utc::now()),
    }
}
