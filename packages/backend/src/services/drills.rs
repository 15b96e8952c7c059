use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use satprep_algo::{
    average_band_number, band_window, rank_error_types, DifficultyBand, DEFAULT_DIFFICULTY_RANGE,
    DEFAULT_ITEM_COUNT,
};

use crate::db::DatabaseProxy;

#[derive(Debug, thiserror::Error)]
pub enum DrillError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// A freshly planned drill.
#[derive(Debug, Serialize)]
pub struct GeneratedDrill {
    pub drill_id: Uuid,
    pub item_ids: Vec<Uuid>,
    pub question_types: Vec<String>,
}

/// Plans a drill for one user: target the question types they miss most,
/// pick items around their current band, skip anything drilled in the last
/// three days.
pub async fn generate_drill(
    proxy: &DatabaseProxy,
    user_id: &str,
    target_skill_ids: Option<Vec<String>>,
    difficulty_range: Option<Vec<DifficultyBand>>,
    item_count: Option<usize>,
) -> Result<GeneratedDrill, DrillError> {
    if user_id.trim().is_empty() {
        return Err(DrillError::Validation("user_id is required".to_string()));
    }

    let pool = proxy.pool();
    let now = Utc::now();
    // Zero counts as unset.
    let item_count = item_count.filter(|count| *count > 0).unwrap_or(DEFAULT_ITEM_COUNT);

    let error_rows = sqlx::query(
        r#"
        SELECT i.question_type_id
        FROM error_events e
        JOIN items i ON i.id = e.item_id
        WHERE e.user_id = $1 AND e.timestamp >= $2
        ORDER BY e.timestamp DESC
        LIMIT 100
        "#,
    )
    .bind(user_id)
    .bind(now - Duration::days(7))
    .fetch_all(pool)
    .await?;

    let occurrences: Vec<String> = error_rows
        .iter()
        .filter_map(|row| row.try_get("question_type_id").ok())
        .collect();

    let question_types = match target_skill_ids.filter(|ids| !ids.is_empty()) {
        Some(ids) => ids,
        None => rank_error_types(&occurrences),
    };

    let explicit_range = difficulty_range.filter(|bands| !bands.is_empty());
    let bands = match &explicit_range {
        Some(bands) => bands.clone(),
        None => {
            let band_rows =
                sqlx::query("SELECT difficulty_band FROM user_skill_states WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_all(pool)
                    .await?;
            let current_bands: Vec<DifficultyBand> = band_rows
                .iter()
                .filter_map(|row| row.try_get::<String, _>("difficulty_band").ok())
                .filter_map(|raw| DifficultyBand::from_str(&raw))
                .collect();
            band_window(average_band_number(&current_bands))
        }
    };

    let drill_rows =
        sqlx::query("SELECT item_ids FROM drills WHERE user_id = $1 AND created_at >= $2")
            .bind(user_id)
            .bind(now - Duration::days(3))
            .fetch_all(pool)
            .await?;

    let mut exclude_ids: Vec<Uuid> = Vec::new();
    for row in &drill_rows {
        if let Ok(json) = row.try_get::<Json<Vec<Uuid>>, _>("item_ids") {
            exclude_ids.extend(json.0);
        }
    }

    let item_ids = select_drill_items(pool, &question_types, &bands, &exclude_ids, item_count)
        .await?;

    let drill_id = Uuid::new_v4();
    // An omitted range is stored as the fixed default, not the computed
    // window, so re-running a stored drill is stable as the user's bands move.
    let stored_range = explicit_range.unwrap_or_else(|| DEFAULT_DIFFICULTY_RANGE.to_vec());

    sqlx::query(
        r#"
        INSERT INTO drills (id, user_id, question_type_ids, difficulty_range, item_ids, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(drill_id)
    .bind(user_id)
    .bind(Json(&question_types))
    .bind(Json(&stored_range))
    .bind(Json(&item_ids))
    .bind(now)
    .execute(pool)
    .await?;

    Ok(GeneratedDrill {
        drill_id,
        item_ids,
        question_types,
    })
}

async fn select_drill_items(
    pool: &sqlx::PgPool,
    question_types: &[String],
    bands: &[DifficultyBand],
    exclude_ids: &[Uuid],
    item_count: usize,
) -> Result<Vec<Uuid>, DrillError> {
    let mut qb =
        QueryBuilder::<sqlx::Postgres>::new("SELECT id FROM items WHERE difficulty IN (");
    {
        let mut sep = qb.separated(", ");
        for band in bands {
            sep.push_bind(band.as_str());
        }
        sep.push_unseparated(")");
    }
    // No targets means anything in range qualifies.
    if !question_types.is_empty() {
        qb.push(" AND question_type_id IN (");
        let mut sep = qb.separated(", ");
        for type_id in question_types {
            sep.push_bind(type_id.clone());
        }
        sep.push_unseparated(")");
    }
    if !exclude_ids.is_empty() {
        qb.push(" AND id NOT IN (");
        let mut sep = qb.separated(", ");
        for id in exclude_ids {
            sep.push_bind(*id);
        }
        sep.push_unseparated(")");
    }
    qb.push(" ORDER BY difficulty ASC, id ASC LIMIT ");
    qb.push_bind(item_count as i64);

    let rows = qb.build().fetch_all(pool).await?;

    Ok(rows
        .iter()
        .filter_map(|row| row.try_get("id").ok())
        .collect())
}
