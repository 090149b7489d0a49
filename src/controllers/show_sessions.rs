use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;

use crate::error::{db_write_error, ApiError};
use crate::models::{PlanetariumDome, ShowSession};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/show_sessions", get(list_sessions).post(create_session))
        .route(
            "/show_sessions/{id}",
            get(get_session).put(update_session).delete(delete_session),
        )
}

/* ---------- helpers ---------- */

/// Resolve the dome a session is played in. Used by the reservation engine to
/// validate seat coordinates against the right grid.
pub async fn session_dome(
    pool: &sqlx::PgPool,
    session_id: i64,
) -> Result<Option<PlanetariumDome>, ApiError> {
    let dome = sqlx::query_as::<_, PlanetariumDome>(
        r#"
        SELECT d.id, d.name, d."rows", d.seats_in_row
        FROM planetarium_domes d
        JOIN show_sessions ss ON ss.planetarium_dome_id = d.id
        WHERE ss.id = $1
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(dome)
}

/* ---------- SHOW SESSIONS ---------- */

#[derive(Debug, Deserialize)]
struct SessionsQuery {
    date: Option<String>,
    astronomy_show: Option<i64>,
    page: Option<u32>,
    #[serde(rename = "pageSize")]
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SessionRequest {
    astronomy_show: i64,
    planetarium_dome: i64,
    show_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    id: i64,
    show_time: DateTime<Utc>,
    astronomy_show: i64,
    planetarium_dome: i64,
}

impl From<ShowSession> for SessionResponse {
    fn from(s: ShowSession) -> Self {
        SessionResponse {
            id: s.id,
            show_time: s.show_time,
            astronomy_show: s.astronomy_show_id,
            planetarium_dome: s.planetarium_dome_id,
        }
    }
}

#[derive(Debug, FromRow, Serialize)]
struct SessionListRow {
    id: i64,
    show_time: DateTime<Utc>,
    astronomy_show_title: String,
    planetarium_dome_name: String,
    planetarium_dome_capacity: i32,
    tickets_available: i32,
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * page_size;

    // ?date= filters on the calendar day in the configured timezone
    let day_bounds = match params.date.as_deref() {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ApiError::BadRequest("date must be formatted YYYY-MM-DD".to_string()))?;
            let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
            let start = midnight
                .and_local_timezone(state.config.app.timezone)
                .earliest()
                .ok_or_else(|| ApiError::BadRequest("date does not exist in the configured timezone".to_string()))?
                .with_timezone(&Utc);
            Some((start, start + Duration::days(1)))
        }
        None => None,
    };

    let mut q = String::from(
        r#"
        SELECT ss.id, ss.show_time,
               a.title AS astronomy_show_title,
               d.name AS planetarium_dome_name,
               d."rows" * d.seats_in_row AS planetarium_dome_capacity,
               d."rows" * d.seats_in_row - COUNT(t.id)::INT AS tickets_available
        FROM show_sessions ss
        JOIN astronomy_shows a ON a.id = ss.astronomy_show_id
        JOIN planetarium_domes d ON d.id = ss.planetarium_dome_id
        LEFT JOIN tickets t ON t.show_session_id = ss.id
        WHERE true
        "#,
    );
    let mut bind_idx = 1;
    if day_bounds.is_some() {
        q.push_str(&format!(
            " AND ss.show_time >= ${} AND ss.show_time < ${}",
            bind_idx,
            bind_idx + 1
        ));
        bind_idx += 2;
    }
    if params.astronomy_show.is_some() {
        q.push_str(&format!(" AND ss.astronomy_show_id = ${bind_idx}"));
        bind_idx += 1;
    }
    q.push_str(&format!(
        " GROUP BY ss.id, ss.show_time, a.title, d.name, d.\"rows\", d.seats_in_row
          ORDER BY ss.show_time DESC
          LIMIT ${} OFFSET ${}",
        bind_idx,
        bind_idx + 1
    ));

    let mut dbq = sqlx::query_as::<_, SessionListRow>(&q);
    if let Some((start, end)) = day_bounds {
        dbq = dbq.bind(start).bind(end);
    }
    if let Some(show_id) = params.astronomy_show {
        dbq = dbq.bind(show_id);
    }

    let sessions = dbq
        .bind(page_size as i64)
        .bind(offset as i64)
        .fetch_all(&state.db.pool)
        .await?;

    Ok(Json(sessions))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ShowSession::validate_show_time(
        req.show_time,
        state.clock.now_utc(),
        state.config.app.timezone,
    )?;

    let session = sqlx::query_as::<_, ShowSession>(
        "INSERT INTO show_sessions (astronomy_show_id, planetarium_dome_id, show_time)
         VALUES ($1, $2, $3)
         RETURNING id, astronomy_show_id, planetarium_dome_id, show_time",
    )
    .bind(req.astronomy_show)
    .bind(req.planetarium_dome)
    .bind(req.show_time)
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| db_write_error(e, "duplicate show session", "astronomy show or planetarium dome"))?;

    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    #[derive(FromRow)]
    struct DetailRow {
        id: i64,
        show_time: DateTime<Utc>,
        show_id: i64,
        title: String,
        description: String,
        dome_id: i64,
        dome_name: String,
        rows: i32,
        seats_in_row: i32,
    }

    let row = sqlx::query_as::<_, DetailRow>(
        r#"
        SELECT ss.id, ss.show_time,
               a.id AS show_id, a.title, a.description,
               d.id AS dome_id, d.name AS dome_name, d."rows", d.seats_in_row
        FROM show_sessions ss
        JOIN astronomy_shows a ON a.id = ss.astronomy_show_id
        JOIN planetarium_domes d ON d.id = ss.planetarium_dome_id
        WHERE ss.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or(ApiError::NotFound("show session"))?;

    let theme_names = sqlx::query_scalar::<_, String>(
        r#"
        SELECT st.name
        FROM show_themes st
        JOIN astronomy_show_themes ast ON ast.show_theme_id = st.id
        WHERE ast.astronomy_show_id = $1
        ORDER BY st.name
        "#,
    )
    .bind(row.show_id)
    .fetch_all(&state.db.pool)
    .await?;

    let taken_places = sqlx::query_as::<_, (i32, i32)>(
        r#"SELECT "row", seat FROM tickets WHERE show_session_id = $1 ORDER BY "row", seat"#,
    )
    .bind(id)
    .fetch_all(&state.db.pool)
    .await?;

    let taken_places: Vec<serde_json::Value> = taken_places
        .into_iter()
        .map(|(r, s)| serde_json::json!({ "row": r, "seat": s }))
        .collect();

    Ok(Json(serde_json::json!({
        "id": row.id,
        "show_time": row.show_time,
        "astronomy_show": {
            "id": row.show_id,
            "title": row.title,
            "description": row.description,
            "show_themes": theme_names,
        },
        "planetarium_dome": {
            "id": row.dome_id,
            "name": row.dome_name,
            "rows": row.rows,
            "seats_in_row": row.seats_in_row,
            "capacity": row.rows * row.seats_in_row,
        },
        "taken_places": taken_places,
    })))
}

async fn update_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Full validation runs on update as well, not only on insert
    ShowSession::validate_show_time(
        req.show_time,
        state.clock.now_utc(),
        state.config.app.timezone,
    )?;

    let session = sqlx::query_as::<_, ShowSession>(
        "UPDATE show_sessions
         SET astronomy_show_id = $1, planetarium_dome_id = $2, show_time = $3
         WHERE id = $4
         RETURNING id, astronomy_show_id, planetarium_dome_id, show_time",
    )
    .bind(req.astronomy_show)
    .bind(req.planetarium_dome)
    .bind(req.show_time)
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await
    .map_err(|e| db_write_error(e, "duplicate show session", "astronomy show or planetarium dome"))?
    .ok_or(ApiError::NotFound("show session"))?;

    Ok(Json(SessionResponse::from(session)))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM show_sessions WHERE id = $1")
        .bind(id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("show session"));
    }

    Ok(StatusCode::NO_CONTENT)
}
