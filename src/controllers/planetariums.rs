use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::models::PlanetariumDome;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/planetariums", get(list_domes).post(create_dome))
        .route(
            "/planetariums/{id}",
            get(get_dome).put(update_dome).delete(delete_dome),
        )
}

#[derive(Debug, Deserialize, Validate)]
struct DomeRequest {
    #[validate(length(min = 1, max = 255, message = "This field may not be blank."))]
    name: String,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    rows: i32,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    seats_in_row: i32,
}

#[derive(Debug, Serialize)]
struct DomeResponse {
    id: i64,
    name: String,
    rows: i32,
    seats_in_row: i32,
    capacity: i32,
}

impl From<PlanetariumDome> for DomeResponse {
    fn from(dome: PlanetariumDome) -> Self {
        let capacity = dome.capacity();
        DomeResponse {
            id: dome.id,
            name: dome.name,
            rows: dome.rows,
            seats_in_row: dome.seats_in_row,
            capacity,
        }
    }
}

async fn list_domes(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let domes = sqlx::query_as::<_, PlanetariumDome>(
        r#"SELECT id, name, "rows", seats_in_row FROM planetarium_domes ORDER BY name"#,
    )
    .fetch_all(&state.db.pool)
    .await?;

    let payload: Vec<DomeResponse> = domes.into_iter().map(DomeResponse::from).collect();
    Ok(Json(payload))
}

async fn create_dome(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DomeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(|e| ApiError::from_validation_errors(&e))?;

    let dome = sqlx::query_as::<_, PlanetariumDome>(
        r#"INSERT INTO planetarium_domes (name, "rows", seats_in_row)
           VALUES ($1, $2, $3)
           RETURNING id, name, "rows", seats_in_row"#,
    )
    .bind(&req.name)
    .bind(req.rows)
    .bind(req.seats_in_row)
    .fetch_one(&state.db.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(DomeResponse::from(dome))))
}

async fn get_dome(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let dome = sqlx::query_as::<_, PlanetariumDome>(
        r#"SELECT id, name, "rows", seats_in_row FROM planetarium_domes WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or(ApiError::NotFound("planetarium dome"))?;

    Ok(Json(DomeResponse::from(dome)))
}

async fn update_dome(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<DomeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(|e| ApiError::from_validation_errors(&e))?;

    let dome = sqlx::query_as::<_, PlanetariumDome>(
        r#"UPDATE planetarium_domes
           SET name = $1, "rows" = $2, seats_in_row = $3
           WHERE id = $4
           RETURNING id, name, "rows", seats_in_row"#,
    )
    .bind(&req.name)
    .bind(req.rows)
    .bind(req.seats_in_row)
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or(ApiError::NotFound("planetarium dome"))?;

    Ok(Json(DomeResponse::from(dome)))
}

async fn delete_dome(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM planetarium_domes WHERE id = $1")
        .bind(id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("planetarium dome"));
    }

    Ok(StatusCode::NO_CONTENT)
}
