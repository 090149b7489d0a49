use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{db_write_error, ApiError};
use crate::models::ShowTheme;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/themes", get(list_themes).post(create_theme))
        .route(
            "/themes/{id}",
            get(get_theme).put(update_theme).delete(delete_theme),
        )
}

#[derive(Debug, Deserialize, Validate)]
struct ThemeRequest {
    #[validate(length(min = 1, max = 255, message = "This field may not be blank."))]
    name: String,
}

const NAME_TAKEN: &str = "show theme with this name already exists.";

async fn list_themes(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let themes = sqlx::query_as::<_, ShowTheme>("SELECT id, name FROM show_themes ORDER BY name")
        .fetch_all(&state.db.pool)
        .await?;

    Ok(Json(themes))
}

async fn create_theme(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ThemeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(|e| ApiError::from_validation_errors(&e))?;

    let theme = sqlx::query_as::<_, ShowTheme>(
        "INSERT INTO show_themes (name) VALUES ($1) RETURNING id, name",
    )
    .bind(&req.name)
    .fetch_one(&state.db.pool)
    .await
    .map_err(|e| db_write_error(e, NAME_TAKEN, "show theme"))?;

    Ok((StatusCode::CREATED, Json(theme)))
}

async fn get_theme(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let theme = sqlx::query_as::<_, ShowTheme>("SELECT id, name FROM show_themes WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db.pool)
        .await?
        .ok_or(ApiError::NotFound("show theme"))?;

    Ok(Json(theme))
}

async fn update_theme(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ThemeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(|e| ApiError::from_validation_errors(&e))?;

    let theme = sqlx::query_as::<_, ShowTheme>(
        "UPDATE show_themes SET name = $1 WHERE id = $2 RETURNING id, name",
    )
    .bind(&req.name)
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await
    .map_err(|e| db_write_error(e, NAME_TAKEN, "show theme"))?
    .ok_or(ApiError::NotFound("show theme"))?;

    Ok(Json(theme))
}

async fn delete_theme(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM show_themes WHERE id = $1")
        .bind(id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("show theme"));
    }

    Ok(StatusCode::NO_CONTENT)
}
