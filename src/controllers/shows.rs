use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

use crate::error::{db_write_error, ApiError};
use crate::models::{AstronomyShow, ShowTheme};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows", get(list_shows).post(create_show))
        .route(
            "/shows/{id}",
            get(get_show).put(update_show).delete(delete_show),
        )
        .route("/shows/{id}/upload-image", post(upload_image))
}

/* ---------- helpers ---------- */

async fn fetch_show(pool: &sqlx::PgPool, id: i64) -> Result<AstronomyShow, ApiError> {
    sqlx::query_as::<_, AstronomyShow>(
        "SELECT id, title, description, image FROM astronomy_shows WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound("astronomy show"))
}

/// Theme names per show, for list views. Grouped in one query to avoid a
/// round trip per row.
async fn theme_names_for(
    pool: &sqlx::PgPool,
    show_ids: &[i64],
) -> Result<BTreeMap<i64, Vec<String>>, ApiError> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        r#"
        SELECT ast.astronomy_show_id, st.name
        FROM astronomy_show_themes ast
        JOIN show_themes st ON st.id = ast.show_theme_id
        WHERE ast.astronomy_show_id = ANY($1)
        ORDER BY st.name
        "#,
    )
    .bind(show_ids)
    .fetch_all(pool)
    .await?;

    let mut map: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for (show_id, name) in rows {
        map.entry(show_id).or_default().push(name);
    }
    Ok(map)
}

async fn replace_themes(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    show_id: i64,
    theme_ids: &[i64],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM astronomy_show_themes WHERE astronomy_show_id = $1")
        .bind(show_id)
        .execute(&mut **tx)
        .await?;

    for theme_id in theme_ids {
        sqlx::query(
            "INSERT INTO astronomy_show_themes (astronomy_show_id, show_theme_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(show_id)
        .bind(theme_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_write_error(e, "duplicate theme", "show theme"))?;
    }
    Ok(())
}

/* ---------- SHOWS ---------- */

#[derive(Debug, Deserialize)]
struct ShowsQuery {
    title: Option<String>,
    // comma-separated theme ids, e.g. ?show_themes=1,3
    show_themes: Option<String>,
    page: Option<u32>,
    #[serde(rename = "pageSize")]
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
struct ShowRequest {
    #[validate(length(min = 1, max = 255, message = "This field may not be blank."))]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    show_themes: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct ShowListItem {
    id: i64,
    title: String,
    description: String,
    show_themes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ShowDetail {
    id: i64,
    title: String,
    description: String,
    show_themes: Vec<ShowTheme>,
}

async fn list_shows(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ShowsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * page_size;

    let theme_ids: Option<Vec<i64>> = match params.show_themes.as_deref() {
        Some(raw) => Some(
            raw.split(',')
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.trim()
                        .parse()
                        .map_err(|_| ApiError::BadRequest("show_themes must be a comma-separated list of ids".to_string()))
                })
                .collect::<Result<_, _>>()?,
        ),
        None => None,
    };

    let mut q = String::from("SELECT id, title, description, image FROM astronomy_shows WHERE true");
    let mut bind_idx = 1;
    if params.title.is_some() {
        q.push_str(&format!(" AND title ILIKE ${bind_idx}"));
        bind_idx += 1;
    }
    if theme_ids.is_some() {
        q.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM astronomy_show_themes ast
                          WHERE ast.astronomy_show_id = astronomy_shows.id
                            AND ast.show_theme_id = ANY(${bind_idx}))"
        ));
        bind_idx += 1;
    }
    q.push_str(&format!(
        " ORDER BY title LIMIT ${} OFFSET ${}",
        bind_idx,
        bind_idx + 1
    ));

    let mut dbq = sqlx::query_as::<_, AstronomyShow>(&q);
    if let Some(title) = params.title {
        dbq = dbq.bind(format!("%{title}%"));
    }
    if let Some(ids) = theme_ids {
        dbq = dbq.bind(ids);
    }

    let shows = dbq
        .bind(page_size as i64)
        .bind(offset as i64)
        .fetch_all(&state.db.pool)
        .await?;

    let ids: Vec<i64> = shows.iter().map(|s| s.id).collect();
    let mut names = theme_names_for(&state.db.pool, &ids).await?;

    let payload: Vec<ShowListItem> = shows
        .into_iter()
        .map(|s| ShowListItem {
            show_themes: names.remove(&s.id).unwrap_or_default(),
            id: s.id,
            title: s.title,
            description: s.description,
        })
        .collect();

    Ok(Json(payload))
}

async fn create_show(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ShowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(|e| ApiError::from_validation_errors(&e))?;

    let mut tx = state.db.pool.begin().await?;

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO astronomy_shows (title, description) VALUES ($1, $2) RETURNING id",
    )
    .bind(&req.title)
    .bind(&req.description)
    .fetch_one(&mut *tx)
    .await?;

    replace_themes(&mut tx, id, &req.show_themes).await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": id,
            "title": req.title,
            "description": req.description,
            "show_themes": req.show_themes,
        })),
    ))
}

async fn get_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let show = fetch_show(&state.db.pool, id).await?;

    let themes = sqlx::query_as::<_, ShowTheme>(
        r#"
        SELECT st.id, st.name
        FROM show_themes st
        JOIN astronomy_show_themes ast ON ast.show_theme_id = st.id
        WHERE ast.astronomy_show_id = $1
        ORDER BY st.name
        "#,
    )
    .bind(id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(ShowDetail {
        id: show.id,
        title: show.title,
        description: show.description,
        show_themes: themes,
    }))
}

async fn update_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ShowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(|e| ApiError::from_validation_errors(&e))?;

    let mut tx = state.db.pool.begin().await?;

    let updated = sqlx::query("UPDATE astronomy_shows SET title = $1, description = $2 WHERE id = $3")
        .bind(&req.title)
        .bind(&req.description)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::NotFound("astronomy show"));
    }

    replace_themes(&mut tx, id, &req.show_themes).await?;

    tx.commit().await?;

    Ok(Json(serde_json::json!({
        "id": id,
        "title": req.title,
        "description": req.description,
        "show_themes": req.show_themes,
    })))
}

async fn delete_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM astronomy_shows WHERE id = $1")
        .bind(id)
        .execute(&state.db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("astronomy show"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/* ---------- IMAGE UPLOAD ---------- */

// POST /api/shows/{id}/upload-image
async fn upload_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let show = fetch_show(&state.db.pool, id).await?;

    let mut stored: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|f| std::path::Path::new(f).extension())
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let file_name = show.image_file_name(&extension);
        let relative = format!("uploads/shows/{file_name}");
        let target = state.config.media.upload_dir.join(&relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &data).await?;

        stored = Some(relative);
        break;
    }

    let image = stored.ok_or_else(|| ApiError::validation("image", "No file was submitted."))?;

    sqlx::query("UPDATE astronomy_shows SET image = $1 WHERE id = $2")
        .bind(&image)
        .bind(id)
        .execute(&state.db.pool)
        .await?;

    Ok(Json(serde_json::json!({ "id": id, "image": image })))
}
