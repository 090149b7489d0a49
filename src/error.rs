use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the API.
///
/// Validation failures are field-scoped and serialize as `{field: message}`,
/// matching the error bodies the booking clients already consume. Storage
/// errors are never swallowed: they are logged and surfaced as 500.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A single field failed validation (seat range, show time, payload shape).
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
    /// A uniqueness constraint was violated (seat triple, theme name).
    #[error("{0}")]
    Conflict(String),
    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Malformed request outside of field validation (bad multipart, bad filter).
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// First field error out of a payload-shape validation run.
    pub fn from_validation_errors(errors: &validator::ValidationErrors) -> Self {
        for (field, field_errors) in errors.field_errors() {
            if let Some(err) = field_errors.first() {
                let message = err
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {field}."));
                return ApiError::validation(field.to_string(), message);
            }
        }
        ApiError::BadRequest("Invalid payload.".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation { field, message } => {
                (StatusCode::BAD_REQUEST, Json(json!({ field: message }))).into_response()
            }
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(json!({ "detail": message }))).into_response()
            }
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": format!("{what} not found") })),
            )
                .into_response(),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": message }))).into_response()
            }
            ApiError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error" })),
                )
                    .into_response()
            }
            ApiError::Io(e) => {
                tracing::error!("io error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Map a sqlx error onto the API taxonomy: unique violations become 409,
/// foreign-key violations become 404 for the named entity, the rest stays 500.
pub fn db_write_error(e: sqlx::Error, conflict_message: &str, fk_target: &'static str) -> ApiError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return ApiError::Conflict(conflict_message.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return ApiError::NotFound(fk_target);
        }
    }
    ApiError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn validation_error_is_field_scoped_400() {
        let err = ApiError::validation("row", "row number must be in available range: (1, rows): (1, 10)");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            json!({ "row": "row number must be in available range: (1, rows): (1, 10)" })
        );
    }

    #[tokio::test]
    async fn conflict_maps_to_409() {
        let response = ApiError::Conflict("already exists".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let response = ApiError::NotFound("show session").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "detail": "show session not found" }));
    }
}
