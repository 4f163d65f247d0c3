use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::routes::common_models::DefaultResponse;

/// Errors a handler can answer with. Every variant renders as
/// `{"success": false, "message": ...}` with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn not_found(entity: &str, id: i64) -> Self {
        ApiError::NotFound(format!("{} with id {} does not exist", entity, id))
    }

    /// Maps a failed insert/update. Unique violations get the caller's
    /// friendly message, other integrity violations keep the database text.
    pub fn from_write<F>(err: sqlx::Error, duplicate_message: F) -> Self
    where
        F: FnOnce() -> String,
    {
        let Some(db_err) = err.as_database_error() else {
            return ApiError::Database(err);
        };

        if db_err.is_unique_violation() || mentions_duplicate(db_err.message()) {
            return ApiError::Conflict(duplicate_message());
        }
        if db_err.is_foreign_key_violation() || db_err.is_check_violation() {
            return ApiError::Conflict(db_err.message().to_string());
        }
        ApiError::Database(err)
    }
}

pub fn mentions_duplicate(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    lowered.contains("duplicate") || lowered.contains("unique")
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Database(e) => {
                error!("Failed to execute query: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(DefaultResponse {
            success: false,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn duplicate_detection_matches_mysql_and_postgres_wording() {
        assert!(mentions_duplicate("Duplicate entry 'Laptop-1' for key 'costs.tenant_id'"));
        assert!(mentions_duplicate("UNIQUE constraint failed: keywords.name"));
        assert!(mentions_duplicate("duplicate key value violates unique constraint"));
        assert!(!mentions_duplicate("Cannot add or update a child row"));
    }

    #[test]
    fn non_database_errors_stay_internal() {
        let err = ApiError::from_write(sqlx::Error::RowNotFound, || "dup".into());
        assert!(matches!(err, ApiError::Database(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn status_codes_follow_variant() {
        assert_eq!(ApiError::not_found("Cost", 3).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn error_body_uses_default_response_shape() {
        let response = ApiError::not_found("Cost", 42).error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Cost with id 42 does not exist");
    }

    #[actix_web::test]
    async fn database_error_hides_details() {
        let response = ApiError::Database(sqlx::Error::PoolTimedOut).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal server error");
    }
}
