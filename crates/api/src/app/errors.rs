use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::ValidationErrors;

use onboardly_infra::{SetupError, UsageError};

pub fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message,
        })),
    )
        .into_response()
}

/// 400 with one entry per failed field, so clients can highlight inputs.
pub fn validation_error(errors: &ValidationErrors) -> Response {
    let mut details = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            details.push(json!({
                "field": field,
                "code": error.code,
                "message": error.message,
            }));
        }
    }

    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "validation_error",
            "message": "request body failed validation",
            "details": details,
        })),
    )
        .into_response()
}

pub fn setup_error(err: SetupError) -> Response {
    match err {
        SetupError::InFlight => json_error(
            StatusCode::CONFLICT,
            "conflict",
            "a request with this idempotency key is still being processed",
        ),
        SetupError::Store(e) => {
            tracing::error!(error = %e, "entity setup failed");
            internal_error()
        }
    }
}

pub fn usage_error(err: UsageError) -> Response {
    match err {
        UsageError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "filter preset not found")
        }
        UsageError::Forbidden => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "you do not have access to this preset",
        ),
        UsageError::Store(e) => {
            tracing::error!(error = %e, "usage tracking failed");
            internal_error()
        }
    }
}

pub fn internal_error() -> Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}
