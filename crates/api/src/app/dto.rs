//! Response payloads. Keys are camelCase to match the admin frontend.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use onboardly_infra::{SetupOutcome, UsageSnapshot};

pub fn setup_response(outcome: SetupOutcome) -> Response {
    if outcome.already_processed {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "entityId": outcome.entity_id,
                    "setupJobId": outcome.entity_id,
                    "status": "ALREADY_PROCESSED",
                },
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "data": {
                    "entityId": outcome.entity_id,
                    "setupJobId": outcome.entity_id,
                    "status": "PENDING_VERIFICATION",
                    "verificationEstimate": "~5 minutes",
                },
            })),
        )
            .into_response()
    }
}

pub fn usage_response(snapshot: UsageSnapshot) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "usageCount": snapshot.usage_count,
            "lastUsedAt": snapshot.last_used_at,
        })),
    )
        .into_response()
}
