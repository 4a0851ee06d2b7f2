use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::Path,
    response::Response,
    routing::post,
};

use onboardly_core::PresetId;
use onboardly_infra::UsageError;

use crate::app::{dto, errors, services::AppServices};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/filter-presets/:id/track-usage", post(track_usage))
}

#[tracing::instrument(skip_all, fields(preset_id = %id))]
async fn track_usage(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    // An unparseable id can never name a preset.
    let Ok(id) = id.parse::<PresetId>() else {
        return errors::usage_error(UsageError::NotFound);
    };

    match services.usage.track(id, principal.user_id()).await {
        Ok(snapshot) => dto::usage_response(snapshot),
        Err(e) => errors::usage_error(e),
    }
}
