use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::Response,
    routing::post,
};
use validator::Validate;

use onboardly_entities::SetupWizardInput;
use onboardly_infra::SetupRequestMeta;

use crate::app::{dto, errors, services::AppServices};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new().route("/setup", post(setup_entity))
}

#[tracing::instrument(skip_all, fields(tenant_id = %tenant.tenant_id()))]
async fn setup_entity(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    headers: HeaderMap,
    Json(body): Json<SetupWizardInput>,
) -> Response {
    if let Err(validation) = body.validate() {
        return errors::validation_error(&validation);
    }

    // Guaranteed by validation; guard anyway so a schema drift cannot panic.
    let Some(key) = body.idempotency_key() else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "idempotencyKey must be a UUID",
        );
    };

    let meta = SetupRequestMeta {
        ip: client_ip(&headers),
        user_agent: header_str(&headers, header::USER_AGENT.as_str()),
    };

    match services
        .setup
        .process(tenant.tenant_id(), principal.user_id(), key, &body, meta)
        .await
    {
        Ok(outcome) => dto::setup_response(outcome),
        Err(e) => errors::setup_error(e),
    }
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    // First hop of x-forwarded-for, falling back to x-real-ip.
    if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    header_str(headers, "x-real-ip")
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
