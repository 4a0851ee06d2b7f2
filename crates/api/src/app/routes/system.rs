use axum::{Extension, Json};
use serde_json::{Value, json};

use crate::context::{PrincipalContext, TenantContext};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Echo the authenticated identity. Useful for token debugging.
pub async fn whoami(
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Json<Value> {
    Json(json!({
        "tenantId": tenant.tenant_id(),
        "principalId": principal.principal_id(),
        "roles": principal.roles(),
    }))
}
