use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use onboardly_core::{TenantId, UserId};

/// An audit event ready to be appended (not yet assigned id/timestamp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEvent {
    pub tenant_id: TenantId,
    pub user_id: UserId,

    /// Dotted event type, e.g. `entity.setup.requested`.
    pub event_type: String,

    /// Resource kind the event refers to, e.g. `entity`.
    pub resource: String,

    /// Free-form structured detail payload.
    pub details: JsonValue,
}

impl NewAuditEvent {
    pub fn new(
        tenant_id: TenantId,
        user_id: UserId,
        event_type: impl Into<String>,
        resource: impl Into<String>,
        details: JsonValue,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            event_type: event_type.into(),
            resource: resource.into(),
            details,
        }
    }
}

/// A persisted audit event (append-only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub event_type: String,
    pub resource: String,
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Materialize a new event with an assigned id and timestamp.
    pub fn record(new: NewAuditEvent, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id: new.tenant_id,
            user_id: new.user_id,
            event_type: new.event_type,
            resource: new.resource,
            details: new.details,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_preserves_payload() {
        let tenant_id = TenantId::new();
        let user_id = UserId::new();
        let new = NewAuditEvent::new(
            tenant_id,
            user_id,
            "entity.setup.requested",
            "entity",
            json!({ "country": "AE" }),
        );

        let event = AuditEvent::record(new, Utc::now());
        assert_eq!(event.tenant_id, tenant_id);
        assert_eq!(event.user_id, user_id);
        assert_eq!(event.event_type, "entity.setup.requested");
        assert_eq!(event.resource, "entity");
        assert_eq!(event.details["country"], "AE");
    }
}
