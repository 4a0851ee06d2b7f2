use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use onboardly_core::{EntityId, TenantId, UserId};

/// Consent record captured when a setup attempt reaches entity creation.
///
/// One record per attempt; created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConsent {
    pub tenant_id: TenantId,
    pub entity_id: EntityId,
    pub consent_type: String,
    pub version: String,
    pub accepted_by: UserId,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl NewConsent {
    /// Terms-of-service consent for an entity setup.
    pub fn terms(
        tenant_id: TenantId,
        entity_id: EntityId,
        version: impl Into<String>,
        accepted_by: UserId,
        ip: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            tenant_id,
            entity_id,
            consent_type: "terms".to_string(),
            version: version.into(),
            accepted_by,
            ip,
            user_agent,
        }
    }
}

/// A persisted consent record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consent {
    pub tenant_id: TenantId,
    pub entity_id: EntityId,
    pub consent_type: String,
    pub version: String,
    pub accepted_by: UserId,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Consent {
    pub fn record(new: NewConsent, now: DateTime<Utc>) -> Self {
        Self {
            tenant_id: new.tenant_id,
            entity_id: new.entity_id,
            consent_type: new.consent_type,
            version: new.version,
            accepted_by: new.accepted_by,
            ip: new.ip,
            user_agent: new.user_agent,
            created_at: now,
        }
    }
}
