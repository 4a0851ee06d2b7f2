use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use onboardly_core::{EntityId, TenantId, UserId};

/// Lifecycle of an idempotency key row.
///
/// A key is claimed as `Pending` before any side effect runs and transitions
/// to `Processed` exactly once, when the entity it guards has been created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyStatus {
    Pending,
    Processed,
}

/// A per-tenant idempotency key row.
///
/// The pair `(tenant_id, key)` is unique; once `entity_id` is set, every
/// retry with the same key must observe the same entity id and trigger no
/// further side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyKeyRecord {
    pub tenant_id: TenantId,
    pub key: Uuid,
    pub user_id: UserId,
    pub entity_type: String,
    pub entity_id: Option<EntityId>,
    pub status: KeyStatus,
    pub created_at: DateTime<Utc>,
}

impl IdempotencyKeyRecord {
    /// A freshly claimed (unresolved) key row.
    pub fn pending(tenant_id: TenantId, key: Uuid, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            key,
            user_id,
            entity_type: "entity".to_string(),
            entity_id: None,
            status: KeyStatus::Pending,
            created_at: now,
        }
    }

    /// Whether retries with this key must short-circuit.
    pub fn is_processed(&self) -> bool {
        self.entity_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_key_is_not_processed() {
        let record =
            IdempotencyKeyRecord::pending(TenantId::new(), Uuid::now_v7(), UserId::new(), Utc::now());
        assert_eq!(record.status, KeyStatus::Pending);
        assert!(!record.is_processed());
    }

    #[test]
    fn key_with_entity_is_processed() {
        let mut record =
            IdempotencyKeyRecord::pending(TenantId::new(), Uuid::now_v7(), UserId::new(), Utc::now());
        record.entity_id = Some(EntityId::new());
        record.status = KeyStatus::Processed;
        assert!(record.is_processed());
    }
}
