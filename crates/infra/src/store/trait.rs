use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use onboardly_admin::FilterPreset;
use onboardly_audit::{AuditEvent, NewAuditEvent};
use onboardly_core::{EntityId, PresetId, TenantId};
use onboardly_entities::{Consent, Entity, IdempotencyKeyRecord, NewConsent, NewEntity};

/// Storage operation error.
///
/// These are **infrastructure errors**; domain failures (validation,
/// authorization) never pass through here.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (e.g. a concurrent claim of the
    /// same `(tenant_id, key)` pair). Callers treat this as "someone else got
    /// there first", not as a failure.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The backend is unreachable or shut down.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result of an atomic usage increment.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub usage_count: i64,
    pub last_used_at: DateTime<Utc>,
}

/// Storage for the idempotent entity setup flow.
///
/// Implementations must enforce a unique constraint on `(tenant_id, key)` in
/// `claim_key`; the whole at-most-once guarantee of the setup flow rests on
/// it. Reads and writes are tenant-scoped throughout.
#[async_trait]
pub trait SetupStore: Send + Sync {
    /// Look up an idempotency key row for this tenant.
    async fn find_key(
        &self,
        tenant_id: TenantId,
        key: Uuid,
    ) -> Result<Option<IdempotencyKeyRecord>, StoreError>;

    /// Insert a `Pending` key row. Fails with [`StoreError::UniqueViolation`]
    /// if the `(tenant_id, key)` pair already exists.
    async fn claim_key(&self, record: IdempotencyKeyRecord) -> Result<(), StoreError>;

    /// Remove an unresolved claim so a retry can start over. Rows already
    /// marked processed are left untouched.
    async fn release_key(&self, tenant_id: TenantId, key: Uuid) -> Result<(), StoreError>;

    /// Persist a new entity, assigning its id and timestamp.
    async fn create_entity(&self, new: NewEntity) -> Result<Entity, StoreError>;

    /// Persist a consent record.
    async fn record_consent(&self, new: NewConsent) -> Result<Consent, StoreError>;

    /// Resolve a claimed key to its entity (Pending -> Processed).
    async fn mark_key_processed(
        &self,
        tenant_id: TenantId,
        key: Uuid,
        entity_id: EntityId,
    ) -> Result<(), StoreError>;

    /// Number of entities in the tenant.
    async fn count_entities(&self, tenant_id: TenantId) -> Result<u64, StoreError>;

    /// Number of consent records in the tenant.
    async fn count_consents(&self, tenant_id: TenantId) -> Result<u64, StoreError>;
}

/// Storage for admin filter presets.
#[async_trait]
pub trait PresetStore: Send + Sync {
    async fn insert_preset(&self, preset: FilterPreset) -> Result<(), StoreError>;

    async fn find_preset(&self, id: PresetId) -> Result<Option<FilterPreset>, StoreError>;

    /// Atomically increment the usage counter and stamp `last_used_at`.
    ///
    /// This must be a single storage-level read-modify-write, never an
    /// application-level read-then-write. Returns `None` if the preset no
    /// longer exists.
    async fn increment_usage(
        &self,
        id: PresetId,
        now: DateTime<Utc>,
    ) -> Result<Option<UsageSnapshot>, StoreError>;
}

/// Append-only audit trail storage.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, event: NewAuditEvent) -> Result<AuditEvent, StoreError>;

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<AuditEvent>, StoreError>;
}

#[async_trait]
impl<S> SetupStore for Arc<S>
where
    S: SetupStore + ?Sized,
{
    async fn find_key(
        &self,
        tenant_id: TenantId,
        key: Uuid,
    ) -> Result<Option<IdempotencyKeyRecord>, StoreError> {
        (**self).find_key(tenant_id, key).await
    }

    async fn claim_key(&self, record: IdempotencyKeyRecord) -> Result<(), StoreError> {
        (**self).claim_key(record).await
    }

    async fn release_key(&self, tenant_id: TenantId, key: Uuid) -> Result<(), StoreError> {
        (**self).release_key(tenant_id, key).await
    }

    async fn create_entity(&self, new: NewEntity) -> Result<Entity, StoreError> {
        (**self).create_entity(new).await
    }

    async fn record_consent(&self, new: NewConsent) -> Result<Consent, StoreError> {
        (**self).record_consent(new).await
    }

    async fn mark_key_processed(
        &self,
        tenant_id: TenantId,
        key: Uuid,
        entity_id: EntityId,
    ) -> Result<(), StoreError> {
        (**self).mark_key_processed(tenant_id, key, entity_id).await
    }

    async fn count_entities(&self, tenant_id: TenantId) -> Result<u64, StoreError> {
        (**self).count_entities(tenant_id).await
    }

    async fn count_consents(&self, tenant_id: TenantId) -> Result<u64, StoreError> {
        (**self).count_consents(tenant_id).await
    }
}

#[async_trait]
impl<S> PresetStore for Arc<S>
where
    S: PresetStore + ?Sized,
{
    async fn insert_preset(&self, preset: FilterPreset) -> Result<(), StoreError> {
        (**self).insert_preset(preset).await
    }

    async fn find_preset(&self, id: PresetId) -> Result<Option<FilterPreset>, StoreError> {
        (**self).find_preset(id).await
    }

    async fn increment_usage(
        &self,
        id: PresetId,
        now: DateTime<Utc>,
    ) -> Result<Option<UsageSnapshot>, StoreError> {
        (**self).increment_usage(id, now).await
    }
}

#[async_trait]
impl<S> AuditStore for Arc<S>
where
    S: AuditStore + ?Sized,
{
    async fn append(&self, event: NewAuditEvent) -> Result<AuditEvent, StoreError> {
        (**self).append(event).await
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<AuditEvent>, StoreError> {
        (**self).list(tenant_id).await
    }
}
