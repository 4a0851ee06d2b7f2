use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use onboardly_admin::FilterPreset;
use onboardly_audit::{AuditEvent, NewAuditEvent};
use onboardly_core::{EntityId, PresetId, TenantId};
use onboardly_entities::{Consent, Entity, IdempotencyKeyRecord, KeyStatus, NewConsent, NewEntity};

use super::r#trait::{AuditStore, PresetStore, SetupStore, StoreError, UsageSnapshot};

/// In-memory store backing all three storage traits.
///
/// Intended for tests/dev. The unique-claim and atomic-increment semantics of
/// the Postgres backend are preserved: each mutation holds the write lock for
/// its full check-and-write, so concurrent claims of one key still produce
/// exactly one winner.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    keys: RwLock<HashMap<(TenantId, Uuid), IdempotencyKeyRecord>>,
    entities: RwLock<Vec<Entity>>,
    consents: RwLock<Vec<Consent>>,
    presets: RwLock<HashMap<PresetId, FilterPreset>>,
    audit: RwLock<Vec<AuditEvent>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl SetupStore for InMemoryStore {
    async fn find_key(
        &self,
        tenant_id: TenantId,
        key: Uuid,
    ) -> Result<Option<IdempotencyKeyRecord>, StoreError> {
        let keys = self.keys.read().map_err(|_| poisoned())?;
        Ok(keys.get(&(tenant_id, key)).cloned())
    }

    async fn claim_key(&self, record: IdempotencyKeyRecord) -> Result<(), StoreError> {
        let mut keys = self.keys.write().map_err(|_| poisoned())?;
        let slot = (record.tenant_id, record.key);
        if keys.contains_key(&slot) {
            return Err(StoreError::UniqueViolation(format!(
                "idempotency key {} already claimed",
                record.key
            )));
        }
        keys.insert(slot, record);
        Ok(())
    }

    async fn release_key(&self, tenant_id: TenantId, key: Uuid) -> Result<(), StoreError> {
        let mut keys = self.keys.write().map_err(|_| poisoned())?;
        if let Some(record) = keys.get(&(tenant_id, key)) {
            if record.status == KeyStatus::Pending {
                keys.remove(&(tenant_id, key));
            }
        }
        Ok(())
    }

    async fn create_entity(&self, new: NewEntity) -> Result<Entity, StoreError> {
        let entity = Entity::create(new, Utc::now());
        let mut entities = self.entities.write().map_err(|_| poisoned())?;
        entities.push(entity.clone());
        Ok(entity)
    }

    async fn record_consent(&self, new: NewConsent) -> Result<Consent, StoreError> {
        let consent = Consent::record(new, Utc::now());
        let mut consents = self.consents.write().map_err(|_| poisoned())?;
        consents.push(consent.clone());
        Ok(consent)
    }

    async fn mark_key_processed(
        &self,
        tenant_id: TenantId,
        key: Uuid,
        entity_id: EntityId,
    ) -> Result<(), StoreError> {
        let mut keys = self.keys.write().map_err(|_| poisoned())?;
        match keys.get_mut(&(tenant_id, key)) {
            Some(record) => {
                record.entity_id = Some(entity_id);
                record.status = KeyStatus::Processed;
                Ok(())
            }
            None => Err(StoreError::Backend(format!(
                "idempotency key {key} vanished before being marked processed"
            ))),
        }
    }

    async fn count_entities(&self, tenant_id: TenantId) -> Result<u64, StoreError> {
        let entities = self.entities.read().map_err(|_| poisoned())?;
        Ok(entities.iter().filter(|e| e.tenant_id == tenant_id).count() as u64)
    }

    async fn count_consents(&self, tenant_id: TenantId) -> Result<u64, StoreError> {
        let consents = self.consents.read().map_err(|_| poisoned())?;
        Ok(consents.iter().filter(|c| c.tenant_id == tenant_id).count() as u64)
    }
}

#[async_trait]
impl PresetStore for InMemoryStore {
    async fn insert_preset(&self, preset: FilterPreset) -> Result<(), StoreError> {
        let mut presets = self.presets.write().map_err(|_| poisoned())?;
        presets.insert(preset.id, preset);
        Ok(())
    }

    async fn find_preset(&self, id: PresetId) -> Result<Option<FilterPreset>, StoreError> {
        let presets = self.presets.read().map_err(|_| poisoned())?;
        Ok(presets.get(&id).cloned())
    }

    async fn increment_usage(
        &self,
        id: PresetId,
        now: DateTime<Utc>,
    ) -> Result<Option<UsageSnapshot>, StoreError> {
        // Counter bump and timestamp happen under one write lock, mirroring
        // the single UPDATE the Postgres backend issues.
        let mut presets = self.presets.write().map_err(|_| poisoned())?;
        Ok(presets.get_mut(&id).map(|preset| {
            preset.usage_count += 1;
            preset.last_used_at = Some(now);
            UsageSnapshot {
                usage_count: preset.usage_count,
                last_used_at: now,
            }
        }))
    }
}

#[async_trait]
impl AuditStore for InMemoryStore {
    async fn append(&self, event: NewAuditEvent) -> Result<AuditEvent, StoreError> {
        let event = AuditEvent::record(event, Utc::now());
        let mut audit = self.audit.write().map_err(|_| poisoned())?;
        audit.push(event.clone());
        Ok(event)
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<AuditEvent>, StoreError> {
        let audit = self.audit.read().map_err(|_| poisoned())?;
        Ok(audit
            .iter()
            .filter(|e| e.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use onboardly_core::UserId;

    #[tokio::test]
    async fn second_claim_of_same_key_is_a_unique_violation() {
        let store = InMemoryStore::new();
        let tenant_id = TenantId::new();
        let key = Uuid::now_v7();

        let record = IdempotencyKeyRecord::pending(tenant_id, key, UserId::new(), Utc::now());
        store.claim_key(record.clone()).await.unwrap();

        let err = store.claim_key(record).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn same_key_under_different_tenants_is_not_a_conflict() {
        let store = InMemoryStore::new();
        let key = Uuid::now_v7();

        let a = IdempotencyKeyRecord::pending(TenantId::new(), key, UserId::new(), Utc::now());
        let b = IdempotencyKeyRecord::pending(TenantId::new(), key, UserId::new(), Utc::now());

        store.claim_key(a).await.unwrap();
        store.claim_key(b).await.unwrap();
    }

    #[tokio::test]
    async fn release_only_removes_pending_claims() {
        let store = InMemoryStore::new();
        let tenant_id = TenantId::new();
        let key = Uuid::now_v7();

        let record = IdempotencyKeyRecord::pending(tenant_id, key, UserId::new(), Utc::now());
        store.claim_key(record).await.unwrap();
        store
            .mark_key_processed(tenant_id, key, EntityId::new())
            .await
            .unwrap();

        store.release_key(tenant_id, key).await.unwrap();
        let found = store.find_key(tenant_id, key).await.unwrap();
        assert!(found.is_some_and(|r| r.is_processed()));
    }

    #[tokio::test]
    async fn concurrent_increments_count_every_call() {
        let store = Arc::new(InMemoryStore::new());
        let id = PresetId::new();
        store
            .insert_preset(FilterPreset {
                id,
                name: "all".to_string(),
                is_public: true,
                created_by: UserId::new(),
                usage_count: 0,
                last_used_at: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.increment_usage(id, Utc::now()).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let preset = store.find_preset(id).await.unwrap().unwrap();
        assert_eq!(preset.usage_count, 32);
        assert!(preset.last_used_at.is_some());
    }
}
