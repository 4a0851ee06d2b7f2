//! Idempotent entity setup workflow.
//!
//! The core contract: for a given `(tenant_id, idempotency_key)` pair the
//! entity/consent side effects run at most once, no matter how often the
//! request is retried and no matter how many copies race.
//!
//! Ordering is claim-first: the key row is claimed (`Pending`) *before* any
//! side effect. Two concurrent first-time requests both miss the lookup, but
//! only one insert survives the unique constraint; the loser re-fetches and
//! either sees the winner's entity or reports the claim as still in flight.

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use onboardly_audit::NewAuditEvent;
use onboardly_core::{EntityId, TenantId, UserId};
use onboardly_entities::{IdempotencyKeyRecord, NewConsent, NewEntity, SetupWizardInput};

use crate::store::{AuditStore, SetupStore, StoreError};

/// Request metadata recorded alongside consent.
#[derive(Debug, Clone, Default)]
pub struct SetupRequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Result of a setup request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SetupOutcome {
    pub entity_id: EntityId,
    /// True when this request was a retry of an already-completed setup and
    /// no side effects ran.
    pub already_processed: bool,
}

#[derive(Debug, Error)]
pub enum SetupError {
    /// Another request holding the same idempotency key is still being
    /// processed; the caller should retry shortly.
    #[error("a request with this idempotency key is still being processed")]
    InFlight,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Executes validated setup wizard submissions against storage.
#[derive(Debug, Clone)]
pub struct SetupProcessor<S, A> {
    store: S,
    audit: A,
}

impl<S, A> SetupProcessor<S, A>
where
    S: SetupStore,
    A: AuditStore,
{
    pub fn new(store: S, audit: A) -> Self {
        Self { store, audit }
    }

    /// Run one setup request. `input` must already have passed schema
    /// validation; `key` is its parsed idempotency key.
    pub async fn process(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        key: Uuid,
        input: &SetupWizardInput,
        meta: SetupRequestMeta,
    ) -> Result<SetupOutcome, SetupError> {
        // Fast path: key already resolved, return the same entity again.
        if let Some(existing) = self.store.find_key(tenant_id, key).await? {
            return resolve_existing(existing);
        }

        let record = IdempotencyKeyRecord::pending(tenant_id, key, user_id, Utc::now());
        match self.store.claim_key(record).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation(_)) => {
                // Lost the race. Surface whatever the winner produced.
                return match self.store.find_key(tenant_id, key).await? {
                    Some(existing) => resolve_existing(existing),
                    None => Err(SetupError::InFlight),
                };
            }
            Err(e) => return Err(e.into()),
        }

        match self.run_side_effects(tenant_id, user_id, input, meta).await {
            Ok(entity_id) => {
                self.store.mark_key_processed(tenant_id, key, entity_id).await?;

                // Audit marks the *request*, so a setup that later fails
                // verification still leaves a trace.
                self.audit
                    .append(NewAuditEvent::new(
                        tenant_id,
                        user_id,
                        "entity.setup.requested",
                        "entity",
                        json!({
                            "entity_id": entity_id,
                            "country": input.country,
                            "tab": input.tab,
                        }),
                    ))
                    .await?;

                tracing::info!(
                    entity_id = %entity_id,
                    country = %input.country,
                    tab = %input.tab,
                    "entity setup initiated"
                );

                Ok(SetupOutcome {
                    entity_id,
                    already_processed: false,
                })
            }
            Err(e) => {
                // Release the claim so a retry can start over. Best effort: if
                // this also fails the key stays Pending and retries see 409.
                if let Err(release_err) = self.store.release_key(tenant_id, key).await {
                    tracing::warn!(
                        key = %key,
                        error = %release_err,
                        "failed to release idempotency claim after error"
                    );
                }
                Err(e)
            }
        }
    }

    async fn run_side_effects(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        input: &SetupWizardInput,
        meta: SetupRequestMeta,
    ) -> Result<EntityId, SetupError> {
        let entity = self
            .store
            .create_entity(NewEntity::from_wizard(tenant_id, user_id, input))
            .await?;

        self.store
            .record_consent(NewConsent::terms(
                tenant_id,
                entity.id,
                &input.consent_version,
                user_id,
                meta.ip,
                meta.user_agent,
            ))
            .await?;

        Ok(entity.id)
    }
}

fn resolve_existing(existing: IdempotencyKeyRecord) -> Result<SetupOutcome, SetupError> {
    match existing.entity_id {
        Some(entity_id) => Ok(SetupOutcome {
            entity_id,
            already_processed: true,
        }),
        // Claimed but unresolved: the first request is still running.
        None => Err(SetupError::InFlight),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::store::InMemoryStore;

    fn wizard_input(key: Uuid) -> SetupWizardInput {
        serde_json::from_value(json!({
            "country": "AE",
            "tab": "existing",
            "businessName": "Acme Trading LLC",
            "legalForm": "LLC",
            "licenseNumber": "CN-1234567",
            "consentVersion": "2024-11",
            "idempotencyKey": key.to_string(),
        }))
        .unwrap()
    }

    fn processor() -> (SetupProcessor<Arc<InMemoryStore>, Arc<InMemoryStore>>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (
            SetupProcessor::new(Arc::clone(&store), Arc::clone(&store)),
            store,
        )
    }

    #[tokio::test]
    async fn first_request_creates_entity_consent_and_audit() {
        let (processor, store) = processor();
        let tenant_id = TenantId::new();
        let user_id = UserId::new();
        let key = Uuid::now_v7();

        let outcome = processor
            .process(tenant_id, user_id, key, &wizard_input(key), SetupRequestMeta::default())
            .await
            .unwrap();

        assert!(!outcome.already_processed);
        assert_eq!(store.count_entities(tenant_id).await.unwrap(), 1);
        assert_eq!(store.count_consents(tenant_id).await.unwrap(), 1);

        let trail = store.list(tenant_id).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].event_type, "entity.setup.requested");
        assert_eq!(trail[0].resource, "entity");
    }

    #[tokio::test]
    async fn retry_with_same_key_is_side_effect_free() {
        let (processor, store) = processor();
        let tenant_id = TenantId::new();
        let user_id = UserId::new();
        let key = Uuid::now_v7();
        let input = wizard_input(key);

        let first = processor
            .process(tenant_id, user_id, key, &input, SetupRequestMeta::default())
            .await
            .unwrap();
        let second = processor
            .process(tenant_id, user_id, key, &input, SetupRequestMeta::default())
            .await
            .unwrap();

        assert!(second.already_processed);
        assert_eq!(second.entity_id, first.entity_id);
        assert_eq!(store.count_entities(tenant_id).await.unwrap(), 1);
        assert_eq!(store.count_consents(tenant_id).await.unwrap(), 1);
        assert_eq!(store.list(tenant_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_create_distinct_entities() {
        let (processor, store) = processor();
        let tenant_id = TenantId::new();
        let user_id = UserId::new();

        let key_a = Uuid::now_v7();
        let key_b = Uuid::now_v7();

        let a = processor
            .process(tenant_id, user_id, key_a, &wizard_input(key_a), SetupRequestMeta::default())
            .await
            .unwrap();
        let b = processor
            .process(tenant_id, user_id, key_b, &wizard_input(key_b), SetupRequestMeta::default())
            .await
            .unwrap();

        assert_ne!(a.entity_id, b.entity_id);
        assert_eq!(store.count_entities(tenant_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn same_key_in_different_tenants_is_independent() {
        let (processor, store) = processor();
        let user_id = UserId::new();
        let key = Uuid::now_v7();

        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();

        processor
            .process(tenant_a, user_id, key, &wizard_input(key), SetupRequestMeta::default())
            .await
            .unwrap();
        let outcome = processor
            .process(tenant_b, user_id, key, &wizard_input(key), SetupRequestMeta::default())
            .await
            .unwrap();

        assert!(!outcome.already_processed);
        assert_eq!(store.count_entities(tenant_a).await.unwrap(), 1);
        assert_eq!(store.count_entities(tenant_b).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_time_requests_create_exactly_one_entity() {
        let (processor, store) = processor();
        let processor = Arc::new(processor);
        let tenant_id = TenantId::new();
        let user_id = UserId::new();
        let key = Uuid::now_v7();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let processor = Arc::clone(&processor);
            let input = wizard_input(key);
            handles.push(tokio::spawn(async move {
                processor
                    .process(tenant_id, user_id, key, &input, SetupRequestMeta::default())
                    .await
            }));
        }

        let mut created = 0;
        let mut winners = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(outcome) => {
                    if !outcome.already_processed {
                        created += 1;
                    }
                    winners.push(outcome.entity_id);
                }
                // Losers that observed an unresolved claim are allowed to ask
                // the caller to retry; they must not have created anything.
                Err(SetupError::InFlight) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.count_entities(tenant_id).await.unwrap(), 1);
        assert_eq!(store.count_consents(tenant_id).await.unwrap(), 1);
        assert!(winners.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn consent_captures_request_metadata() {
        let (processor, store) = processor();
        let tenant_id = TenantId::new();
        let key = Uuid::now_v7();

        processor
            .process(
                tenant_id,
                UserId::new(),
                key,
                &wizard_input(key),
                SetupRequestMeta {
                    ip: Some("203.0.113.9".to_string()),
                    user_agent: Some("onboardly-test/1.0".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(store.count_consents(tenant_id).await.unwrap(), 1);
    }
}
