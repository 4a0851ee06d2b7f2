//! Postgres-backed storage implementation.
//!
//! One pool-backed store implements all three storage traits. Tenant
//! isolation is enforced by including `tenant_id` in every WHERE clause, and
//! the two concurrency-sensitive operations are pushed down to the database:
//!
//! - `claim_key` relies on the `UNIQUE (tenant_id, key)` constraint on
//!   `idempotency_keys`; a concurrent duplicate insert surfaces as error code
//!   `23505` and is mapped to [`StoreError::UniqueViolation`].
//! - `increment_usage` is a single
//!   `UPDATE ... SET usage_count = usage_count + 1 ... RETURNING` statement,
//!   so concurrent calls serialize on the row and every call is counted.
//!
//! ## Error mapping
//!
//! | SQLx error | Postgres code | StoreError |
//! |------------|---------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` |
//! | Database (other) | any other | `Backend` |
//! | PoolClosed | n/a | `Unavailable` |
//! | Other | n/a | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use onboardly_admin::FilterPreset;
use onboardly_audit::{AuditEvent, NewAuditEvent};
use onboardly_core::{EntityId, PresetId, TenantId, UserId};
use onboardly_entities::{Consent, Entity, IdempotencyKeyRecord, KeyStatus, NewConsent, NewEntity};

use super::r#trait::{AuditStore, PresetStore, SetupStore, StoreError, UsageSnapshot};

/// Postgres-backed store. Cloneable; all clones share one pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl SetupStore for PostgresStore {
    #[instrument(skip(self), fields(tenant_id = %tenant_id, key = %key), err)]
    async fn find_key(
        &self,
        tenant_id: TenantId,
        key: Uuid,
    ) -> Result<Option<IdempotencyKeyRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, key, user_id, entity_type, entity_id, status, created_at
            FROM idempotency_keys
            WHERE tenant_id = $1 AND key = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(key)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_key", e))?;

        row.map(|r| {
            IdempotencyKeyRow::from_row(&r)
                .map_err(|e| StoreError::Backend(format!("failed to decode key row: {e}")))
                .and_then(IdempotencyKeyRow::into_record)
        })
        .transpose()
    }

    #[instrument(skip(self, record), fields(tenant_id = %record.tenant_id, key = %record.key), err)]
    async fn claim_key(&self, record: IdempotencyKeyRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO idempotency_keys
                (tenant_id, key, user_id, entity_type, entity_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.tenant_id.as_uuid())
        .bind(record.key)
        .bind(record.user_id.as_uuid())
        .bind(&record.entity_type)
        .bind(record.entity_id.map(Uuid::from))
        .bind(status_str(record.status))
        .bind(record.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("claim_key", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, key = %key), err)]
    async fn release_key(&self, tenant_id: TenantId, key: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM idempotency_keys
            WHERE tenant_id = $1 AND key = $2 AND status = 'PENDING'
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(key)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("release_key", e))?;

        Ok(())
    }

    #[instrument(skip(self, new), fields(tenant_id = %new.tenant_id), err)]
    async fn create_entity(&self, new: NewEntity) -> Result<Entity, StoreError> {
        let entity = Entity::create(new, Utc::now());

        let licenses = serde_json::to_value(&entity.licenses)
            .map_err(|e| StoreError::Backend(format!("failed to encode licenses: {e}")))?;
        let registrations = serde_json::to_value(&entity.registrations)
            .map_err(|e| StoreError::Backend(format!("failed to encode registrations: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO entities
                (id, tenant_id, name, country, legal_form, entity_type,
                 licenses, registrations, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entity.id.as_uuid())
        .bind(entity.tenant_id.as_uuid())
        .bind(&entity.name)
        .bind(&entity.country)
        .bind(&entity.legal_form)
        .bind(entity_type_str(entity.entity_type))
        .bind(licenses)
        .bind(registrations)
        .bind(entity.created_by.as_uuid())
        .bind(entity.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_entity", e))?;

        Ok(entity)
    }

    #[instrument(skip(self, new), fields(tenant_id = %new.tenant_id, entity_id = %new.entity_id), err)]
    async fn record_consent(&self, new: NewConsent) -> Result<Consent, StoreError> {
        let consent = Consent::record(new, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO consents
                (tenant_id, entity_id, consent_type, version, accepted_by, ip, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(consent.tenant_id.as_uuid())
        .bind(consent.entity_id.as_uuid())
        .bind(&consent.consent_type)
        .bind(&consent.version)
        .bind(consent.accepted_by.as_uuid())
        .bind(&consent.ip)
        .bind(&consent.user_agent)
        .bind(consent.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("record_consent", e))?;

        Ok(consent)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, key = %key, entity_id = %entity_id), err)]
    async fn mark_key_processed(
        &self,
        tenant_id: TenantId,
        key: Uuid,
        entity_id: EntityId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE idempotency_keys
            SET entity_id = $3, status = 'PROCESSED'
            WHERE tenant_id = $1 AND key = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(key)
        .bind(entity_id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("mark_key_processed", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(format!(
                "idempotency key {key} vanished before being marked processed"
            )));
        }

        Ok(())
    }

    async fn count_entities(&self, tenant_id: TenantId) -> Result<u64, StoreError> {
        count(&self.pool, "entities", tenant_id).await
    }

    async fn count_consents(&self, tenant_id: TenantId) -> Result<u64, StoreError> {
        count(&self.pool, "consents", tenant_id).await
    }
}

#[async_trait]
impl PresetStore for PostgresStore {
    #[instrument(skip(self, preset), fields(preset_id = %preset.id), err)]
    async fn insert_preset(&self, preset: FilterPreset) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO filter_presets
                (id, name, is_public, created_by, usage_count, last_used_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(preset.id.as_uuid())
        .bind(&preset.name)
        .bind(preset.is_public)
        .bind(preset.created_by.as_uuid())
        .bind(preset.usage_count)
        .bind(preset.last_used_at)
        .bind(preset.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_preset", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(preset_id = %id), err)]
    async fn find_preset(&self, id: PresetId) -> Result<Option<FilterPreset>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, is_public, created_by, usage_count, last_used_at, created_at
            FROM filter_presets
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_preset", e))?;

        row.map(|r| {
            FilterPresetRow::from_row(&r)
                .map(FilterPresetRow::into_preset)
                .map_err(|e| StoreError::Backend(format!("failed to decode preset row: {e}")))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(preset_id = %id), err)]
    async fn increment_usage(
        &self,
        id: PresetId,
        now: DateTime<Utc>,
    ) -> Result<Option<UsageSnapshot>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE filter_presets
            SET usage_count = usage_count + 1, last_used_at = $2
            WHERE id = $1
            RETURNING usage_count, last_used_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(now)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("increment_usage", e))?;

        row.map(|r| {
            let usage_count: i64 = r
                .try_get("usage_count")
                .map_err(|e| StoreError::Backend(format!("failed to decode usage row: {e}")))?;
            let last_used_at: DateTime<Utc> = r
                .try_get("last_used_at")
                .map_err(|e| StoreError::Backend(format!("failed to decode usage row: {e}")))?;
            Ok(UsageSnapshot {
                usage_count,
                last_used_at,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl AuditStore for PostgresStore {
    #[instrument(skip(self, event), fields(tenant_id = %event.tenant_id, event_type = %event.event_type), err)]
    async fn append(&self, event: NewAuditEvent) -> Result<AuditEvent, StoreError> {
        let event = AuditEvent::record(event, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO audit_events
                (id, tenant_id, user_id, event_type, resource, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id)
        .bind(event.tenant_id.as_uuid())
        .bind(event.user_id.as_uuid())
        .bind(&event.event_type)
        .bind(&event.resource)
        .bind(&event.details)
        .bind(event.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_audit", e))?;

        Ok(event)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn list(&self, tenant_id: TenantId) -> Result<Vec<AuditEvent>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, user_id, event_type, resource, details, created_at
            FROM audit_events
            WHERE tenant_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_audit", e))?;

        rows.iter()
            .map(|r| {
                AuditEventRow::from_row(r)
                    .map(AuditEventRow::into_event)
                    .map_err(|e| StoreError::Backend(format!("failed to decode audit row: {e}")))
            })
            .collect()
    }
}

async fn count(pool: &PgPool, table: &str, tenant_id: TenantId) -> Result<u64, StoreError> {
    // `table` is one of our own table names, never caller input.
    let sql = format!("SELECT COUNT(*) AS n FROM {table} WHERE tenant_id = $1");
    let row = sqlx::query(&sql)
        .bind(tenant_id.as_uuid())
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error("count", e))?;

    let n: i64 = row
        .try_get("n")
        .map_err(|e| StoreError::Backend(format!("failed to decode count: {e}")))?;
    Ok(n as u64)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.code().as_deref() == Some("23505") {
                StoreError::UniqueViolation(msg)
            } else {
                StoreError::Backend(msg)
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Backend(format!("error in {operation}: {other}")),
    }
}

fn status_str(status: KeyStatus) -> &'static str {
    match status {
        KeyStatus::Pending => "PENDING",
        KeyStatus::Processed => "PROCESSED",
    }
}

fn entity_type_str(entity_type: onboardly_entities::EntityType) -> &'static str {
    match entity_type {
        onboardly_entities::EntityType::Company => "company",
        onboardly_entities::EntityType::Individual => "individual",
    }
}

// SQLx row types

#[derive(Debug)]
struct IdempotencyKeyRow {
    tenant_id: Uuid,
    key: Uuid,
    user_id: Uuid,
    entity_type: String,
    entity_id: Option<Uuid>,
    status: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for IdempotencyKeyRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            tenant_id: row.try_get("tenant_id")?,
            key: row.try_get("key")?,
            user_id: row.try_get("user_id")?,
            entity_type: row.try_get("entity_type")?,
            entity_id: row.try_get("entity_id")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl IdempotencyKeyRow {
    fn into_record(self) -> Result<IdempotencyKeyRecord, StoreError> {
        let status = match self.status.as_str() {
            "PENDING" => KeyStatus::Pending,
            "PROCESSED" => KeyStatus::Processed,
            other => {
                return Err(StoreError::Backend(format!(
                    "unknown idempotency key status '{other}'"
                )));
            }
        };

        Ok(IdempotencyKeyRecord {
            tenant_id: TenantId::from_uuid(self.tenant_id),
            key: self.key,
            user_id: UserId::from_uuid(self.user_id),
            entity_type: self.entity_type,
            entity_id: self.entity_id.map(EntityId::from_uuid),
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug)]
struct FilterPresetRow {
    id: Uuid,
    name: String,
    is_public: bool,
    created_by: Uuid,
    usage_count: i64,
    last_used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for FilterPresetRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            is_public: row.try_get("is_public")?,
            created_by: row.try_get("created_by")?,
            usage_count: row.try_get("usage_count")?,
            last_used_at: row.try_get("last_used_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl FilterPresetRow {
    fn into_preset(self) -> FilterPreset {
        FilterPreset {
            id: PresetId::from_uuid(self.id),
            name: self.name,
            is_public: self.is_public,
            created_by: UserId::from_uuid(self.created_by),
            usage_count: self.usage_count,
            last_used_at: self.last_used_at,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug)]
struct AuditEventRow {
    id: Uuid,
    tenant_id: Uuid,
    user_id: Uuid,
    event_type: String,
    resource: String,
    details: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for AuditEventRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            user_id: row.try_get("user_id")?,
            event_type: row.try_get("event_type")?,
            resource: row.try_get("resource")?,
            details: row.try_get("details")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl AuditEventRow {
    fn into_event(self) -> AuditEvent {
        AuditEvent {
            id: self.id,
            tenant_id: TenantId::from_uuid(self.tenant_id),
            user_id: UserId::from_uuid(self.user_id),
            event_type: self.event_type,
            resource: self.resource,
            details: self.details,
            created_at: self.created_at,
        }
    }
}
