//! `onboardly-infra` — storage and server-side workflows.
//!
//! Storage is trait-based with two backends: in-memory (tests/dev) and
//! Postgres (production, sqlx). Concurrency correctness is delegated to the
//! storage layer: the idempotency claim relies on a unique constraint on
//! `(tenant_id, key)`, and the preset usage counter is a single atomic
//! read-modify-write.

pub mod setup;
pub mod store;
pub mod usage;

pub use setup::{SetupError, SetupOutcome, SetupProcessor, SetupRequestMeta};
pub use store::{
    AuditStore, InMemoryStore, PostgresStore, PresetStore, SetupStore, StoreError, UsageSnapshot,
};
pub use usage::{UsageError, UsageTracker};
