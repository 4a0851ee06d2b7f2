//! Storage backends for onboarding, presets, and the audit trail.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{AuditStore, PresetStore, SetupStore, StoreError, UsageSnapshot};
