use std::sync::Arc;

use sqlx::PgPool;

use onboardly_infra::{
    AuditStore, InMemoryStore, PostgresStore, PresetStore, SetupProcessor, SetupStore, UsageTracker,
};

/// Application services shared across request handlers.
pub struct AppServices {
    pub setup: SetupProcessor<Arc<dyn SetupStore>, Arc<dyn AuditStore>>,
    pub usage: UsageTracker<Arc<dyn PresetStore>>,
}

impl AppServices {
    pub fn from_stores(
        setup_store: Arc<dyn SetupStore>,
        audit_store: Arc<dyn AuditStore>,
        preset_store: Arc<dyn PresetStore>,
    ) -> Self {
        Self {
            setup: SetupProcessor::new(setup_store, audit_store),
            usage: UsageTracker::new(preset_store),
        }
    }

    /// Services backed by a single shared in-memory store. Returns the store
    /// handle so callers (dev mode, tests) can seed and inspect it.
    pub fn in_memory() -> (Self, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let services = Self::from_stores(
            Arc::clone(&store) as Arc<dyn SetupStore>,
            Arc::clone(&store) as Arc<dyn AuditStore>,
            Arc::clone(&store) as Arc<dyn PresetStore>,
        );
        (services, store)
    }

    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PostgresStore::new(pool));
        Self::from_stores(
            Arc::clone(&store) as Arc<dyn SetupStore>,
            Arc::clone(&store) as Arc<dyn AuditStore>,
            store as Arc<dyn PresetStore>,
        )
    }
}
