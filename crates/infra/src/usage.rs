//! Filter preset usage tracking.
//!
//! Authorizes the caller against the preset's visibility rule, then bumps the
//! usage counter. The increment itself is a storage-level atomic operation;
//! this type never does a read-then-write on the counter.

use chrono::Utc;
use thiserror::Error;

use onboardly_core::{PresetId, UserId};

use crate::store::{PresetStore, StoreError, UsageSnapshot};

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("preset not found")]
    NotFound,

    #[error("preset is private")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Tracks preset usage on behalf of an authenticated caller.
#[derive(Debug, Clone)]
pub struct UsageTracker<P> {
    presets: P,
}

impl<P> UsageTracker<P>
where
    P: PresetStore,
{
    pub fn new(presets: P) -> Self {
        Self { presets }
    }

    /// Record one use of a preset by `caller`.
    pub async fn track(&self, id: PresetId, caller: UserId) -> Result<UsageSnapshot, UsageError> {
        let preset = self
            .presets
            .find_preset(id)
            .await?
            .ok_or(UsageError::NotFound)?;

        if !preset.is_visible_to(caller) {
            return Err(UsageError::Forbidden);
        }

        // The preset may be deleted between the visibility check and the
        // increment; the atomic update reports that as None.
        self.presets
            .increment_usage(id, Utc::now())
            .await?
            .ok_or(UsageError::NotFound)
    }
}
