use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use onboardly_core::{PresetId, UserId};

/// A saved admin filter preset.
///
/// `usage_count` only ever moves up, via an atomic storage-level increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPreset {
    pub id: PresetId,
    pub name: String,
    pub is_public: bool,
    pub created_by: UserId,
    pub usage_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FilterPreset {
    /// Visibility rule: public presets are visible to everyone, private ones
    /// only to their creator.
    pub fn is_visible_to(&self, user_id: UserId) -> bool {
        self.is_public || self.created_by == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(is_public: bool, created_by: UserId) -> FilterPreset {
        FilterPreset {
            id: PresetId::new(),
            name: "active admins".to_string(),
            is_public,
            created_by,
            usage_count: 0,
            last_used_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn public_preset_is_visible_to_anyone() {
        let p = preset(true, UserId::new());
        assert!(p.is_visible_to(UserId::new()));
    }

    #[test]
    fn private_preset_is_owner_only() {
        let owner = UserId::new();
        let p = preset(false, owner);
        assert!(p.is_visible_to(owner));
        assert!(!p.is_visible_to(UserId::new()));
    }
}
