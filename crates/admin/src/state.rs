//! Filter state manager for the admin user directory.
//!
//! Holds the current criteria and derives the filtered view on demand; no
//! I/O, no caching. The filtered list is recomputed from the source list on
//! every call, so it can never go stale.

use crate::filter::{FilterConfig, FilterOptions, UserItem, filter_users};

/// Current filter criteria.
///
/// `roles`/`statuses` are the multi-select successors of the legacy
/// single-select `role`/`status` fields; both generations are carried while
/// the admin UI migrates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub roles: Vec<String>,
    pub statuses: Vec<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

/// A single-field merge into [`FilterState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Search(String),
    Roles(Vec<String>),
    Statuses(Vec<String>),
    Role(Option<String>),
    Status(Option<String>),
}

/// Aggregate counts for the current view.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FilterStats {
    pub total_count: usize,
    pub filtered_count: usize,
    pub is_filtered: bool,
}

/// Filter state + source list, with the derived view computed on read.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    users: Vec<UserItem>,
    filters: FilterState,
    config: FilterConfig,
}

impl UserFilter {
    pub fn new(users: Vec<UserItem>) -> Self {
        Self {
            users,
            filters: FilterState::default(),
            config: FilterConfig::default(),
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Replace the whole criteria set.
    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    /// Merge a single field update into the current criteria.
    pub fn update_filter(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Search(v) => self.filters.search = v,
            FilterUpdate::Roles(v) => self.filters.roles = v,
            FilterUpdate::Statuses(v) => self.filters.statuses = v,
            FilterUpdate::Role(v) => self.filters.role = v,
            FilterUpdate::Status(v) => self.filters.status = v,
        }
    }

    /// Reset to empty defaults.
    pub fn clear_filters(&mut self) {
        self.filters = FilterState::default();
    }

    /// Replace the source list (the view derives from it on the next read).
    pub fn set_users(&mut self, users: Vec<UserItem>) {
        self.users = users;
    }

    /// The filtered view, recomputed from the source list.
    pub fn filtered_users(&self) -> Vec<UserItem> {
        let options = FilterOptions {
            search: self.filters.search.clone(),
            role: self.filters.role.clone(),
            status: self.filters.status.clone(),
        };
        filter_users(&self.users, &options, &self.config)
    }

    /// Whether any filter is considered active.
    ///
    /// Note: only `search` and the legacy single-select fields are consulted;
    /// the multi-select `roles`/`statuses` arrays do not flip this flag. That
    /// mirrors the admin UI's current behavior (see DESIGN.md).
    pub fn has_active_filters(&self) -> bool {
        !self.filters.search.is_empty() || self.filters.role.is_some() || self.filters.status.is_some()
    }

    pub fn stats(&self) -> FilterStats {
        FilterStats {
            total_count: self.users.len(),
            filtered_count: self.filtered_users().len(),
            is_filtered: self.has_active_filters(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use onboardly_core::UserId;

    fn user(name: &str, email: &str, phone: &str) -> UserItem {
        UserItem {
            id: UserId::new(),
            name: name.to_string(),
            email: email.to_string(),
            phone: Some(phone.to_string()),
            role: "user".to_string(),
            status: "active".to_string(),
            created_at: Utc::now(),
        }
    }

    fn sample() -> Vec<UserItem> {
        vec![user("Ann", "a@x.com", "1"), user("Bo", "b@x.com", "2")]
    }

    #[test]
    fn search_derives_matching_subset() {
        let mut filter = UserFilter::new(sample());
        filter.update_filter(FilterUpdate::Search("ann".to_string()));

        let view = filter.filtered_users();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].name, "Ann");
        assert!(filter.has_active_filters());
    }

    #[test]
    fn clear_filters_resets_to_defaults() {
        let mut filter = UserFilter::new(sample());
        filter.update_filter(FilterUpdate::Search("ann".to_string()));
        filter.update_filter(FilterUpdate::Role(Some("admin".to_string())));
        filter.update_filter(FilterUpdate::Status(Some("active".to_string())));

        filter.clear_filters();

        assert_eq!(filter.filters().search, "");
        assert_eq!(filter.filters().role, None);
        assert_eq!(filter.filters().status, None);
        assert!(!filter.has_active_filters());
        assert_eq!(filter.filtered_users().len(), 2);
    }

    #[test]
    fn multi_select_fields_do_not_activate_the_flag() {
        let mut filter = UserFilter::new(sample());
        filter.update_filter(FilterUpdate::Roles(vec!["admin".to_string()]));
        filter.update_filter(FilterUpdate::Statuses(vec!["active".to_string()]));

        assert!(!filter.has_active_filters());
    }

    #[test]
    fn stats_track_counts_and_active_flag() {
        let mut filter = UserFilter::new(sample());
        let stats = filter.stats();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.filtered_count, 2);
        assert!(!stats.is_filtered);

        filter.update_filter(FilterUpdate::Search("b@x".to_string()));
        let stats = filter.stats();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.filtered_count, 1);
        assert!(stats.is_filtered);
    }

    #[test]
    fn source_list_changes_flow_into_the_view() {
        let mut filter = UserFilter::new(sample());
        filter.update_filter(FilterUpdate::Search("cy".to_string()));
        assert_eq!(filter.filtered_users().len(), 0);

        let mut users = sample();
        users.push(user("Cy", "c@x.com", "3"));
        filter.set_users(users);
        assert_eq!(filter.filtered_users().len(), 1);
        assert_eq!(filter.stats().total_count, 3);
    }
}
