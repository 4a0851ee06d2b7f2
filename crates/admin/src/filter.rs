//! Predicate-based user list filtering.
//!
//! Generic over which fields are searched and whether matching is
//! case-sensitive, so the same utility serves every admin list view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use onboardly_core::UserId;

/// A user row as shown in the admin directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserItem {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Fields the free-text search may inspect.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Email,
    Phone,
}

/// Filter criteria for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub search: String,
    pub role: Option<String>,
    pub status: Option<String>,
}

/// How matching behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub search_fields: Vec<SearchField>,
    pub case_insensitive: bool,
    /// Order results by `created_at` descending after filtering.
    pub sort_by_date: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            search_fields: vec![SearchField::Name, SearchField::Email, SearchField::Phone],
            case_insensitive: true,
            sort_by_date: true,
        }
    }
}

/// Filter a user list by free-text search plus optional role/status equality.
///
/// An empty search matches everything; `role`/`status` of `None` are ignored.
pub fn filter_users(users: &[UserItem], options: &FilterOptions, config: &FilterConfig) -> Vec<UserItem> {
    let needle = if config.case_insensitive {
        options.search.to_lowercase()
    } else {
        options.search.clone()
    };

    let mut result: Vec<UserItem> = users
        .iter()
        .filter(|u| matches_search(u, &needle, config))
        .filter(|u| options.role.as_deref().is_none_or(|r| u.role == r))
        .filter(|u| options.status.as_deref().is_none_or(|s| u.status == s))
        .cloned()
        .collect();

    if config.sort_by_date {
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    result
}

fn matches_search(user: &UserItem, needle: &str, config: &FilterConfig) -> bool {
    if needle.is_empty() {
        return true;
    }

    config.search_fields.iter().any(|field| {
        let value = match field {
            SearchField::Name => Some(user.name.as_str()),
            SearchField::Email => Some(user.email.as_str()),
            SearchField::Phone => user.phone.as_deref(),
        };

        value.is_some_and(|v| {
            if config.case_insensitive {
                v.to_lowercase().contains(needle)
            } else {
                v.contains(needle)
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn user(name: &str, email: &str, phone: &str, age_minutes: i64) -> UserItem {
        UserItem {
            id: UserId::new(),
            name: name.to_string(),
            email: email.to_string(),
            phone: Some(phone.to_string()),
            role: "user".to_string(),
            status: "active".to_string(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn case_insensitive_search_matches_by_name() {
        let users = vec![
            user("Ann", "a@x.com", "1", 0),
            user("Bo", "b@x.com", "2", 0),
        ];

        let result = filter_users(
            &users,
            &FilterOptions {
                search: "ann".to_string(),
                ..Default::default()
            },
            &FilterConfig::default(),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Ann");
    }

    #[test]
    fn search_matches_phone_field() {
        let users = vec![
            user("Ann", "a@x.com", "555-0101", 0),
            user("Bo", "b@x.com", "555-0202", 0),
        ];

        let result = filter_users(
            &users,
            &FilterOptions {
                search: "0202".to_string(),
                ..Default::default()
            },
            &FilterConfig::default(),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Bo");
    }

    #[test]
    fn role_filter_is_exact_match() {
        let mut users = vec![user("Ann", "a@x.com", "1", 0), user("Bo", "b@x.com", "2", 0)];
        users[1].role = "admin".to_string();

        let result = filter_users(
            &users,
            &FilterOptions {
                role: Some("admin".to_string()),
                ..Default::default()
            },
            &FilterConfig::default(),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Bo");
    }

    #[test]
    fn results_are_ordered_newest_first() {
        let users = vec![
            user("Old", "old@x.com", "1", 60),
            user("New", "new@x.com", "2", 1),
        ];

        let result = filter_users(&users, &FilterOptions::default(), &FilterConfig::default());
        assert_eq!(result[0].name, "New");
        assert_eq!(result[1].name, "Old");
    }

    proptest! {
        #[test]
        fn every_result_actually_matches_the_search(
            needle in "[a-z]{1,6}",
            names in proptest::collection::vec("[A-Za-z]{1,10}", 0..20),
        ) {
            let users: Vec<UserItem> = names
                .iter()
                .map(|n| user(n, "fixed@x.com", "000", 0))
                .collect();

            let result = filter_users(
                &users,
                &FilterOptions { search: needle.clone(), ..Default::default() },
                &FilterConfig { search_fields: vec![SearchField::Name], ..Default::default() },
            );

            for item in result {
                prop_assert!(item.name.to_lowercase().contains(&needle));
            }
        }
    }
}
