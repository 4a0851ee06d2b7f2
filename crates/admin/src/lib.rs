//! `onboardly-admin` — admin dashboard read-side helpers.
//!
//! User list filtering (pure, in-memory) and saved filter presets. The
//! preset usage tracking workflow lives in `onboardly-infra`; this crate only
//! defines the records and the visibility rule.

pub mod filter;
pub mod preset;
pub mod state;

pub use filter::{FilterConfig, FilterOptions, SearchField, UserItem, filter_users};
pub use preset::FilterPreset;
pub use state::{FilterState, FilterStats, FilterUpdate, UserFilter};
