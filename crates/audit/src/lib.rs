//! `onboardly-audit` — append-only audit trail model.
//!
//! Audit events record *who did what to which resource* inside a tenant.
//! They are created once and never mutated; storage backends live in
//! `onboardly-infra`.

pub mod event;

pub use event::{AuditEvent, NewAuditEvent};
