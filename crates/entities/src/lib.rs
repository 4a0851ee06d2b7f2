//! `onboardly-entities` — business entity onboarding domain.
//!
//! Covers the setup wizard input schema, the entity/consent records it
//! produces, and the idempotency key records that make the setup flow safe to
//! retry. Storage and the workflow itself live in `onboardly-infra`.

pub mod consent;
pub mod entity;
pub mod idempotency;
pub mod wizard;

pub use consent::{Consent, NewConsent};
pub use entity::{Entity, EntityType, License, NewEntity, Registration};
pub use idempotency::{IdempotencyKeyRecord, KeyStatus};
pub use wizard::{RegistrationInput, SetupTab, SetupWizardInput};
