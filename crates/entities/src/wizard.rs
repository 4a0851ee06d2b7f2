//! Setup wizard input schema.
//!
//! Mirrors the onboarding wizard payload: the client posts its collected form
//! state plus a self-generated idempotency key so the request can be retried
//! safely. Validation failures carry per-field details up to the API layer.

use core::str::FromStr;

use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entity::EntityType;

/// Which wizard tab the submission came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SetupTab {
    /// Existing registered business.
    Existing,
    /// Business being newly formed.
    New,
    /// Sole individual (no company).
    Individual,
}

impl SetupTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupTab::Existing => "existing",
            SetupTab::New => "new",
            SetupTab::Individual => "individual",
        }
    }
}

impl FromStr for SetupTab {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "existing" => Ok(SetupTab::Existing),
            "new" => Ok(SetupTab::New),
            "individual" => Ok(SetupTab::Individual),
            _ => Err(()),
        }
    }
}

/// A government/authority registration reference entered in the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrationInput {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// Validated body of `POST /api/entities/setup`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetupWizardInput {
    /// ISO 3166-1 alpha-2 country code.
    #[validate(length(equal = 2, message = "country must be a 2-letter code"))]
    pub country: String,

    #[validate(custom(function = validate_tab))]
    pub tab: String,

    #[validate(length(min = 1, max = 255, message = "businessName must be 1-255 characters"))]
    pub business_name: String,

    pub legal_form: Option<String>,

    pub license_number: Option<String>,

    pub economic_zone_id: Option<String>,

    #[serde(default)]
    pub registrations: Vec<RegistrationInput>,

    #[validate(length(min = 1, message = "consentVersion is required"))]
    pub consent_version: String,

    /// Client-generated token; a retried request reuses the same value.
    #[validate(custom(function = validate_idempotency_key))]
    pub idempotency_key: String,
}

impl SetupWizardInput {
    /// The tab as a typed value. Only meaningful after `validate()` passed.
    pub fn tab(&self) -> Option<SetupTab> {
        self.tab.parse().ok()
    }

    /// The idempotency key as a UUID. Only meaningful after `validate()` passed.
    pub fn idempotency_key(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.idempotency_key).ok()
    }

    /// Entity type implied by the wizard tab.
    pub fn entity_type(&self) -> EntityType {
        match self.tab() {
            Some(SetupTab::Individual) => EntityType::Individual,
            _ => EntityType::Company,
        }
    }
}

fn validate_tab(value: &str) -> Result<(), ValidationError> {
    if value.parse::<SetupTab>().is_ok() {
        return Ok(());
    }
    let mut err = ValidationError::new("tab");
    err.message = Some("tab must be one of: existing, new, individual".into());
    Err(err)
}

fn validate_idempotency_key(value: &str) -> Result<(), ValidationError> {
    if Uuid::parse_str(value).is_ok() {
        return Ok(());
    }
    let mut err = ValidationError::new("idempotency_key");
    err.message = Some("idempotencyKey must be a UUID".into());
    Err(err)
}
