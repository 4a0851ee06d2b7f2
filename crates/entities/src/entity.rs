use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use onboardly_core::{EntityId, TenantId, UserId};

use crate::wizard::SetupWizardInput;

/// Kind of onboarded entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Company,
    Individual,
}

/// A trade license attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub country: String,
    pub authority: String,
    pub license_number: String,
    pub economic_zone_id: Option<String>,
}

/// A registration reference (e.g. tax registration number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// Entity creation payload (id/timestamp assigned by storage).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntity {
    pub tenant_id: TenantId,
    pub name: String,
    pub country: String,
    pub legal_form: Option<String>,
    pub entity_type: EntityType,
    pub licenses: Vec<License>,
    pub registrations: Vec<Registration>,
    pub created_by: UserId,
}

impl NewEntity {
    /// Build the creation payload from a validated wizard submission.
    pub fn from_wizard(tenant_id: TenantId, created_by: UserId, input: &SetupWizardInput) -> Self {
        let licenses = input
            .license_number
            .as_ref()
            .map(|number| {
                vec![License {
                    country: input.country.clone(),
                    // TODO: resolve the issuing authority per country once the
                    // authority registry lands; "DED" covers the launch market.
                    authority: "DED".to_string(),
                    license_number: number.clone(),
                    economic_zone_id: input.economic_zone_id.clone(),
                }]
            })
            .unwrap_or_default();

        let registrations = input
            .registrations
            .iter()
            .map(|r| Registration {
                kind: r.kind.clone(),
                value: r.value.clone(),
            })
            .collect();

        Self {
            tenant_id,
            name: input.business_name.clone(),
            country: input.country.clone(),
            legal_form: input.legal_form.clone(),
            entity_type: input.entity_type(),
            licenses,
            registrations,
            created_by,
        }
    }
}

/// A persisted onboarded entity. Created exactly once per successful setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub tenant_id: TenantId,
    pub name: String,
    pub country: String,
    pub legal_form: Option<String>,
    pub entity_type: EntityType,
    pub licenses: Vec<License>,
    pub registrations: Vec<Registration>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Entity {
    /// Materialize a new entity record with an assigned id and timestamp.
    pub fn create(new: NewEntity, now: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::new(),
            tenant_id: new.tenant_id,
            name: new.name,
            country: new.country,
            legal_form: new.legal_form,
            entity_type: new.entity_type,
            licenses: new.licenses,
            registrations: new.registrations,
            created_by: new.created_by,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::RegistrationInput;
    use uuid::Uuid;

    fn wizard_input(license_number: Option<&str>) -> SetupWizardInput {
        SetupWizardInput {
            country: "AE".to_string(),
            tab: "existing".to_string(),
            business_name: "Acme Trading LLC".to_string(),
            legal_form: Some("LLC".to_string()),
            license_number: license_number.map(str::to_string),
            economic_zone_id: Some("dmcc".to_string()),
            registrations: vec![RegistrationInput {
                kind: "TRN".to_string(),
                value: "100000000000003".to_string(),
            }],
            consent_version: "2024-11".to_string(),
            idempotency_key: Uuid::now_v7().to_string(),
        }
    }

    #[test]
    fn license_number_yields_a_license_entry() {
        let new = NewEntity::from_wizard(TenantId::new(), UserId::new(), &wizard_input(Some("CN-42")));
        assert_eq!(new.licenses.len(), 1);
        assert_eq!(new.licenses[0].license_number, "CN-42");
        assert_eq!(new.licenses[0].country, "AE");
        assert_eq!(new.licenses[0].economic_zone_id.as_deref(), Some("dmcc"));
    }

    #[test]
    fn no_license_number_yields_no_license() {
        let new = NewEntity::from_wizard(TenantId::new(), UserId::new(), &wizard_input(None));
        assert!(new.licenses.is_empty());
        assert_eq!(new.registrations.len(), 1);
    }
}
