//! Core domain types for DealDesk collections.
//!
//! Persisted JSON uses camelCase field names. Relationships between entities
//! are weak: a [`ContactList`] holds [`ContactId`]s, a [`Campaign`] holds an
//! optional [`ContactListId`], and a [`Contact`] names its company as text.
//! None of these are checked for liveness when written.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for stored collection blobs.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new time-sortable identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

entity_id!(
    /// Stable contact identifier (UUID v7), never reused.
    ContactId
);
entity_id!(
    /// Company identifier.
    CompanyId
);
entity_id!(
    /// Opportunity identifier, unique within the owning company.
    OpportunityId
);
entity_id!(
    /// Contact list identifier.
    ContactListId
);
entity_id!(
    /// Campaign identifier.
    CampaignId
);

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

/// Relationship temperature shown on the contact card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactStatus {
    #[default]
    #[serde(alias = "cold")]
    Cold,
    #[serde(alias = "warm")]
    Warm,
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "signed")]
    Signed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cold => "Cold",
            Self::Warm => "Warm",
            Self::Active => "Active",
            Self::Signed => "Signed",
        }
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cold" => Ok(Self::Cold),
            "warm" => Ok(Self::Warm),
            "active" => Ok(Self::Active),
            "signed" => Ok(Self::Signed),
            other => Err(format!("unknown contact status '{other}'")),
        }
    }
}

/// A person in the relationship pipeline.
///
/// `stage` is free text and is never stored in canonical form; readers
/// normalize it every time they need a pipeline position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Natural dedup key, not enforced unique.
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Company name (weak reference by name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_touch: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_touch: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_value: Option<f64>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Contact {
    /// `name` when present, otherwise first and last name joined, otherwise the email.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            self.email.clone()
        } else {
            joined
        }
    }

    /// Monetary weight in the pipeline: `value`, then `dealValue`, then zero.
    pub fn pipeline_value(&self) -> f64 {
        self.value.or(self.deal_value).unwrap_or(0.0)
    }
}

/// Input for creating a contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactDraft {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub status: Option<ContactStatus>,
    pub stage: Option<String>,
    pub source: Option<String>,
    pub last_touch: Option<NaiveDate>,
    pub next_touch: Option<NaiveDate>,
    pub notes: Option<String>,
    pub value: Option<f64>,
    pub deal_value: Option<f64>,
}

/// Field-wise update for a contact; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub status: Option<ContactStatus>,
    pub stage: Option<String>,
    pub source: Option<String>,
    pub last_touch: Option<NaiveDate>,
    pub next_touch: Option<NaiveDate>,
    pub notes: Option<String>,
    pub value: Option<f64>,
    pub deal_value: Option<f64>,
}

// ---------------------------------------------------------------------------
// Company
// ---------------------------------------------------------------------------

/// A deal owned by a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: OpportunityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// An organization. Contacts link to it by name only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Head-count as entered (e.g. `"50-200"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<String>,
    #[serde(default)]
    pub opportunities: Vec<Opportunity>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyDraft {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub employees: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub employees: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpportunityDraft {
    pub name: Option<String>,
    pub stage: Option<String>,
    pub value: Option<f64>,
}

// ---------------------------------------------------------------------------
// ContactList
// ---------------------------------------------------------------------------

/// A named set of contact ids.
///
/// `contact_ids` may name contacts that were deleted since. `total_contacts`
/// is recorded metadata, not a live count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactList {
    pub id: ContactListId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub list_type: Option<String>,
    #[serde(default)]
    pub contact_ids: Vec<ContactId>,
    #[serde(default)]
    pub total_contacts: usize,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactListDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub list_type: Option<String>,
    pub contact_ids: Vec<ContactId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactListPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub list_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Scheduled,
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown campaign status '{other}'")),
        }
    }
}

/// An outreach campaign, optionally bound to one contact list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_list_id: Option<ContactListId>,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignDraft {
    pub name: Option<String>,
    pub contact_list_id: Option<ContactListId>,
    pub status: Option<CampaignStatus>,
}

/// Campaign update. The list binding is changed through the binding
/// operations only, so it is not part of the patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignPatch {
    pub name: Option<String>,
    pub status: Option<CampaignStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> Contact {
        Contact {
            id: ContactId::new(),
            name: None,
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: "ada@example.com".into(),
            phone: None,
            company: Some("Analytical Engines".into()),
            title: Some("Managing Partner".into()),
            status: ContactStatus::Warm,
            stage: Some("Proposal".into()),
            source: None,
            last_touch: None,
            next_touch: None,
            notes: None,
            value: None,
            deal_value: Some(1500.0),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn id_roundtrip() {
        let id = ContactId::new();
        let parsed: ContactId = id.to_string().parse().expect("parse ContactId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn contact_serializes_camel_case() {
        let c = contact();
        let json = serde_json::to_value(&c).expect("serialize");
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["dealValue"], 1500.0);
        assert_eq!(json["status"], "Warm");
        assert!(json.get("name").is_none());
    }

    #[test]
    fn display_name_falls_back() {
        let mut c = contact();
        assert_eq!(c.display_name(), "Ada Lovelace");

        c.name = Some("  Countess  ".into());
        assert_eq!(c.display_name(), "Countess");

        c.name = None;
        c.first_name = None;
        c.last_name = None;
        assert_eq!(c.display_name(), "ada@example.com");
    }

    #[test]
    fn pipeline_value_prefers_value() {
        let mut c = contact();
        assert_eq!(c.pipeline_value(), 1500.0);
        c.value = Some(10.0);
        assert_eq!(c.pipeline_value(), 10.0);
        c.value = None;
        c.deal_value = None;
        assert_eq!(c.pipeline_value(), 0.0);
    }

    #[test]
    fn legacy_contact_without_optional_fields_parses() {
        let json = r#"{"id":"01890a5d-ac96-774b-bcce-b302099a8057","name":"Grace","email":"g@navy.mil"}"#;
        let c: Contact = serde_json::from_str(json).expect("deserialize");
        assert_eq!(c.status, ContactStatus::Cold);
        assert!(c.stage.is_none());
    }

    #[test]
    fn contact_list_type_field_is_renamed() {
        let json = r#"{"id":"01890a5d-ac96-774b-bcce-b302099a8057","name":"Q3","type":"static","contactIds":[],"totalContacts":0}"#;
        let list: ContactList = serde_json::from_str(json).expect("deserialize");
        assert_eq!(list.list_type.as_deref(), Some("static"));
    }

    #[test]
    fn statuses_parse_case_insensitively() {
        assert_eq!("warm".parse::<ContactStatus>(), Ok(ContactStatus::Warm));
        assert_eq!(" ACTIVE ".parse::<CampaignStatus>(), Ok(CampaignStatus::Active));
        assert!("lukewarm".parse::<ContactStatus>().is_err());
    }

    #[test]
    fn stored_lowercase_status_decodes() {
        let json = r#"{"id":"01890a5d-ac96-774b-bcce-b302099a8057","name":"Ada","email":"ada@example.com","status":"warm"}"#;
        let contact: Contact = serde_json::from_str(json).expect("deserialize");
        assert_eq!(contact.status, ContactStatus::Warm);
        assert_eq!(serde_json::to_value(contact.status).unwrap(), "Warm");
    }
}
