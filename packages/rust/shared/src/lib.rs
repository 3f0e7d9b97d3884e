//! Shared types, error model, and configuration for DealDesk.
//!
//! This crate is the foundation depended on by all other DealDesk crates.
//! It provides:
//! - [`DealDeskError`], the unified error type
//! - Domain types ([`Contact`], [`Company`], [`ContactList`], [`Campaign`] and their ids)
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CampaignsConfig, DATABASE_FILE_NAME, ListBindingPolicy, PipelineConfig, StoreBackendKind, StoreConfig,
    TransitionPolicy, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{DealDeskError, Result};
pub use types::{
    CURRENT_SCHEMA_VERSION, Campaign, CampaignDraft, CampaignId, CampaignPatch, CampaignStatus,
    Company, CompanyDraft, CompanyId, CompanyPatch, Contact, ContactDraft, ContactId, ContactList,
    ContactListDraft, ContactListId, ContactListPatch, ContactPatch, ContactStatus, Opportunity,
    OpportunityDraft, OpportunityId,
};
