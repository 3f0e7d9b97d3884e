//! A working session: one store plus the policies from config.

use tracing::{debug, info, instrument};

use dealdesk_shared::{
    AppConfig, Campaign, CampaignDraft, CampaignId, Company, Contact, ContactId, ContactList,
    ContactListId, ListBindingPolicy, Result, StoreBackendKind, TransitionPolicy,
};
use dealdesk_storage::Store;

use crate::binding::{self, ListAssignment};
use crate::pipeline::{self, AdvanceOutcome};
use crate::repository::Repository;
use crate::stage::PipelineStage;

/// Behavioral switches read from config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policies {
    pub transitions: TransitionPolicy,
    pub list_binding: ListBindingPolicy,
}

impl From<&AppConfig> for Policies {
    fn from(config: &AppConfig) -> Self {
        Self {
            transitions: config.pipeline.transitions,
            list_binding: config.campaigns.list_binding,
        }
    }
}

/// Owns the store for the lifetime of one command or UI session.
#[derive(Debug)]
pub struct Session {
    store: Store,
    policies: Policies,
}

impl Session {
    /// Build the store described by `config`.
    #[instrument(skip_all, fields(backend = ?config.store.backend))]
    pub fn open(config: &AppConfig) -> Result<Self> {
        let store = match config.store.backend {
            StoreBackendKind::Memory => Store::new(
                Box::new(dealdesk_storage::MemoryBackend::new()),
                config.store.namespace.clone(),
            )?,
            StoreBackendKind::File => {
                let path = config.store.database_path()?;
                Store::open_database(&path, config.store.namespace.clone())?
            }
        };
        info!(backend = store.backend_name(), namespace = store.namespace(), "session opened");
        Ok(Self::with_store(store, Policies::from(config)))
    }

    /// Memory-backed session with default policies.
    pub fn in_memory() -> Self {
        Self::with_store(Store::in_memory(), Policies::default())
    }

    pub fn with_store(store: Store, policies: Policies) -> Self {
        Self { store, policies }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn policies(&self) -> Policies {
        self.policies
    }

    // -----------------------------------------------------------------------
    // Repositories
    // -----------------------------------------------------------------------

    pub fn contacts(&mut self) -> Repository<'_, Contact> {
        Repository::new(&mut self.store)
    }

    pub fn companies(&mut self) -> Repository<'_, Company> {
        Repository::new(&mut self.store)
    }

    pub fn lists(&mut self) -> Repository<'_, ContactList> {
        Repository::new(&mut self.store)
    }

    pub fn campaigns(&mut self) -> Repository<'_, Campaign> {
        Repository::new(&mut self.store)
    }

    // -----------------------------------------------------------------------
    // Policy-aware operations
    // -----------------------------------------------------------------------

    pub fn create_campaign(&mut self, draft: CampaignDraft) -> Result<Campaign> {
        binding::create_campaign(&mut self.store, draft, self.policies.list_binding)
    }

    pub fn assign_list(&mut self, campaign_id: CampaignId, list_id: ContactListId) -> Result<Campaign> {
        binding::assign_list(&mut self.store, campaign_id, list_id, self.policies.list_binding)
    }

    pub fn unassign_list(&mut self, campaign_id: CampaignId) -> Result<Campaign> {
        binding::unassign_list(&mut self.store, campaign_id)
    }

    pub fn is_list_assigned(&self, list_id: ContactListId) -> ListAssignment {
        binding::is_list_assigned(&self.store, list_id)
    }

    pub fn delete_list(&mut self, list_id: ContactListId) -> Result<()> {
        binding::delete_list(&mut self.store, list_id)
    }

    pub fn delete_campaign(&mut self, campaign_id: CampaignId) -> Result<()> {
        binding::delete_campaign(&mut self.store, campaign_id)
    }

    pub fn advance(&mut self, id: ContactId) -> Result<AdvanceOutcome> {
        pipeline::advance_contact(&mut self.store, id)
    }

    pub fn move_contact(&mut self, id: ContactId, target: PipelineStage) -> Result<Contact> {
        pipeline::move_contact(&mut self.store, id, target, self.policies.transitions)
    }

    /// End the session. Observers are dropped; stored data is untouched.
    pub fn close(mut self) {
        self.store.clear_subscribers();
        debug!(namespace = self.store.namespace(), "session closed");
    }
}
