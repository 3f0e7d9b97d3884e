//! Typed entity collections over the key-value store.
//!
//! Each entity kind lives as one ordered array under its own slot. A
//! [`Repository`] borrows the session's [`Store`] and performs every mutation
//! as a single read-modify-write of that slot, so the in-memory view and the
//! stored value never diverge for one collection.

use std::marker::PhantomData;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use dealdesk_shared::{
    Campaign, CampaignDraft, CampaignId, CampaignPatch, CampaignStatus, Company, CompanyDraft,
    CompanyId, CompanyPatch, Contact, ContactDraft, ContactId, ContactList, ContactListDraft,
    ContactListId, ContactListPatch, ContactPatch, ContactStatus, DealDeskError, Opportunity,
    OpportunityDraft, OpportunityId, Result,
};
use dealdesk_storage::Store;

/// How many fresh ids to try before giving up on a collision.
const MAX_ID_ATTEMPTS: usize = 3;

// ---------------------------------------------------------------------------
// Entity trait
// ---------------------------------------------------------------------------

/// A record kind stored as one collection slot.
pub trait Entity: Clone + Serialize + DeserializeOwned {
    type Id: Copy + Eq + std::fmt::Display;
    type Draft;
    type Patch;

    /// Singular name used in errors and logs.
    const KIND: &'static str;
    /// Slot key holding the collection.
    const COLLECTION_KEY: &'static str;

    fn id(&self) -> Self::Id;

    fn new_id() -> Self::Id;

    /// Validate a draft and build the record under `id`.
    fn from_draft(id: Self::Id, draft: Self::Draft) -> Result<Self>;

    /// Validate and apply a patch.
    fn apply_patch(&mut self, patch: Self::Patch) -> Result<()>;
}

/// Every record of a kind, in insertion order.
pub fn collection<T: Entity>(store: &Store) -> Vec<T> {
    store.read_or_default(T::COLLECTION_KEY)
}

/// One record by id.
pub fn find<T: Entity>(store: &Store, id: T::Id) -> Option<T> {
    collection::<T>(store).into_iter().find(|e| e.id() == id)
}

/// A fresh id not present in `items`.
pub(crate) fn unique_id<T: Entity>(items: &[T]) -> Result<T::Id> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = T::new_id();
        if !items.iter().any(|e| e.id() == id) {
            return Ok(id);
        }
        warn!(kind = T::KIND, %id, "generated id collided, regenerating");
    }
    Err(DealDeskError::conflict(format!(
        "could not allocate a unique {} id",
        T::KIND
    )))
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// CRUD over one entity collection.
pub struct Repository<'s, T: Entity> {
    store: &'s mut Store,
    _entity: PhantomData<T>,
}

impl<'s, T: Entity> Repository<'s, T> {
    pub fn new(store: &'s mut Store) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn list(&self) -> Vec<T> {
        collection(self.store)
    }

    pub fn get(&self, id: T::Id) -> Option<T> {
        find(self.store, id)
    }

    /// Create one record with a freshly assigned id.
    pub fn create(&mut self, draft: T::Draft) -> Result<T> {
        self.create_many(vec![draft])?
            .into_iter()
            .next()
            .ok_or_else(|| DealDeskError::Storage(format!("{} was not created", T::KIND)))
    }

    /// Create a batch in one write. If any draft is invalid nothing is stored.
    pub fn create_many(&mut self, drafts: Vec<T::Draft>) -> Result<Vec<T>> {
        let created = self
            .store
            .mutate(T::COLLECTION_KEY, Vec::<T>::new(), |items| {
                let mut created = Vec::with_capacity(drafts.len());
                for draft in drafts {
                    let entity = T::from_draft(unique_id(items)?, draft)?;
                    items.push(entity.clone());
                    created.push(entity);
                }
                Ok(created)
            })?;
        debug!(kind = T::KIND, count = created.len(), "created");
        Ok(created)
    }

    /// Apply a patch to the record with `id`.
    pub fn update(&mut self, id: T::Id, patch: T::Patch) -> Result<T> {
        self.update_with(id, |entity| {
            entity.apply_patch(patch)?;
            Ok(entity.clone())
        })
    }

    /// Run `f` against the record with `id` and store the result.
    ///
    /// A missing id is reported as `NotFound` and nothing is written.
    pub fn update_with<R>(&mut self, id: T::Id, f: impl FnOnce(&mut T) -> Result<R>) -> Result<R> {
        self.store
            .mutate(T::COLLECTION_KEY, Vec::<T>::new(), |items| {
                match items.iter_mut().find(|e| e.id() == id) {
                    Some(entity) => f(entity),
                    None => Err(DealDeskError::not_found(T::KIND, id)),
                }
            })
            .inspect_err(|e| {
                if e.is_not_found() {
                    warn!(kind = T::KIND, %id, "update skipped: no such record");
                }
            })
    }

    /// Remove the record with `id`. Nothing referencing it is touched.
    pub fn delete(&mut self, id: T::Id) -> Result<()> {
        self.store
            .mutate(T::COLLECTION_KEY, Vec::<T>::new(), |items| {
                let before = items.len();
                items.retain(|e| e.id() != id);
                if items.len() == before {
                    return Err(DealDeskError::not_found(T::KIND, id));
                }
                Ok(())
            })
            .inspect_err(|e| {
                if e.is_not_found() {
                    warn!(kind = T::KIND, %id, "delete skipped: no such record");
                }
            })?;
        debug!(kind = T::KIND, %id, "deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Company opportunities
// ---------------------------------------------------------------------------

impl Repository<'_, Company> {
    /// Append an opportunity to a company.
    pub fn add_opportunity(&mut self, company_id: CompanyId, draft: OpportunityDraft) -> Result<Opportunity> {
        let name = required(draft.name, "name")?;
        self.update_with(company_id, |company| {
            let mut id = OpportunityId::new();
            while company.opportunities.iter().any(|o| o.id == id) {
                id = OpportunityId::new();
            }
            let opportunity = Opportunity {
                id,
                name,
                stage: clean(draft.stage),
                value: draft.value,
            };
            company.opportunities.push(opportunity.clone());
            Ok(opportunity)
        })
    }

    /// Set an opportunity's free-text stage.
    pub fn set_opportunity_stage(
        &mut self,
        company_id: CompanyId,
        opportunity_id: OpportunityId,
        stage: &str,
    ) -> Result<Opportunity> {
        self.update_with(company_id, |company| {
            let opportunity = company
                .opportunities
                .iter_mut()
                .find(|o| o.id == opportunity_id)
                .ok_or_else(|| DealDeskError::not_found("opportunity", opportunity_id))?;
            opportunity.stage = clean(Some(stage.to_string()));
            Ok(opportunity.clone())
        })
    }

    pub fn remove_opportunity(&mut self, company_id: CompanyId, opportunity_id: OpportunityId) -> Result<()> {
        self.update_with(company_id, |company| {
            let before = company.opportunities.len();
            company.opportunities.retain(|o| o.id != opportunity_id);
            if company.opportunities.len() == before {
                return Err(DealDeskError::not_found("opportunity", opportunity_id));
            }
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// Contact list membership
// ---------------------------------------------------------------------------

impl Repository<'_, ContactList> {
    /// Add contacts to a list, skipping ids already present. Liveness of the
    /// ids is not checked. `totalContacts` is set to the new membership size.
    pub fn add_list_members(&mut self, list_id: ContactListId, ids: &[ContactId]) -> Result<ContactList> {
        self.update_with(list_id, |list| {
            for id in ids {
                if !list.contact_ids.contains(id) {
                    list.contact_ids.push(*id);
                }
            }
            list.total_contacts = list.contact_ids.len();
            Ok(list.clone())
        })
    }

    pub fn remove_list_members(&mut self, list_id: ContactListId, ids: &[ContactId]) -> Result<ContactList> {
        self.update_with(list_id, |list| {
            list.contact_ids.retain(|id| !ids.contains(id));
            list.total_contacts = list.contact_ids.len();
            Ok(list.clone())
        })
    }
}

// ---------------------------------------------------------------------------
// Entity impls
// ---------------------------------------------------------------------------

/// Trimmed value, or `None` when absent or blank.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trimmed non-blank value, or `ValidationMissing`.
pub(crate) fn required(value: Option<String>, field: &'static str) -> Result<String> {
    clean(value).ok_or_else(|| DealDeskError::missing(field))
}

/// Replace `slot` when the patch carries a value; blank clears it.
fn patch_text(slot: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        *slot = clean(Some(v));
    }
}

fn patch_required(slot: &mut String, value: Option<String>, field: &'static str) -> Result<()> {
    if value.is_some() {
        *slot = required(value, field)?;
    }
    Ok(())
}

impl Entity for Contact {
    type Id = ContactId;
    type Draft = ContactDraft;
    type Patch = ContactPatch;

    const KIND: &'static str = "contact";
    const COLLECTION_KEY: &'static str = "contacts";

    fn id(&self) -> ContactId {
        self.id
    }

    fn new_id() -> ContactId {
        ContactId::new()
    }

    fn from_draft(id: ContactId, draft: ContactDraft) -> Result<Self> {
        let email = required(draft.email, "email")?;
        let name = clean(draft.name);
        let first_name = clean(draft.first_name);
        let last_name = clean(draft.last_name);
        if name.is_none() && first_name.is_none() && last_name.is_none() {
            return Err(DealDeskError::missing("name"));
        }

        Ok(Self {
            id,
            name,
            first_name,
            last_name,
            email,
            phone: clean(draft.phone),
            company: clean(draft.company),
            title: clean(draft.title),
            status: draft.status.unwrap_or(ContactStatus::Cold),
            stage: clean(draft.stage),
            source: clean(draft.source),
            last_touch: draft.last_touch,
            next_touch: draft.next_touch,
            notes: clean(draft.notes),
            value: draft.value,
            deal_value: draft.deal_value,
            created_at: Utc::now(),
        })
    }

    fn apply_patch(&mut self, patch: ContactPatch) -> Result<()> {
        patch_required(&mut self.email, patch.email, "email")?;
        patch_text(&mut self.name, patch.name);
        patch_text(&mut self.first_name, patch.first_name);
        patch_text(&mut self.last_name, patch.last_name);
        if self.name.is_none() && self.first_name.is_none() && self.last_name.is_none() {
            return Err(DealDeskError::missing("name"));
        }
        patch_text(&mut self.phone, patch.phone);
        patch_text(&mut self.company, patch.company);
        patch_text(&mut self.title, patch.title);
        patch_text(&mut self.stage, patch.stage);
        patch_text(&mut self.source, patch.source);
        patch_text(&mut self.notes, patch.notes);
        if let Some(status) = patch.status {
            self.status = status;
        }
        if patch.last_touch.is_some() {
            self.last_touch = patch.last_touch;
        }
        if patch.next_touch.is_some() {
            self.next_touch = patch.next_touch;
        }
        if patch.value.is_some() {
            self.value = patch.value;
        }
        if patch.deal_value.is_some() {
            self.deal_value = patch.deal_value;
        }
        Ok(())
    }
}

impl Entity for Company {
    type Id = CompanyId;
    type Draft = CompanyDraft;
    type Patch = CompanyPatch;

    const KIND: &'static str = "company";
    const COLLECTION_KEY: &'static str = "companies";

    fn id(&self) -> CompanyId {
        self.id
    }

    fn new_id() -> CompanyId {
        CompanyId::new()
    }

    fn from_draft(id: CompanyId, draft: CompanyDraft) -> Result<Self> {
        Ok(Self {
            id,
            name: required(draft.name, "name")?,
            industry: clean(draft.industry),
            location: clean(draft.location),
            employees: clean(draft.employees),
            opportunities: Vec::new(),
            created_at: Utc::now(),
        })
    }

    fn apply_patch(&mut self, patch: CompanyPatch) -> Result<()> {
        patch_required(&mut self.name, patch.name, "name")?;
        patch_text(&mut self.industry, patch.industry);
        patch_text(&mut self.location, patch.location);
        patch_text(&mut self.employees, patch.employees);
        Ok(())
    }
}

impl Entity for ContactList {
    type Id = ContactListId;
    type Draft = ContactListDraft;
    type Patch = ContactListPatch;

    const KIND: &'static str = "contact list";
    const COLLECTION_KEY: &'static str = "contact-lists";

    fn id(&self) -> ContactListId {
        self.id
    }

    fn new_id() -> ContactListId {
        ContactListId::new()
    }

    fn from_draft(id: ContactListId, draft: ContactListDraft) -> Result<Self> {
        let mut contact_ids: Vec<ContactId> = Vec::with_capacity(draft.contact_ids.len());
        for cid in draft.contact_ids {
            if !contact_ids.contains(&cid) {
                contact_ids.push(cid);
            }
        }
        Ok(Self {
            id,
            name: required(draft.name, "name")?,
            description: clean(draft.description),
            list_type: clean(draft.list_type),
            total_contacts: contact_ids.len(),
            contact_ids,
            created_at: Utc::now(),
        })
    }

    fn apply_patch(&mut self, patch: ContactListPatch) -> Result<()> {
        patch_required(&mut self.name, patch.name, "name")?;
        patch_text(&mut self.description, patch.description);
        patch_text(&mut self.list_type, patch.list_type);
        Ok(())
    }
}

/// `Repository<Campaign>::create` stores `contactListId` as given without
/// applying a binding policy; [`crate::binding::create_campaign`] does.
impl Entity for Campaign {
    type Id = CampaignId;
    type Draft = CampaignDraft;
    type Patch = CampaignPatch;

    const KIND: &'static str = "campaign";
    const COLLECTION_KEY: &'static str = "campaigns";

    fn id(&self) -> CampaignId {
        self.id
    }

    fn new_id() -> CampaignId {
        CampaignId::new()
    }

    fn from_draft(id: CampaignId, draft: CampaignDraft) -> Result<Self> {
        Ok(Self {
            id,
            name: required(draft.name, "name")?,
            contact_list_id: draft.contact_list_id,
            status: draft.status.unwrap_or(CampaignStatus::Draft),
            created_at: Utc::now(),
        })
    }

    fn apply_patch(&mut self, patch: CampaignPatch) -> Result<()> {
        patch_required(&mut self.name, patch.name, "name")?;
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn contact_draft(name: &str, email: &str) -> ContactDraft {
        ContactDraft {
            name: Some(name.into()),
            email: Some(email.into()),
            ..ContactDraft::default()
        }
    }

    #[test]
    fn create_assigns_unique_ids_in_insertion_order() {
        let mut store = Store::in_memory();
        let mut contacts = Repository::<Contact>::new(&mut store);

        let a = contacts.create(contact_draft("A", "a@x.example")).expect("create a");
        let b = contacts.create(contact_draft("B", "b@x.example")).expect("create b");
        assert_ne!(a.id, b.id);

        let listed = contacts.list();
        assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![a.id, b.id]);
        assert_eq!(listed[0].status, ContactStatus::Cold);
    }

    #[test]
    fn duplicate_emails_are_tolerated() {
        let mut store = Store::in_memory();
        let mut contacts = Repository::<Contact>::new(&mut store);
        contacts.create(contact_draft("A", "same@x.example")).unwrap();
        contacts.create(contact_draft("A again", "same@x.example")).unwrap();
        assert_eq!(contacts.list().len(), 2);
    }

    #[test]
    fn contact_requires_email_and_name() {
        let mut store = Store::in_memory();
        let mut contacts = Repository::<Contact>::new(&mut store);

        let err = contacts
            .create(ContactDraft {
                name: Some("No Email".into()),
                email: Some("   ".into()),
                ..ContactDraft::default()
            })
            .unwrap_err();
        assert!(matches!(err, DealDeskError::ValidationMissing { field: "email" }));

        let err = contacts
            .create(ContactDraft {
                email: Some("n@x.example".into()),
                ..ContactDraft::default()
            })
            .unwrap_err();
        assert!(matches!(err, DealDeskError::ValidationMissing { field: "name" }));

        let ok = contacts
            .create(ContactDraft {
                first_name: Some("Only".into()),
                email: Some("only@x.example".into()),
                ..ContactDraft::default()
            })
            .expect("first name suffices");
        assert_eq!(ok.display_name(), "Only");
        assert_eq!(contacts.list().len(), 1);
    }

    #[test]
    fn create_many_is_all_or_nothing() {
        let mut store = Store::in_memory();
        let mut contacts = Repository::<Contact>::new(&mut store);

        let result = contacts.create_many(vec![
            contact_draft("Good", "g@x.example"),
            ContactDraft::default(),
        ]);
        assert!(result.is_err());
        assert!(contacts.list().is_empty());

        let created = contacts
            .create_many(vec![
                contact_draft("One", "1@x.example"),
                contact_draft("Two", "2@x.example"),
            ])
            .expect("batch");
        assert_eq!(created.len(), 2);
        assert_eq!(contacts.list().len(), 2);
    }

    #[test]
    fn update_applies_patch() {
        let mut store = Store::in_memory();
        let mut contacts = Repository::<Contact>::new(&mut store);
        let c = contacts.create(contact_draft("A", "a@x.example")).unwrap();

        let updated = contacts
            .update(
                c.id,
                ContactPatch {
                    stage: Some("Proposal".into()),
                    status: Some(ContactStatus::Warm),
                    phone: Some("".into()),
                    ..ContactPatch::default()
                },
            )
            .expect("update");
        assert_eq!(updated.stage.as_deref(), Some("Proposal"));
        assert_eq!(updated.status, ContactStatus::Warm);
        assert!(updated.phone.is_none());
        assert_eq!(contacts.get(c.id), Some(updated));
    }

    #[test]
    fn invalid_patch_leaves_record_unchanged() {
        let mut store = Store::in_memory();
        let mut contacts = Repository::<Contact>::new(&mut store);
        let c = contacts.create(contact_draft("A", "a@x.example")).unwrap();

        let err = contacts
            .update(
                c.id,
                ContactPatch {
                    email: Some(" ".into()),
                    title: Some("Partner".into()),
                    ..ContactPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DealDeskError::ValidationMissing { field: "email" }));
        assert_eq!(contacts.get(c.id), Some(c));
    }

    #[test]
    fn update_and_delete_missing_report_not_found() {
        let mut store = Store::in_memory();
        let mut contacts = Repository::<Contact>::new(&mut store);
        contacts.create(contact_draft("A", "a@x.example")).unwrap();

        let ghost = ContactId::new();
        assert!(contacts.update(ghost, ContactPatch::default()).unwrap_err().is_not_found());
        assert!(contacts.delete(ghost).unwrap_err().is_not_found());
        assert_eq!(contacts.list().len(), 1);
    }

    #[test]
    fn delete_removes_only_target() {
        let mut store = Store::in_memory();
        let mut contacts = Repository::<Contact>::new(&mut store);
        let a = contacts.create(contact_draft("A", "a@x.example")).unwrap();
        let b = contacts.create(contact_draft("B", "b@x.example")).unwrap();

        contacts.delete(a.id).expect("delete");
        assert_eq!(contacts.list(), vec![b]);
        assert!(contacts.get(a.id).is_none());
    }

    #[test]
    fn each_kind_uses_its_own_slot() {
        let mut store = Store::in_memory();
        Repository::<Contact>::new(&mut store)
            .create(contact_draft("A", "a@x.example"))
            .unwrap();
        Repository::<Company>::new(&mut store)
            .create(CompanyDraft {
                name: Some("Acme".into()),
                ..CompanyDraft::default()
            })
            .unwrap();

        let mut keys = store.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["companies".to_string(), "contacts".to_string()]);
    }

    #[test]
    fn company_opportunities() {
        let mut store = Store::in_memory();
        let mut companies = Repository::<Company>::new(&mut store);
        let acme = companies
            .create(CompanyDraft {
                name: Some("Acme".into()),
                ..CompanyDraft::default()
            })
            .unwrap();

        let opp = companies
            .add_opportunity(
                acme.id,
                OpportunityDraft {
                    name: Some("Fund III".into()),
                    stage: Some("Prospecting".into()),
                    value: Some(5_000_000.0),
                },
            )
            .expect("add opportunity");
        let moved = companies
            .set_opportunity_stage(acme.id, opp.id, "Proposal")
            .expect("set stage");
        assert_eq!(moved.stage.as_deref(), Some("Proposal"));

        companies.remove_opportunity(acme.id, opp.id).expect("remove");
        assert!(companies.get(acme.id).unwrap().opportunities.is_empty());
        assert!(companies
            .remove_opportunity(acme.id, opp.id)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn list_draft_deduplicates_and_counts() {
        let mut store = Store::in_memory();
        let (c1, c2) = (ContactId::new(), ContactId::new());
        let mut lists = Repository::<ContactList>::new(&mut store);
        let list = lists
            .create(ContactListDraft {
                name: Some("Q3 LPs".into()),
                contact_ids: vec![c1, c2, c1],
                ..ContactListDraft::default()
            })
            .unwrap();
        assert_eq!(list.contact_ids, vec![c1, c2]);
        assert_eq!(list.total_contacts, 2);

        let c3 = ContactId::new();
        let grown = lists.add_list_members(list.id, &[c2, c3]).unwrap();
        assert_eq!(grown.contact_ids, vec![c1, c2, c3]);
        assert_eq!(grown.total_contacts, 3);

        let shrunk = lists.remove_list_members(list.id, &[c1]).unwrap();
        assert_eq!(shrunk.contact_ids, vec![c2, c3]);
        assert_eq!(shrunk.total_contacts, 2);
    }

    #[test]
    fn stored_collection_is_camel_case_json() {
        let mut store = Store::in_memory();
        Repository::<ContactList>::new(&mut store)
            .create(ContactListDraft {
                name: Some("Seed".into()),
                list_type: Some("static".into()),
                ..ContactListDraft::default()
            })
            .unwrap();
        let raw: Vec<serde_json::Value> = store.read_or_default("contact-lists");
        assert_eq!(raw[0]["type"], "static");
        assert_eq!(raw[0]["totalContacts"], 0);
        assert!(raw[0].get("createdAt").is_some());
    }

    fn seeded_store(key: &str, contents: &str) -> Store {
        let backend = dealdesk_storage::MemoryBackend::new().with_slot(format!("dealdesk.{key}"), contents);
        Store::new(Box::new(backend), "dealdesk").expect("valid namespace")
    }

    #[test]
    fn legacy_numeric_ids_survive_a_create() {
        let mut store = seeded_store(
            "contacts",
            r#"[
                {"id": 1700000000000, "name": "Amara", "email": "amara@x.example", "status": "warm"},
                {"id": 1700000000001, "name": "Jonas", "email": "jonas@x.example"}
            ]"#,
        );
        let mut contacts = Repository::<Contact>::new(&mut store);
        assert_eq!(contacts.list().len(), 2);

        contacts.create(contact_draft("New", "new@x.example")).expect("create");
        let listed = contacts.list();
        let names: Vec<_> = listed.iter().map(Contact::display_name).collect();
        assert_eq!(names, vec!["Amara", "Jonas", "New"]);
        assert_eq!(listed[0].status, ContactStatus::Warm);
    }

    #[test]
    fn undecodable_row_blocks_writes_instead_of_dropping_rows() {
        let raw = r#"{"schemaVersion":1,"data":[
            {"id":"01890a5d-ac96-774b-bcce-b302099a8057","name":"A","email":"a@x.example"},
            {"id":"01890a5d-ac96-774b-bcce-b302099a8058","name":"B","email":"b@x.example","lastTouch":"last tuesday"}
        ]}"#;
        let mut store = seeded_store("contacts", raw);

        let err = Repository::<Contact>::new(&mut store)
            .create(contact_draft("C", "c@x.example"))
            .unwrap_err();
        assert!(matches!(err, DealDeskError::Storage(_)));

        let stored: Vec<serde_json::Value> = store.read_or_default("contacts");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1]["lastTouch"], "last tuesday");
    }
}

