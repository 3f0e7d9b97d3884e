//! Resolution of weak, id- and name-based references.
//!
//! References are never validated when written, so every lookup here
//! tolerates dangling targets: missing records are filtered out or reported,
//! never treated as errors.

use tracing::debug;

use dealdesk_shared::{
    Campaign, Company, Contact, ContactId, ContactList, ContactListId, DealDeskError, Result,
};
use dealdesk_storage::Store;

use crate::repository::{Entity, collection, find};

/// A list with its live members.
#[derive(Debug, Clone, PartialEq)]
pub struct ListMembers {
    pub list: ContactList,
    /// Live contacts, in list order.
    pub members: Vec<Contact>,
    /// Ids on the list with no stored contact.
    pub missing: Vec<ContactId>,
}

impl ListMembers {
    /// Count of members that still exist.
    pub fn live_total(&self) -> usize {
        self.members.len()
    }

    /// Whether the recorded `totalContacts` disagrees with the live count.
    pub fn is_stale(&self) -> bool {
        self.list.total_contacts != self.live_total()
    }
}

/// Resolve a list's `contactIds` against the contact collection.
///
/// Only a missing list is an error; missing contacts are reported in
/// [`ListMembers::missing`].
pub fn resolve_list_members(store: &Store, list_id: ContactListId) -> Result<ListMembers> {
    let list = find::<ContactList>(store, list_id)
        .ok_or_else(|| DealDeskError::not_found(ContactList::KIND, list_id))?;
    let contacts = collection::<Contact>(store);

    let mut members = Vec::with_capacity(list.contact_ids.len());
    let mut missing = Vec::new();
    for id in &list.contact_ids {
        match contacts.iter().find(|c| c.id == *id) {
            Some(contact) => members.push(contact.clone()),
            None => missing.push(*id),
        }
    }

    if !missing.is_empty() {
        debug!(list = %list_id, missing = missing.len(), "list references deleted contacts");
    }

    Ok(ListMembers {
        list,
        members,
        missing,
    })
}

/// The list a campaign points at, if it still exists.
pub fn resolve_campaign_list(store: &Store, campaign: &Campaign) -> Option<ContactList> {
    campaign
        .contact_list_id
        .and_then(|id| find::<ContactList>(store, id))
}

/// Contacts whose company text matches `name`, ignoring case and
/// surrounding whitespace.
pub fn contacts_at_company(store: &Store, name: &str) -> Vec<Contact> {
    let wanted = name.trim().to_lowercase();
    collection::<Contact>(store)
        .into_iter()
        .filter(|c| {
            c.company
                .as_deref()
                .is_some_and(|company| company.trim().to_lowercase() == wanted)
        })
        .collect()
}

/// First company whose name matches the contact's company text.
pub fn company_for_contact(store: &Store, contact: &Contact) -> Option<Company> {
    let wanted = contact.company.as_deref()?.trim().to_lowercase();
    collection::<Company>(store)
        .into_iter()
        .find(|company| company.name.trim().to_lowercase() == wanted)
}

/// Lists whose membership includes `contact_id`.
pub fn lists_containing(store: &Store, contact_id: ContactId) -> Vec<ContactList> {
    collection::<ContactList>(store)
        .into_iter()
        .filter(|l| l.contact_ids.contains(&contact_id))
        .collect()
}
