//! Which campaign holds which contact list.
//!
//! The link lives only on `Campaign.contactListId`; lists carry no back
//! reference. A list is "assigned" exactly when some stored campaign points at
//! it, so every query here is a scan of the campaign collection. A list id
//! is never checked for liveness when bound; only the binding policy applies.

use tracing::{info, instrument, warn};

use dealdesk_shared::{
    Campaign, CampaignDraft, CampaignId, ContactList, ContactListId, DealDeskError,
    ListBindingPolicy, Result,
};
use dealdesk_storage::Store;

use crate::repository::{Entity, Repository, collection, unique_id};

/// Answer to "is this list taken?".
#[derive(Debug, Clone, PartialEq)]
pub struct ListAssignment {
    pub assigned: bool,
    /// First holder in campaign order.
    pub campaign: Option<Campaign>,
}

pub fn is_list_assigned(store: &Store, list_id: ContactListId) -> ListAssignment {
    let campaign = collection::<Campaign>(store)
        .into_iter()
        .find(|c| c.contact_list_id == Some(list_id));
    ListAssignment {
        assigned: campaign.is_some(),
        campaign,
    }
}

/// Every campaign referencing `list_id`, in campaign order.
pub fn campaigns_for_list(store: &Store, list_id: ContactListId) -> Vec<Campaign> {
    collection::<Campaign>(store)
        .into_iter()
        .filter(|c| c.contact_list_id == Some(list_id))
        .collect()
}

/// Make `claimant` the holder of `list_id` inside an in-flight campaign
/// mutation. Under `Reject` another holder is a conflict; under
/// `LastWriteWins` other holders are cleared.
fn claim_list(
    campaigns: &mut [Campaign],
    claimant: Option<CampaignId>,
    list_id: ContactListId,
    policy: ListBindingPolicy,
) -> Result<()> {
    let mut holders = campaigns
        .iter_mut()
        .filter(|c| Some(c.id) != claimant && c.contact_list_id == Some(list_id))
        .peekable();

    if holders.peek().is_none() {
        return Ok(());
    }

    match policy {
        ListBindingPolicy::Reject => {
            let holder = holders.next().map(|c| c.name.clone()).unwrap_or_default();
            Err(DealDeskError::conflict(format!(
                "list {list_id} is already assigned to campaign '{holder}'"
            )))
        }
        ListBindingPolicy::LastWriteWins => {
            for holder in holders {
                warn!(campaign = %holder.id, list = %list_id, "list reassigned away from campaign");
                holder.contact_list_id = None;
            }
            Ok(())
        }
    }
}

/// Create a campaign, applying `policy` to its list (if any).
#[instrument(skip_all)]
pub fn create_campaign(
    store: &mut Store,
    draft: CampaignDraft,
    policy: ListBindingPolicy,
) -> Result<Campaign> {
    if let Some(list_id) = draft.contact_list_id {
        note_unknown_list(store, list_id);
    }

    let campaign = store.mutate(Campaign::COLLECTION_KEY, Vec::<Campaign>::new(), |campaigns| {
        if let Some(list_id) = draft.contact_list_id {
            claim_list(campaigns, None, list_id, policy)?;
        }
        let campaign = Campaign::from_draft(unique_id(campaigns)?, draft)?;
        campaigns.push(campaign.clone());
        Ok(campaign)
    })?;

    info!(campaign = %campaign.id, name = %campaign.name, "campaign created");
    Ok(campaign)
}

/// Point a campaign at a list.
#[instrument(skip(store))]
pub fn assign_list(
    store: &mut Store,
    campaign_id: CampaignId,
    list_id: ContactListId,
    policy: ListBindingPolicy,
) -> Result<Campaign> {
    note_unknown_list(store, list_id);

    let campaign = store.mutate(Campaign::COLLECTION_KEY, Vec::<Campaign>::new(), |campaigns| {
        if !campaigns.iter().any(|c| c.id == campaign_id) {
            return Err(DealDeskError::not_found(Campaign::KIND, campaign_id));
        }
        claim_list(campaigns, Some(campaign_id), list_id, policy)?;
        let campaign = campaigns
            .iter_mut()
            .find(|c| c.id == campaign_id)
            .ok_or_else(|| DealDeskError::not_found(Campaign::KIND, campaign_id))?;
        campaign.contact_list_id = Some(list_id);
        Ok(campaign.clone())
    })?;

    info!("list assigned");
    Ok(campaign)
}

/// Clear a campaign's list reference.
#[instrument(skip(store))]
pub fn unassign_list(store: &mut Store, campaign_id: CampaignId) -> Result<Campaign> {
    Repository::<Campaign>::new(store).update_with(campaign_id, |campaign| {
        campaign.contact_list_id = None;
        Ok(campaign.clone())
    })
}

/// Delete a list. Campaigns still pointing at it keep a dangling reference.
#[instrument(skip(store))]
pub fn delete_list(store: &mut Store, list_id: ContactListId) -> Result<()> {
    let holders = campaigns_for_list(store, list_id);
    Repository::<ContactList>::new(store).delete(list_id)?;
    for campaign in holders {
        warn!(campaign = %campaign.id, name = %campaign.name, "campaign now references a deleted list");
    }
    Ok(())
}

/// Delete a campaign, which releases its list.
#[instrument(skip(store))]
pub fn delete_campaign(store: &mut Store, campaign_id: CampaignId) -> Result<()> {
    Repository::<Campaign>::new(store).delete(campaign_id)
}

fn note_unknown_list(store: &Store, list_id: ContactListId) {
    if !collection::<ContactList>(store).iter().any(|l| l.id == list_id) {
        warn!(list = %list_id, "binding a list id that is not stored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealdesk_shared::ContactListDraft;

    fn list(store: &mut Store, name: &str) -> ContactList {
        Repository::<ContactList>::new(store)
            .create(ContactListDraft {
                name: Some(name.into()),
                ..ContactListDraft::default()
            })
            .expect("create list")
    }

    fn campaign(store: &mut Store, name: &str, list_id: Option<ContactListId>) -> Result<Campaign> {
        create_campaign(
            store,
            CampaignDraft {
                name: Some(name.into()),
                contact_list_id: list_id,
                ..CampaignDraft::default()
            },
            ListBindingPolicy::Reject,
        )
    }

    #[test]
    fn assigned_iff_some_campaign_references_list() {
        let mut store = Store::in_memory();
        let l = list(&mut store, "Q3");
        assert!(!is_list_assigned(&store, l.id).assigned);

        let c = campaign(&mut store, "Launch", Some(l.id)).expect("campaign");
        let assignment = is_list_assigned(&store, l.id);
        assert!(assignment.assigned);
        assert_eq!(assignment.campaign.map(|c| c.id), Some(c.id));

        delete_campaign(&mut store, c.id).expect("delete campaign");
        assert!(!is_list_assigned(&store, l.id).assigned);
    }

    #[test]
    fn reject_policy_refuses_second_holder() {
        let mut store = Store::in_memory();
        let l = list(&mut store, "Q3");
        campaign(&mut store, "First", Some(l.id)).unwrap();

        let err = campaign(&mut store, "Second", Some(l.id)).unwrap_err();
        assert!(matches!(err, DealDeskError::Conflict { .. }));
        assert_eq!(collection::<Campaign>(&store).len(), 1);

        let other = campaign(&mut store, "Other", None).unwrap();
        let err = assign_list(&mut store, other.id, l.id, ListBindingPolicy::Reject).unwrap_err();
        assert!(matches!(err, DealDeskError::Conflict { .. }));
        assert_eq!(campaigns_for_list(&store, l.id).len(), 1);
    }

    #[test]
    fn reassigning_to_current_holder_is_allowed() {
        let mut store = Store::in_memory();
        let l = list(&mut store, "Q3");
        let c = campaign(&mut store, "First", Some(l.id)).unwrap();
        let again = assign_list(&mut store, c.id, l.id, ListBindingPolicy::Reject).unwrap();
        assert_eq!(again.contact_list_id, Some(l.id));
    }

    #[test]
    fn last_write_wins_moves_the_list() {
        let mut store = Store::in_memory();
        let l = list(&mut store, "Q3");
        let first = campaign(&mut store, "First", Some(l.id)).unwrap();
        let second = campaign(&mut store, "Second", None).unwrap();

        assign_list(&mut store, second.id, l.id, ListBindingPolicy::LastWriteWins).unwrap();

        let holders = campaigns_for_list(&store, l.id);
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].id, second.id);
        let first = Repository::<Campaign>::new(&mut store).get(first.id).unwrap();
        assert_eq!(first.contact_list_id, None);
    }

    #[test]
    fn unassign_releases_list() {
        let mut store = Store::in_memory();
        let l = list(&mut store, "Q3");
        let c = campaign(&mut store, "First", Some(l.id)).unwrap();
        let c = unassign_list(&mut store, c.id).unwrap();
        assert_eq!(c.contact_list_id, None);
        assert!(!is_list_assigned(&store, l.id).assigned);
    }

    #[test]
    fn delete_list_orphans_references() {
        let mut store = Store::in_memory();
        let l = list(&mut store, "Q3");
        let c = campaign(&mut store, "First", Some(l.id)).unwrap();

        delete_list(&mut store, l.id).expect("delete succeeds while assigned");
        assert!(collection::<ContactList>(&store).is_empty());

        let stored = Repository::<Campaign>::new(&mut store).get(c.id).unwrap();
        assert_eq!(stored.contact_list_id, Some(l.id));
        assert!(is_list_assigned(&store, l.id).assigned);
    }

    #[test]
    fn unknown_list_ids_bind_without_liveness_check() {
        let mut store = Store::in_memory();
        let ghost = ContactListId::new();
        let c = campaign(&mut store, "Ghost", Some(ghost)).expect("weak reference accepted");
        assert_eq!(c.contact_list_id, Some(ghost));
        assert!(is_list_assigned(&store, ghost).assigned);

        let other = ContactListId::new();
        let moved = assign_list(&mut store, c.id, other, ListBindingPolicy::Reject).expect("assign");
        assert_eq!(moved.contact_list_id, Some(other));
        assert!(!is_list_assigned(&store, ghost).assigned);

        let err = campaign(&mut store, "Rival", Some(other)).unwrap_err();
        assert!(matches!(err, DealDeskError::Conflict { .. }));
    }

    #[test]
    fn unknown_campaign_is_not_found() {
        let mut store = Store::in_memory();
        let l = list(&mut store, "Q3");
        assert!(assign_list(&mut store, CampaignId::new(), l.id, ListBindingPolicy::Reject)
            .unwrap_err()
            .is_not_found());
    }
}
