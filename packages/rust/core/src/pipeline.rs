//! Stage boards and stage transitions.
//!
//! Boards are recomputed from the stored collections on every call; nothing
//! here is cached.

use tracing::{debug, info, instrument};

use dealdesk_shared::{
    Company, CompanyId, Contact, ContactId, ContactPatch, DealDeskError, Opportunity, Result,
    TransitionPolicy,
};
use dealdesk_storage::Store;

use crate::persona::{Persona, classify_persona};
use crate::repository::{Repository, find};
use crate::stage::{PipelineStage, normalize_stage};

// ---------------------------------------------------------------------------
// Board items
// ---------------------------------------------------------------------------

/// Anything that can be placed on a stage board.
pub trait PipelineItem {
    /// Free-text stage as stored.
    fn stage_label(&self) -> Option<&str>;
    /// Contribution to a bucket's `total_value`.
    fn pipeline_value(&self) -> f64;
}

/// A contact paired with its persona.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaContact {
    pub contact: Contact,
    pub persona: Persona,
}

impl From<Contact> for PersonaContact {
    fn from(contact: Contact) -> Self {
        let persona = classify_persona(contact.title.as_deref());
        Self { contact, persona }
    }
}

impl PipelineItem for PersonaContact {
    fn stage_label(&self) -> Option<&str> {
        self.contact.stage.as_deref()
    }

    fn pipeline_value(&self) -> f64 {
        self.contact.pipeline_value()
    }
}

/// An opportunity with its owning company.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyOpportunity {
    pub company_id: CompanyId,
    pub company_name: String,
    pub opportunity: Opportunity,
}

impl PipelineItem for CompanyOpportunity {
    fn stage_label(&self) -> Option<&str> {
        self.opportunity.stage.as_deref()
    }

    fn pipeline_value(&self) -> f64 {
        self.opportunity.value.unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StageBucket<T> {
    pub stage: PipelineStage,
    pub count: usize,
    pub total_value: f64,
    /// Input order preserved.
    pub members: Vec<T>,
}

/// One bucket per canonical stage, always all four, in pipeline order.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineBoard<T> {
    pub buckets: Vec<StageBucket<T>>,
}

impl<T: PipelineItem> PipelineBoard<T> {
    pub fn build(items: impl IntoIterator<Item = T>) -> Self {
        let mut buckets: Vec<StageBucket<T>> = PipelineStage::ALL
            .into_iter()
            .map(|stage| StageBucket {
                stage,
                count: 0,
                total_value: 0.0,
                members: Vec::new(),
            })
            .collect();

        for item in items {
            let bucket = &mut buckets[normalize_stage(item.stage_label()).index()];
            bucket.count += 1;
            bucket.total_value += item.pipeline_value();
            bucket.members.push(item);
        }

        Self { buckets }
    }
}

impl<T> PipelineBoard<T> {
    pub fn bucket(&self, stage: PipelineStage) -> &StageBucket<T> {
        &self.buckets[stage.index()]
    }

    pub fn total_count(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn total_value(&self) -> f64 {
        self.buckets.iter().map(|b| b.total_value).sum()
    }
}

/// Contacts paired with their persona, in input order, optionally
/// restricted to one persona.
pub fn persona_contacts(contacts: Vec<Contact>, persona: Option<Persona>) -> Vec<PersonaContact> {
    contacts
        .into_iter()
        .map(PersonaContact::from)
        .filter(|item| persona.is_none_or(|p| item.persona == p))
        .collect()
}

/// Board over every stored contact, optionally restricted to one persona.
#[instrument(skip_all, fields(persona = ?persona))]
pub fn contact_board(contacts: Vec<Contact>, persona: Option<Persona>) -> PipelineBoard<PersonaContact> {
    let board = PipelineBoard::build(persona_contacts(contacts, persona));
    debug!(total = board.total_count(), "contact board built");
    board
}

/// Board over every opportunity of every company.
pub fn opportunity_board(companies: Vec<Company>) -> PipelineBoard<CompanyOpportunity> {
    let items = companies.into_iter().flat_map(|company| {
        let Company {
            id,
            name,
            opportunities,
            ..
        } = company;
        opportunities.into_iter().map(move |opportunity| CompanyOpportunity {
            company_id: id,
            company_name: name.clone(),
            opportunity,
        })
    });
    PipelineBoard::build(items)
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    Advanced {
        from: PipelineStage,
        to: PipelineStage,
        contact: Contact,
    },
    /// Already at the last stage; nothing was written.
    AlreadyTerminal { stage: PipelineStage },
}

/// Move a contact to the stage after its normalized current stage.
#[instrument(skip(store))]
pub fn advance_contact(store: &mut Store, id: ContactId) -> Result<AdvanceOutcome> {
    let contact = find::<Contact>(store, id).ok_or_else(|| DealDeskError::not_found("contact", id))?;
    let from = normalize_stage(contact.stage.as_deref());
    let Some(to) = from.next() else {
        debug!(stage = from.id(), "already terminal");
        return Ok(AdvanceOutcome::AlreadyTerminal { stage: from });
    };

    let contact = write_stage(store, id, to)?;
    info!(from = from.id(), to = to.id(), "contact advanced");
    Ok(AdvanceOutcome::Advanced { from, to, contact })
}

/// Explicit transition to `target`, checked against `policy`.
///
/// Moving to the current stage is a no-op and returns the stored contact.
#[instrument(skip(store))]
pub fn move_contact(
    store: &mut Store,
    id: ContactId,
    target: PipelineStage,
    policy: TransitionPolicy,
) -> Result<Contact> {
    let contact = find::<Contact>(store, id).ok_or_else(|| DealDeskError::not_found("contact", id))?;
    let from = normalize_stage(contact.stage.as_deref());
    if from == target {
        return Ok(contact);
    }

    if policy == TransitionPolicy::ForwardOnly && from.next() != Some(target) {
        return Err(DealDeskError::validation(format!(
            "cannot move from {from} to {target}: only the next stage is allowed"
        )));
    }

    let contact = write_stage(store, id, target)?;
    info!(from = from.id(), to = target.id(), "contact moved");
    Ok(contact)
}

fn write_stage(store: &mut Store, id: ContactId, stage: PipelineStage) -> Result<Contact> {
    Repository::<Contact>::new(store).update(
        id,
        ContactPatch {
            stage: Some(stage.label().to_string()),
            ..ContactPatch::default()
        },
    )
}
