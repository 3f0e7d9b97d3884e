//! Domain logic for DealDesk.
//!
//! Everything here runs synchronously against a [`dealdesk_storage::Store`]:
//! typed repositories over the stored collections, the stage normalizer and
//! persona classifier, pipeline boards, list/campaign binding, reference
//! resolution, and CSV import. Only the [`integration`] boundary is async.

pub mod binding;
pub mod import;
pub mod integration;
pub mod persona;
pub mod pipeline;
pub mod references;
pub mod repository;
pub mod rules;
pub mod session;
pub mod stage;

pub use persona::{Persona, classify_persona};
pub use pipeline::{AdvanceOutcome, PipelineBoard, StageBucket};
pub use repository::{Entity, Repository};
pub use session::{Policies, Session};
pub use stage::{PipelineStage, normalize_stage};
