//! Draft-collection workflow.
//!
//! An operator is driven through an ordered, partially branching sequence of
//! prompts that fills a [`draft::DraftListing`]; on completion the aggregate
//! is handed to the store as one atomic bundle. A smaller flow of the same
//! shape plans inspections for listings under review.

pub mod draft;
pub mod engine;
pub mod inspection;
pub mod session;
pub mod steps;

pub use draft::DraftListing;
pub use engine::{DraftWorkflowEngine, StepOutcome};
pub use inspection::{InspectionPlanner, InspectionStep, PlanOutcome};
pub use session::{DraftSession, EditScope, SessionStore, WorkflowMode};
pub use steps::{ChoiceInput, DraftStep, StepInput};

use crate::clients::address_enrichment::EnrichmentError;
use crate::clients::listing_source::SourceError;
use crate::store::StoreError;
use thiserror::Error;

/// Unrecoverable workflow failures. Recoverable input problems never reach
/// this type; they come back as [`crate::events::Effect::RejectInput`].
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No in-progress session for operator {operator_id}")]
    SessionNotFound { operator_id: i64 },

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("State machine error: {0}")]
    StateMachine(#[from] crate::state_machine::StateMachineError),
}
