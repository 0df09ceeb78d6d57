use crate::calc::CalcError;
use crate::clients::{EnrichmentError, SourceError};
use crate::state_machine::StateMachineError;
use crate::store::StoreError;
use crate::workflow::WorkflowError;

/// Top-level error type aggregating the component errors.
#[derive(Debug, thiserror::Error)]
pub enum ListingCoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("State transition error: {0}")]
    StateTransition(#[from] StateMachineError),

    #[error("Calculation error: {0}")]
    Calculation(#[from] CalcError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Listing source error: {0}")]
    Source(#[from] SourceError),

    #[error("Address enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, ListingCoreError>;
