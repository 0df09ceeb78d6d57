//! Outbound side effects of the core.
//!
//! Workflow and lifecycle operations never send messages themselves; they
//! return [`Effect`] values for the delivery layer to act on and publish
//! notification events through the [`EventPublisher`].

pub mod publisher;

pub use publisher::{EventPublisher, PublishError, PublishedEvent};

use serde::{Deserialize, Serialize};

/// A side effect requested by an operation, carried back to the caller
/// instead of being performed in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Tell one user something happened to a listing.
    NotifyParty {
        user_id: i64,
        advertisement_id: i64,
        message: String,
    },
    /// Ask the operator for the next piece of input. `step` is the wire
    /// name of a workflow step.
    PromptStep { step: String, prompt: String },
    /// The last input was rejected; re-prompt the same step.
    RejectInput { reason: String },
}
