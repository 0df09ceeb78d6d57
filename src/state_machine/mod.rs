// Listing lifecycle state machine.
//
// Guarded transitions with explicit events, persisted through the store;
// notification side effects come back to the caller as [`crate::events::Effect`]
// values instead of being performed in place.

pub mod actions;
pub mod errors;
pub mod events;
pub mod guards;
pub mod listing_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use errors::{ActionError, GuardError, StateMachineError};
pub use events::{InspectionOutcome, ListingEvent};
pub use listing_state_machine::{ListingStateMachine, TransitionOutcome};
pub use states::ListingState;

// Common traits
pub use actions::StateAction;
pub use guards::StateGuard;
