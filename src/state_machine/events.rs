use super::states::ListingState;
use serde::{Deserialize, Serialize};

/// Post-inspection outcome recorded by the visiting agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionOutcome {
    Bargain,
    CanceledAfterView,
    Agreed,
    Bought,
    Maybe,
}

impl InspectionOutcome {
    pub fn target_state(&self) -> ListingState {
        match self {
            Self::Bargain => ListingState::Bargain,
            Self::CanceledAfterView => ListingState::CanceledAfterView,
            Self::Agreed => ListingState::Agreed,
            Self::Bought => ListingState::Bought,
            Self::Maybe => ListingState::Maybe,
        }
    }
}

/// Events that can trigger listing state transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ListingEvent {
    /// An admin marks the listing worth pursuing, pinning a dispatcher and
    /// an agent. Either id may be omitted when exactly one holder of the
    /// role exists; otherwise the caller must choose.
    MarkViewed {
        actor_id: i64,
        dispatcher_id: Option<i64>,
        agent_id: Option<i64>,
    },
    /// An inspection has been planned for the listing
    PlanInspection { actor_id: i64 },
    /// Record what happened after the on-site visit
    RecordOutcome {
        actor_id: i64,
        outcome: InspectionOutcome,
    },
    /// Close the deal through the normal pipeline
    Complete { actor_id: i64 },
    /// Withdraw the listing
    Cancel { actor_id: i64 },
}

impl ListingEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MarkViewed { .. } => "mark_viewed",
            Self::PlanInspection { .. } => "plan_inspection",
            Self::RecordOutcome { .. } => "record_outcome",
            Self::Complete { .. } => "complete",
            Self::Cancel { .. } => "cancel",
        }
    }

    /// The user driving the transition
    pub fn actor_id(&self) -> i64 {
        match self {
            Self::MarkViewed { actor_id, .. }
            | Self::PlanInspection { actor_id, .. }
            | Self::RecordOutcome { actor_id, .. }
            | Self::Complete { actor_id }
            | Self::Cancel { actor_id } => *actor_id,
        }
    }
}
