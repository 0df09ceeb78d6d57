use serde::{Deserialize, Serialize};
use std::fmt;

/// Listing lifecycle states. The review pipeline runs new -> viewed ->
/// assigned; outcome states refine what happened after the on-site visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingState {
    /// Initial state when a listing is created
    #[default]
    New,
    /// A dispatcher has reviewed the listing
    Viewed,
    /// An inspection has been planned and an agent attached
    Assigned,
    /// Deal closed through the normal pipeline
    Done,
    /// Withdrawn before completion
    Canceled,
    /// Seller is open to negotiation after the visit
    Bargain,
    /// Seller withdrew after the visit
    CanceledAfterView,
    /// Terms agreed, purchase pending
    Agreed,
    /// Room was purchased
    Bought,
    /// Outcome undecided, follow up later
    Maybe,
}

impl ListingState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Canceled | Self::Bought)
    }

    /// Check if this is a post-inspection outcome state
    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            Self::Bargain | Self::CanceledAfterView | Self::Agreed | Self::Bought | Self::Maybe
        )
    }

    /// Check if the listing is still moving through the review pipeline
    pub fn is_active(&self) -> bool {
        matches!(self, Self::New | Self::Viewed | Self::Assigned)
    }
}

impl fmt::Display for ListingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Viewed => write!(f, "viewed"),
            Self::Assigned => write!(f, "assigned"),
            Self::Done => write!(f, "done"),
            Self::Canceled => write!(f, "canceled"),
            Self::Bargain => write!(f, "bargain"),
            Self::CanceledAfterView => write!(f, "canceled_after_view"),
            Self::Agreed => write!(f, "agreed"),
            Self::Bought => write!(f, "bought"),
            Self::Maybe => write!(f, "maybe"),
        }
    }
}

impl std::str::FromStr for ListingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "viewed" => Ok(Self::Viewed),
            "assigned" => Ok(Self::Assigned),
            "done" => Ok(Self::Done),
            "canceled" => Ok(Self::Canceled),
            "bargain" => Ok(Self::Bargain),
            "canceled_after_view" => Ok(Self::CanceledAfterView),
            "agreed" => Ok(Self::Agreed),
            "bought" => Ok(Self::Bought),
            "maybe" => Ok(Self::Maybe),
            _ => Err(format!("Invalid listing state: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips() {
        for state in [
            ListingState::New,
            ListingState::Viewed,
            ListingState::Assigned,
            ListingState::Done,
            ListingState::Canceled,
            ListingState::Bargain,
            ListingState::CanceledAfterView,
            ListingState::Agreed,
            ListingState::Bought,
            ListingState::Maybe,
        ] {
            assert_eq!(state.to_string().parse::<ListingState>(), Ok(state));
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(ListingState::Done.is_terminal());
        assert!(ListingState::Canceled.is_terminal());
        assert!(ListingState::Bought.is_terminal());
        assert!(!ListingState::Assigned.is_terminal());
        assert!(!ListingState::Maybe.is_terminal());
    }

    #[test]
    fn test_default_is_new() {
        assert_eq!(ListingState::default(), ListingState::New);
    }
}
