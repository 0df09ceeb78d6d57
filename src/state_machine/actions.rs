use super::errors::{ActionError, ActionResult};
use super::states::ListingState;
use crate::events::{Effect, EventPublisher};
use crate::models::{Advertisement, InspectionStatus, UserRole};
use crate::store::ListingStore;
use async_trait::async_trait;
use serde_json::json;

/// Trait for implementing state transition actions
#[async_trait]
pub trait StateAction<T> {
    /// Execute the action, returning any side effects for the caller
    async fn execute(
        &self,
        entity: &T,
        from_state: ListingState,
        to_state: ListingState,
        event: &str,
        store: &dyn ListingStore,
    ) -> ActionResult<Vec<Effect>>;

    /// Get a description of this action for logging
    fn description(&self) -> &'static str;
}

/// Action to publish lifecycle events when state transitions occur
pub struct PublishTransitionEventAction {
    event_publisher: EventPublisher,
}

impl PublishTransitionEventAction {
    pub fn new(event_publisher: EventPublisher) -> Self {
        Self { event_publisher }
    }
}

#[async_trait]
impl StateAction<Advertisement> for PublishTransitionEventAction {
    async fn execute(
        &self,
        ad: &Advertisement,
        from_state: ListingState,
        to_state: ListingState,
        event: &str,
        _store: &dyn ListingStore,
    ) -> ActionResult<Vec<Effect>> {
        let event_name = format!("listing.{to_state}");
        let context = json!({
            "advertisement_id": ad.id,
            "url": ad.url,
            "from_state": from_state.to_string(),
            "to_state": to_state.to_string(),
            "event": event,
        });
        self.event_publisher
            .publish(event_name.clone(), context)
            .await
            .map_err(|_| ActionError::EventPublishFailed { event_name })?;
        Ok(Vec::new())
    }

    fn description(&self) -> &'static str {
        "Publish lifecycle event for listing transition"
    }
}

/// Action to build notification effects for the parties affected by the
/// transition. Admins hear about assignments and outcomes; attached
/// dispatcher and agent hear about everything past their attachment.
pub struct NotifyPartiesAction;

#[async_trait]
impl StateAction<Advertisement> for NotifyPartiesAction {
    async fn execute(
        &self,
        ad: &Advertisement,
        _from_state: ListingState,
        to_state: ListingState,
        _event: &str,
        store: &dyn ListingStore,
    ) -> ActionResult<Vec<Effect>> {
        let mut effects = Vec::new();
        let mut notify = |user_id: i64, message: String| {
            effects.push(Effect::NotifyParty {
                user_id,
                advertisement_id: ad.id,
                message,
            });
        };

        match to_state {
            ListingState::Viewed => {
                if let Some(dispatcher_id) = ad.pinned_dispatcher {
                    notify(
                        dispatcher_id,
                        format!("Listing {} is waiting for an inspection plan", ad.url),
                    );
                }
            }
            ListingState::Assigned => {
                if let Some(agent_id) = ad.pinned_agent {
                    notify(
                        agent_id,
                        format!("You are assigned to visit listing {}", ad.url),
                    );
                }
                for admin in store.list_by_role(UserRole::Admin).await? {
                    notify(
                        admin.id,
                        format!("Listing {} has a planned inspection", ad.url),
                    );
                }
            }
            ListingState::Canceled => {
                for attached in [ad.pinned_dispatcher, ad.pinned_agent].into_iter().flatten() {
                    notify(attached, format!("Listing {} was canceled", ad.url));
                }
            }
            state if state.is_outcome() || state == ListingState::Done => {
                for admin in store.list_by_role(UserRole::Admin).await? {
                    notify(admin.id, format!("Listing {} is now {state}", ad.url));
                }
            }
            _ => {}
        }

        Ok(effects)
    }

    fn description(&self) -> &'static str {
        "Notify affected parties about the listing transition"
    }
}

/// Action to close the planned inspections once the visit has a recorded
/// outcome. A refused visit cancels them; every other outcome marks them
/// done.
pub struct CloseInspectionsAction;

#[async_trait]
impl StateAction<Advertisement> for CloseInspectionsAction {
    async fn execute(
        &self,
        ad: &Advertisement,
        _from_state: ListingState,
        to_state: ListingState,
        _event: &str,
        store: &dyn ListingStore,
    ) -> ActionResult<Vec<Effect>> {
        if !to_state.is_outcome() && to_state != ListingState::Done {
            return Ok(Vec::new());
        }
        let closed = if to_state == ListingState::CanceledAfterView {
            InspectionStatus::Canceled
        } else {
            InspectionStatus::Done
        };
        for inspection in store.get_inspections(ad.id).await? {
            if inspection.status == InspectionStatus::Planned {
                store
                    .update_inspection_status(inspection.id, closed)
                    .await?;
            }
        }
        Ok(Vec::new())
    }

    fn description(&self) -> &'static str {
        "Close planned inspections after the visit outcome"
    }
}
