use super::{
    actions::{CloseInspectionsAction, NotifyPartiesAction, PublishTransitionEventAction, StateAction},
    errors::{StateMachineError, StateMachineResult},
    events::ListingEvent,
    guards::{resolve_assignee, ActorIsAdminGuard, ActorIsAttachedGuard, ActorIsReviewerGuard, StateGuard},
    states::ListingState,
};
use crate::events::{Effect, EventPublisher};
use crate::models::{Advertisement, UserRole};
use crate::store::{ListingStore, TransitionChange};
use std::sync::Arc;
use tracing::info;

/// Result of a successful transition: the state reached plus the side
/// effects the caller must deliver.
#[derive(Debug)]
pub struct TransitionOutcome {
    pub new_state: ListingState,
    pub effects: Vec<Effect>,
}

/// State machine driving one listing through its lifecycle. Persists status
/// and attachments through the store; never sends messages itself.
pub struct ListingStateMachine {
    advertisement: Advertisement,
    store: Arc<dyn ListingStore>,
    event_publisher: EventPublisher,
}

impl ListingStateMachine {
    pub fn new(
        advertisement: Advertisement,
        store: Arc<dyn ListingStore>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            advertisement,
            store,
            event_publisher,
        }
    }

    /// Get the current state of the listing
    pub fn current_state(&self) -> ListingState {
        self.advertisement.status
    }

    /// Attempt to transition the listing state
    pub async fn transition(
        &mut self,
        event: ListingEvent,
    ) -> StateMachineResult<TransitionOutcome> {
        let current_state = self.advertisement.status;
        let target_state = self.determine_target_state(current_state, &event)?;

        self.check_guards(current_state, target_state, &event)
            .await?;
        let change = self.transition_change(&event).await?;

        // The whole write set lands in one store operation
        self.advertisement = self
            .store
            .apply_transition(self.advertisement.id, target_state, change)
            .await?;

        let effects = self
            .execute_actions(current_state, target_state, event.event_type())
            .await?;

        info!(
            advertisement_id = self.advertisement.id,
            from_state = %current_state,
            to_state = %target_state,
            event = event.event_type(),
            actor_id = event.actor_id(),
            "Listing transitioned"
        );

        Ok(TransitionOutcome {
            new_state: target_state,
            effects,
        })
    }

    /// Determine the target state based on current state and event
    fn determine_target_state(
        &self,
        current_state: ListingState,
        event: &ListingEvent,
    ) -> StateMachineResult<ListingState> {
        let target = match (current_state, event) {
            // Review pipeline
            (ListingState::New, ListingEvent::MarkViewed { .. }) => ListingState::Viewed,
            (ListingState::Viewed, ListingEvent::PlanInspection { .. }) => ListingState::Assigned,

            // Outcome recording; a recorded outcome may be corrected as long
            // as it has not reached a terminal state
            (ListingState::Assigned, ListingEvent::RecordOutcome { outcome, .. })
            | (ListingState::Bargain, ListingEvent::RecordOutcome { outcome, .. })
            | (ListingState::Agreed, ListingEvent::RecordOutcome { outcome, .. })
            | (ListingState::Maybe, ListingEvent::RecordOutcome { outcome, .. })
            | (ListingState::CanceledAfterView, ListingEvent::RecordOutcome { outcome, .. }) => {
                outcome.target_state()
            }

            // Completion
            (ListingState::Assigned, ListingEvent::Complete { .. })
            | (ListingState::Bargain, ListingEvent::Complete { .. })
            | (ListingState::Agreed, ListingEvent::Complete { .. })
            | (ListingState::Maybe, ListingEvent::Complete { .. }) => ListingState::Done,

            // Cancellation; past assignment the outcome edge covers it
            (ListingState::New, ListingEvent::Cancel { .. })
            | (ListingState::Viewed, ListingEvent::Cancel { .. }) => ListingState::Canceled,

            // Invalid transitions
            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: Some(from_state.to_string()),
                    to: format!("{event:?}"),
                })
            }
        };

        Ok(target)
    }

    /// Check guard conditions for the transition
    async fn check_guards(
        &self,
        _current_state: ListingState,
        _target_state: ListingState,
        event: &ListingEvent,
    ) -> StateMachineResult<()> {
        match event {
            ListingEvent::MarkViewed { actor_id, .. } | ListingEvent::Cancel { actor_id } => {
                let guard = ActorIsAdminGuard {
                    actor_id: *actor_id,
                };
                guard.check(&self.advertisement, &*self.store).await?;
            }
            ListingEvent::PlanInspection { actor_id } => {
                let guard = ActorIsReviewerGuard {
                    actor_id: *actor_id,
                };
                guard.check(&self.advertisement, &*self.store).await?;
            }
            ListingEvent::RecordOutcome { actor_id, .. }
            | ListingEvent::Complete { actor_id } => {
                let guard = ActorIsAttachedGuard {
                    actor_id: *actor_id,
                };
                guard.check(&self.advertisement, &*self.store).await?;
            }
        }
        Ok(())
    }

    /// Resolve the write set the event carries beyond the status itself
    async fn transition_change(
        &self,
        event: &ListingEvent,
    ) -> StateMachineResult<TransitionChange> {
        if let ListingEvent::MarkViewed {
            actor_id,
            dispatcher_id,
            agent_id,
        } = event
        {
            let dispatcher =
                resolve_assignee(&*self.store, UserRole::Dispatcher, *dispatcher_id).await?;
            let agent = resolve_assignee(&*self.store, UserRole::Agent, *agent_id).await?;
            return Ok(TransitionChange {
                dispatcher_id: Some(dispatcher),
                agent_id: Some(agent),
                viewed_by: Some(*actor_id),
            });
        }
        Ok(TransitionChange::default())
    }

    /// Execute actions after successful transition
    async fn execute_actions(
        &self,
        from_state: ListingState,
        to_state: ListingState,
        event: &str,
    ) -> StateMachineResult<Vec<Effect>> {
        let actions: Vec<Box<dyn StateAction<Advertisement> + Send + Sync>> = vec![
            Box::new(PublishTransitionEventAction::new(
                self.event_publisher.clone(),
            )),
            Box::new(CloseInspectionsAction),
            Box::new(NotifyPartiesAction),
        ];

        let mut effects = Vec::new();
        for action in actions {
            effects.extend(
                action
                    .execute(
                        &self.advertisement,
                        from_state,
                        to_state,
                        event,
                        &*self.store,
                    )
                    .await?,
            );
        }
        Ok(effects)
    }

    /// Check if the listing is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.advertisement.status.is_terminal()
    }

    /// Get the listing being driven
    pub fn advertisement(&self) -> &Advertisement {
        &self.advertisement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewAdvertisement, NewFlat, NewHouse, NewUser};
    use crate::state_machine::events::InspectionOutcome;
    use crate::store::{ListingBundle, MemoryListingStore};

    async fn seed(store: &MemoryListingStore) -> Advertisement {
        for (id, role) in [
            (1, UserRole::Admin),
            (2, UserRole::Dispatcher),
            (3, UserRole::Agent),
        ] {
            store
                .upsert_user(NewUser {
                    id,
                    username: None,
                    role,
                })
                .await
                .unwrap();
        }
        store
            .create_listing(ListingBundle {
                house: NewHouse {
                    cadastral_number: "78:01:01:1".to_string(),
                    street_name: "Лиговский пр-т".to_string(),
                    number: "12".to_string(),
                    floor_count: 4,
                    is_historical: None,
                },
                flat: NewFlat::default(),
                rooms: vec![],
                advertisement: NewAdvertisement {
                    url: "https://www.avito.ru/spb/komnaty/1".to_string(),
                    room_price: 1_900_000,
                    room_area: 18.5,
                    contact_phone: "89219876543".to_string(),
                    contact_status: "А".to_string(),
                    contact_name: "Анна".to_string(),
                    description: String::new(),
                    ad_creation_date: None,
                    added_by: 1,
                },
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let store = Arc::new(MemoryListingStore::new());
        let ad = seed(&store).await;
        let mut machine =
            ListingStateMachine::new(ad, store.clone(), EventPublisher::default());

        let outcome = machine
            .transition(ListingEvent::MarkViewed {
                actor_id: 1,
                dispatcher_id: None,
                agent_id: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome.new_state, ListingState::Viewed);

        let refreshed = machine.advertisement();
        assert_eq!(refreshed.viewed_by, Some(1));
        assert_eq!(refreshed.pinned_dispatcher, Some(2));
        assert_eq!(refreshed.pinned_agent, Some(3));

        let outcome = machine
            .transition(ListingEvent::PlanInspection { actor_id: 2 })
            .await
            .unwrap();
        assert_eq!(outcome.new_state, ListingState::Assigned);
        // agent notification plus one per admin
        assert!(outcome
            .effects
            .iter()
            .any(|e| matches!(e, Effect::NotifyParty { user_id: 3, .. })));
        assert!(outcome
            .effects
            .iter()
            .any(|e| matches!(e, Effect::NotifyParty { user_id: 1, .. })));

        let outcome = machine
            .transition(ListingEvent::Complete { actor_id: 3 })
            .await
            .unwrap();
        assert_eq!(outcome.new_state, ListingState::Done);
        assert!(machine.is_terminal());
    }

    #[tokio::test]
    async fn test_failed_assignment_leaves_listing_untouched() {
        let store = Arc::new(MemoryListingStore::new());
        let ad = seed(&store).await;
        // no agent exists, so the assignment cannot resolve
        store.set_role(3, UserRole::Guest).await.unwrap();
        let mut machine =
            ListingStateMachine::new(ad.clone(), store.clone(), EventPublisher::default());

        let err = machine
            .transition(ListingEvent::MarkViewed {
                actor_id: 1,
                dispatcher_id: None,
                agent_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StateMachineError::GuardFailed { .. }));

        // nothing was written: no status change, no half-applied attachment
        let refreshed = store.get_advertisement(ad.id).await.unwrap().unwrap();
        assert_eq!(refreshed.status, ListingState::New);
        assert_eq!(refreshed.pinned_dispatcher, None);
        assert_eq!(refreshed.pinned_agent, None);
        assert_eq!(refreshed.viewed_by, None);
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected() {
        let store = Arc::new(MemoryListingStore::new());
        let ad = seed(&store).await;
        let mut machine =
            ListingStateMachine::new(ad, store.clone(), EventPublisher::default());

        let err = machine
            .transition(ListingEvent::Complete { actor_id: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, StateMachineError::InvalidTransition { .. }));
        assert_eq!(machine.current_state(), ListingState::New);
    }

    #[tokio::test]
    async fn test_guest_cannot_review() {
        let store = Arc::new(MemoryListingStore::new());
        let ad = seed(&store).await;
        store
            .upsert_user(NewUser {
                id: 99,
                username: None,
                role: UserRole::Guest,
            })
            .await
            .unwrap();
        let mut machine =
            ListingStateMachine::new(ad, store.clone(), EventPublisher::default());

        let err = machine
            .transition(ListingEvent::MarkViewed {
                actor_id: 99,
                dispatcher_id: None,
                agent_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StateMachineError::GuardFailed { .. }));
    }

    #[tokio::test]
    async fn test_terminal_state_blocks_cancel() {
        let store = Arc::new(MemoryListingStore::new());
        let ad = seed(&store).await;
        let mut machine =
            ListingStateMachine::new(ad, store.clone(), EventPublisher::default());
        machine
            .transition(ListingEvent::MarkViewed {
                actor_id: 1,
                dispatcher_id: None,
                agent_id: None,
            })
            .await
            .unwrap();
        machine
            .transition(ListingEvent::Cancel { actor_id: 1 })
            .await
            .unwrap();

        let err = machine
            .transition(ListingEvent::Cancel { actor_id: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, StateMachineError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_record_outcome_by_attached_agent() {
        let store = Arc::new(MemoryListingStore::new());
        let ad = seed(&store).await;
        let mut machine =
            ListingStateMachine::new(ad, store.clone(), EventPublisher::default());
        machine
            .transition(ListingEvent::MarkViewed {
                actor_id: 1,
                dispatcher_id: None,
                agent_id: None,
            })
            .await
            .unwrap();
        machine
            .transition(ListingEvent::PlanInspection { actor_id: 2 })
            .await
            .unwrap();

        // An unrelated dispatcher may not record the outcome
        store
            .upsert_user(NewUser {
                id: 20,
                username: None,
                role: UserRole::Dispatcher,
            })
            .await
            .unwrap();
        let err = machine
            .transition(ListingEvent::RecordOutcome {
                actor_id: 20,
                outcome: InspectionOutcome::Bought,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StateMachineError::GuardFailed { .. }));

        let outcome = machine
            .transition(ListingEvent::RecordOutcome {
                actor_id: 3,
                outcome: InspectionOutcome::Bought,
            })
            .await
            .unwrap();
        assert_eq!(outcome.new_state, ListingState::Bought);
        assert!(machine.is_terminal());
    }
}
