//! Lifecycle tests: the review pipeline, inspection planning, and the
//! forward-only transition property.

use listing_core::events::{Effect, EventPublisher};
use listing_core::models::{
    Advertisement, InspectionStatus, NewAdvertisement, NewFlat, NewHouse, NewUser, UserRole,
};
use listing_core::state_machine::{
    InspectionOutcome, ListingEvent, ListingState, ListingStateMachine, StateMachineError,
};
use listing_core::store::{ListingBundle, ListingStore, MemoryListingStore};
use listing_core::workflow::{InspectionPlanner, StepInput, WorkflowError};
use std::sync::Arc;

async fn seed_store() -> (Arc<MemoryListingStore>, Advertisement) {
    let store = Arc::new(MemoryListingStore::new());
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
    let ad = store
        .create_listing(ListingBundle {
            house: NewHouse {
                cadastral_number: "78:01:0001:200".to_string(),
                street_name: "Суворовский пр-т".to_string(),
                number: "43".to_string(),
                floor_count: 6,
                is_historical: None,
            },
            flat: NewFlat {
                room_count: Some(3),
                floor: Some(4),
                ..Default::default()
            },
            rooms: vec![],
            advertisement: NewAdvertisement {
                url: "https://www.avito.ru/spb/komnaty/lifecycle_1".to_string(),
                room_price: 2_000_000,
                room_area: 20.0,
                contact_phone: "89219876543".to_string(),
                contact_status: "С".to_string(),
                contact_name: "Петр".to_string(),
                description: String::new(),
                ad_creation_date: None,
                added_by: 1,
            },
        })
        .await
        .unwrap();
    (store, ad)
}

#[tokio::test]
async fn test_inspection_planning_drives_listing_to_assigned() {
    let (store, ad) = seed_store().await;
    let publisher = EventPublisher::default();

    // Admin triage first: new -> viewed, dispatcher and agent pinned
    let mut machine = ListingStateMachine::new(ad.clone(), store.clone(), publisher.clone());
    machine
        .transition(ListingEvent::MarkViewed {
            actor_id: 1,
            dispatcher_id: None,
            agent_id: None,
        })
        .await
        .unwrap();

    let planner = InspectionPlanner::new(store.clone(), publisher);
    let started = planner.start(2, ad.id);
    let plan_id = started.session.as_ref().unwrap().plan_id;

    // An image has no meaning at the date step; the planner re-prompts
    let outcome = planner
        .handle_input(2, plan_id, StepInput::Image("photo".to_string()))
        .await
        .unwrap();
    assert!(outcome
        .effects
        .iter()
        .any(|e| matches!(e, Effect::RejectInput { .. })));
    assert!(outcome.session.is_some());

    // A past date is rejected and the step does not advance
    let outcome = planner
        .handle_input(2, plan_id, StepInput::Text("01.01".to_string()))
        .await
        .unwrap();
    assert!(outcome
        .effects
        .iter()
        .any(|e| matches!(e, Effect::RejectInput { .. })));

    let outcome = planner
        .handle_input(2, plan_id, StepInput::Text("31.12".to_string()))
        .await
        .unwrap();
    assert!(outcome.completed.is_none());

    planner
        .handle_input(2, plan_id, StepInput::Text("12:00-14:00".to_string()))
        .await
        .unwrap();
    planner
        .handle_input(2, plan_id, StepInput::Text("89219876543 П-Петр".to_string()))
        .await
        .unwrap();
    let outcome = planner
        .handle_input(2, plan_id, StepInput::Skip)
        .await
        .unwrap();

    let inspection = outcome.completed.expect("inspection should be created");
    assert_eq!(inspection.advertisement_id, ad.id);

    let refreshed = store.get_advertisement(ad.id).await.unwrap().unwrap();
    assert_eq!(refreshed.status, ListingState::Assigned);
    // Admins are notified with the inspection summary
    assert!(outcome
        .effects
        .iter()
        .any(|e| matches!(e, Effect::NotifyParty { user_id: 1, .. })));
}

/// Drive a fresh planning session up to the final meeting-tip step.
async fn fill_plan_steps(
    planner: &InspectionPlanner,
    operator_id: i64,
    advertisement_id: i64,
) -> uuid::Uuid {
    let started = planner.start(operator_id, advertisement_id);
    let plan_id = started.session.as_ref().unwrap().plan_id;
    for text in ["31.12", "12:00-14:00", "89219876543 П-Петр"] {
        planner
            .handle_input(operator_id, plan_id, StepInput::Text(text.to_string()))
            .await
            .unwrap();
    }
    plan_id
}

#[tokio::test]
async fn test_plan_against_unviewed_listing_leaves_no_trace() {
    let (store, ad) = seed_store().await;
    let planner = InspectionPlanner::new(store.clone(), EventPublisher::default());
    let plan_id = fill_plan_steps(&planner, 2, ad.id).await;

    // The listing is still new, so the plan cannot apply
    let err = planner
        .handle_input(2, plan_id, StepInput::Skip)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::StateMachine(StateMachineError::InvalidTransition { .. })
    ));

    // No inspection row, no status change, no lingering session
    assert!(store.get_inspections(ad.id).await.unwrap().is_empty());
    let refreshed = store.get_advertisement(ad.id).await.unwrap().unwrap();
    assert_eq!(refreshed.status, ListingState::New);
    let err = planner
        .handle_input(2, plan_id, StepInput::Skip)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::SessionNotFound { .. }));
}

#[tokio::test]
async fn test_recorded_outcome_closes_planned_inspection() {
    let (store, ad) = seed_store().await;
    let publisher = EventPublisher::default();
    let mut machine = ListingStateMachine::new(ad.clone(), store.clone(), publisher.clone());
    machine
        .transition(ListingEvent::MarkViewed {
            actor_id: 1,
            dispatcher_id: None,
            agent_id: None,
        })
        .await
        .unwrap();

    let planner = InspectionPlanner::new(store.clone(), publisher.clone());
    let plan_id = fill_plan_steps(&planner, 2, ad.id).await;
    planner
        .handle_input(2, plan_id, StepInput::Skip)
        .await
        .unwrap();

    let refreshed = store.get_advertisement(ad.id).await.unwrap().unwrap();
    let mut machine = ListingStateMachine::new(refreshed, store.clone(), publisher);
    machine
        .transition(ListingEvent::RecordOutcome {
            actor_id: 3,
            outcome: InspectionOutcome::Agreed,
        })
        .await
        .unwrap();

    let inspections = store.get_inspections(ad.id).await.unwrap();
    assert_eq!(inspections.len(), 1);
    assert_eq!(inspections[0].status, InspectionStatus::Done);
}

#[tokio::test]
async fn test_refused_visit_cancels_planned_inspection() {
    let (store, ad) = seed_store().await;
    let publisher = EventPublisher::default();
    let mut machine = ListingStateMachine::new(ad.clone(), store.clone(), publisher.clone());
    machine
        .transition(ListingEvent::MarkViewed {
            actor_id: 1,
            dispatcher_id: None,
            agent_id: None,
        })
        .await
        .unwrap();

    let planner = InspectionPlanner::new(store.clone(), publisher.clone());
    let plan_id = fill_plan_steps(&planner, 2, ad.id).await;
    planner
        .handle_input(2, plan_id, StepInput::Skip)
        .await
        .unwrap();

    let refreshed = store.get_advertisement(ad.id).await.unwrap().unwrap();
    let mut machine = ListingStateMachine::new(refreshed, store.clone(), publisher);
    machine
        .transition(ListingEvent::RecordOutcome {
            actor_id: 3,
            outcome: InspectionOutcome::CanceledAfterView,
        })
        .await
        .unwrap();

    let inspections = store.get_inspections(ad.id).await.unwrap();
    assert_eq!(inspections[0].status, InspectionStatus::Canceled);
}

#[tokio::test]
async fn test_transitions_only_move_forward() {
    let (store, ad) = seed_store().await;
    let publisher = EventPublisher::default();
    let mut machine = ListingStateMachine::new(ad, store.clone(), publisher);

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
    machine
        .transition(ListingEvent::Complete { actor_id: 3 })
        .await
        .unwrap();
    assert_eq!(machine.current_state(), ListingState::Done);

    // Done is terminal: nothing may move the listing again
    for event in [
        ListingEvent::MarkViewed {
            actor_id: 1,
            dispatcher_id: None,
            agent_id: None,
        },
        ListingEvent::PlanInspection { actor_id: 2 },
        ListingEvent::Cancel { actor_id: 1 },
        ListingEvent::RecordOutcome {
            actor_id: 3,
            outcome: InspectionOutcome::Maybe,
        },
    ] {
        let err = machine.transition(event).await.unwrap_err();
        assert!(matches!(err, StateMachineError::InvalidTransition { .. }));
    }
    let refreshed = store.get_advertisement(machine.advertisement().id).await.unwrap().unwrap();
    assert_eq!(refreshed.status, ListingState::Done);
}

#[tokio::test]
async fn test_outcome_refinement_and_correction() {
    let (store, ad) = seed_store().await;
    let mut machine = ListingStateMachine::new(ad, store.clone(), EventPublisher::default());
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

    let outcome = machine
        .transition(ListingEvent::RecordOutcome {
            actor_id: 3,
            outcome: InspectionOutcome::Maybe,
        })
        .await
        .unwrap();
    assert_eq!(outcome.new_state, ListingState::Maybe);

    // The agent may correct a non-terminal outcome
    let outcome = machine
        .transition(ListingEvent::RecordOutcome {
            actor_id: 3,
            outcome: InspectionOutcome::Agreed,
        })
        .await
        .unwrap();
    assert_eq!(outcome.new_state, ListingState::Agreed);

    machine
        .transition(ListingEvent::Complete { actor_id: 3 })
        .await
        .unwrap();
    assert_eq!(machine.current_state(), ListingState::Done);
}
