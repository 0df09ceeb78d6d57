//! Inspection planning, a smaller flow of the same shape as the draft
//! workflow: date, time window, on-site contact, meeting tip, then the
//! lifecycle transition to assigned.

use super::steps::StepInput;
use super::WorkflowError;
use crate::events::{Effect, EventPublisher};
use crate::models::{Inspection, NewInspection};
use crate::state_machine::{ListingEvent, ListingStateMachine};
use crate::store::{ListingStore, StoreError};
use crate::validation::{self, ContactInfo};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStep {
    Date,
    Period,
    Contact,
    MeetingTip,
    Complete,
}

impl InspectionStep {
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Date => "Дата осмотра (дд.мм)",
            Self::Period => "Интервал времени (например 12:00-14:00)",
            Self::Contact => "Телефон, статус и имя встречающего",
            Self::MeetingTip => "Как найти место встречи (/0 чтобы пропустить)",
            Self::Complete => "Готово",
        }
    }

    fn next(&self) -> Self {
        match self {
            Self::Date => Self::Period,
            Self::Period => Self::Contact,
            Self::Contact => Self::MeetingTip,
            Self::MeetingTip | Self::Complete => Self::Complete,
        }
    }
}

impl fmt::Display for InspectionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Period => write!(f, "period"),
            Self::Contact => write!(f, "contact"),
            Self::MeetingTip => write!(f, "meeting_tip"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InspectionSession {
    pub operator_id: i64,
    pub plan_id: Uuid,
    pub advertisement_id: i64,
    pub current_step: InspectionStep,
    pub inspection_date: Option<NaiveDate>,
    pub period_start: Option<NaiveTime>,
    pub period_end: Option<NaiveTime>,
    pub contact: Option<ContactInfo>,
    pub meeting_tip_text: Option<String>,
    pub meeting_tip_photo_ref: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Result of feeding one input into an inspection-planning session
#[derive(Debug)]
pub struct PlanOutcome {
    pub session: Option<InspectionSession>,
    pub effects: Vec<Effect>,
    pub completed: Option<Inspection>,
    pub abandoned: bool,
}

impl PlanOutcome {
    fn prompting(session: InspectionSession, mut effects: Vec<Effect>) -> Self {
        effects.push(Effect::PromptStep {
            step: session.current_step.to_string(),
            prompt: session.current_step.prompt().to_string(),
        });
        Self {
            session: Some(session),
            effects,
            completed: None,
            abandoned: false,
        }
    }
}

/// Plans inspections and drives the listing into the assigned state.
pub struct InspectionPlanner {
    store: Arc<dyn ListingStore>,
    event_publisher: EventPublisher,
    sessions: DashMap<(i64, Uuid), InspectionSession>,
}

impl InspectionPlanner {
    pub fn new(store: Arc<dyn ListingStore>, event_publisher: EventPublisher) -> Self {
        Self {
            store,
            event_publisher,
            sessions: DashMap::new(),
        }
    }

    pub fn start(&self, operator_id: i64, advertisement_id: i64) -> PlanOutcome {
        let session = InspectionSession {
            operator_id,
            plan_id: Uuid::new_v4(),
            advertisement_id,
            current_step: InspectionStep::Date,
            inspection_date: None,
            period_start: None,
            period_end: None,
            contact: None,
            meeting_tip_text: None,
            meeting_tip_photo_ref: None,
            updated_at: Utc::now(),
        };
        self.sessions
            .insert((operator_id, session.plan_id), session.clone());
        PlanOutcome::prompting(session, Vec::new())
    }

    pub async fn handle_input(
        &self,
        operator_id: i64,
        plan_id: Uuid,
        input: StepInput,
    ) -> Result<PlanOutcome, WorkflowError> {
        let mut session = self
            .sessions
            .get(&(operator_id, plan_id))
            .map(|entry| entry.clone())
            .ok_or(WorkflowError::SessionNotFound { operator_id })?;

        if input == StepInput::Cancel {
            self.sessions.remove(&(operator_id, plan_id));
            return Ok(PlanOutcome {
                session: None,
                effects: Vec::new(),
                completed: None,
                abandoned: true,
            });
        }

        let reject = |session: InspectionSession, reason: String| {
            Ok(PlanOutcome {
                effects: vec![Effect::RejectInput { reason }],
                session: Some(session),
                completed: None,
                abandoned: false,
            })
        };

        match (session.current_step, input) {
            (InspectionStep::Date, StepInput::Text(text)) => {
                match validation::parse_day_month(&text, Utc::now().date_naive()) {
                    Ok(date) => session.inspection_date = Some(date),
                    Err(e) => return reject(session, e.to_string()),
                }
            }
            (InspectionStep::Period, StepInput::Text(text)) => {
                match parse_period(&text) {
                    Ok((start, end)) => {
                        session.period_start = Some(start);
                        session.period_end = Some(end);
                    }
                    Err(e) => return reject(session, e.to_string()),
                }
            }
            (InspectionStep::Contact, StepInput::Text(text)) => {
                match validation::parse_inspection_contact(&text) {
                    Ok(contact) => session.contact = Some(contact),
                    Err(e) => return reject(session, e.to_string()),
                }
            }
            (InspectionStep::MeetingTip, StepInput::Text(text)) => {
                session.meeting_tip_text = Some(text);
            }
            (InspectionStep::MeetingTip, StepInput::Image(image_ref)) => {
                session.meeting_tip_photo_ref = Some(image_ref);
            }
            (InspectionStep::MeetingTip, StepInput::Skip) => {}
            (_, _) => {
                return reject(session, "Здесь ожидается ответ другого типа".to_string());
            }
        }

        session.current_step = session.current_step.next();
        if session.current_step == InspectionStep::Complete {
            return self.finalize(session).await;
        }

        session.updated_at = Utc::now();
        self.sessions
            .insert((operator_id, plan_id), session.clone());
        Ok(PlanOutcome::prompting(session, Vec::new()))
    }

    async fn finalize(&self, session: InspectionSession) -> Result<PlanOutcome, WorkflowError> {
        let contact = session.contact.clone().ok_or(WorkflowError::Store(
            StoreError::Database("inspection contact missing at completion".to_string()),
        ))?;
        let new_inspection = NewInspection {
            advertisement_id: session.advertisement_id,
            inspection_date: session.inspection_date.ok_or(WorkflowError::Store(
                StoreError::Database("inspection date missing at completion".to_string()),
            ))?,
            period_start: session.period_start.ok_or(WorkflowError::Store(
                StoreError::Database("inspection period missing at completion".to_string()),
            ))?,
            period_end: session.period_end.ok_or(WorkflowError::Store(
                StoreError::Database("inspection period missing at completion".to_string()),
            ))?,
            contact_phone: contact.phone,
            contact_status: contact.status,
            contact_name: contact.name,
            meeting_tip_text: session.meeting_tip_text.clone(),
            meeting_tip_photo_ref: session.meeting_tip_photo_ref.clone(),
        };

        // The lifecycle transition decides first; the inspection row exists
        // only for a listing that actually reached assigned. A plan that
        // cannot apply has no session to come back to either.
        self.sessions
            .remove(&(session.operator_id, session.plan_id));

        let advertisement = self
            .store
            .get_advertisement(session.advertisement_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "advertisement",
                key: session.advertisement_id.to_string(),
            })?;
        let mut machine = ListingStateMachine::new(
            advertisement,
            self.store.clone(),
            self.event_publisher.clone(),
        );
        let transition = machine
            .transition(ListingEvent::PlanInspection {
                actor_id: session.operator_id,
            })
            .await?;

        let inspection = self.store.create_inspection(new_inspection).await?;

        info!(
            advertisement_id = session.advertisement_id,
            inspection_id = inspection.id,
            "Inspection planned"
        );

        Ok(PlanOutcome {
            session: None,
            effects: transition.effects,
            completed: Some(inspection),
            abandoned: false,
        })
    }
}

fn parse_period(text: &str) -> Result<(NaiveTime, NaiveTime), validation::ValidationError> {
    let (start, end) = text
        .split_once('-')
        .ok_or(validation::ValidationError::Format)?;
    let start = NaiveTime::parse_from_str(start.trim(), "%H:%M")
        .map_err(|_| validation::ValidationError::Format)?;
    let end = NaiveTime::parse_from_str(end.trim(), "%H:%M")
        .map_err(|_| validation::ValidationError::Format)?;
    if end <= start {
        return Err(validation::ValidationError::Format);
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period() {
        let (start, end) = parse_period("12:00-14:30").unwrap();
        assert_eq!(start, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_period_rejects_inverted() {
        assert!(parse_period("15:00-14:00").is_err());
        assert!(parse_period("noon to two").is_err());
    }
}
