use super::draft::DraftListing;
use super::session::{DraftSession, EditScope, SessionStore, WorkflowMode};
use super::steps::{next_step, ChoiceInput, DraftStep, StepInput};
use super::WorkflowError;
use crate::clients::address_enrichment::{resolve_flat, resolve_house, AddressEnrichmentClient};
use crate::clients::listing_source::ListingSourceClient;
use crate::events::{Effect, EventPublisher};
use crate::models::{Advertisement, NewHouse, NewRoom, UserRole};
use crate::store::{ListingStore, StoreError};
use crate::validation;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Result of feeding one input into the workflow
#[derive(Debug)]
pub struct StepOutcome {
    /// Session state after the input; `None` when the workflow finished or
    /// was abandoned
    pub session: Option<DraftSession>,
    pub effects: Vec<Effect>,
    /// Set when the workflow completed and the listing was persisted
    pub completed: Option<Advertisement>,
    pub abandoned: bool,
}

impl StepOutcome {
    fn prompting(session: DraftSession, mut effects: Vec<Effect>) -> Self {
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

    fn rejected(session: DraftSession, reason: String) -> Self {
        Self::prompting(session, vec![Effect::RejectInput { reason }])
    }
}

/// What a step handler decided to do with the input
enum StepResult {
    Advance,
    Stay(String),
    Abandon(String),
}

/// Drives draft-collection sessions. One engine instance serves all
/// operators; all per-draft state lives in the session store.
pub struct DraftWorkflowEngine {
    store: Arc<dyn ListingStore>,
    source: Arc<dyn ListingSourceClient>,
    enrichment: Arc<dyn AddressEnrichmentClient>,
    sessions: Arc<SessionStore>,
    event_publisher: EventPublisher,
}

impl DraftWorkflowEngine {
    pub fn new(
        store: Arc<dyn ListingStore>,
        source: Arc<dyn ListingSourceClient>,
        enrichment: Arc<dyn AddressEnrichmentClient>,
        sessions: Arc<SessionStore>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            store,
            source,
            enrichment,
            sessions,
            event_publisher,
        }
    }

    /// Begin collecting a new listing
    pub fn start(&self, operator_id: i64) -> StepOutcome {
        let session = self.sessions.create(
            operator_id,
            WorkflowMode::Create,
            DraftStep::SubmitUrl,
            DraftListing::default(),
        );
        StepOutcome::prompting(session, Vec::new())
    }

    /// Re-enter the workflow against a persisted listing
    pub async fn start_edit(
        &self,
        operator_id: i64,
        advertisement_id: i64,
        scope: EditScope,
    ) -> Result<StepOutcome, WorkflowError> {
        let ad = self
            .store
            .get_advertisement(advertisement_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "advertisement",
                key: advertisement_id.to_string(),
            })?;
        let flat = self
            .store
            .get_flat_by_id(ad.flat_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "flat",
                key: ad.flat_id.to_string(),
            })?;
        let house = self
            .store
            .get_house_by_id(flat.house_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "house",
                key: flat.house_id.to_string(),
            })?;

        let mut draft = DraftListing {
            url: Some(ad.url.clone()),
            room_price: Some(ad.room_price),
            room_area: Some(ad.room_area),
            description: Some(ad.description.clone()),
            house_address: Some(house.address()),
            // The stored house backs the draft so house-level answers
            // (the historical flag) have somewhere to land
            house: Some(NewHouse {
                cadastral_number: house.cadastral_number.clone(),
                street_name: house.street_name.clone(),
                number: house.number.clone(),
                floor_count: house.floor_count,
                is_historical: house.is_historical,
            }),
            ..Default::default()
        };
        draft.flat.cadastral_number = flat.cadastral_number;
        draft.flat.flat_number = flat.flat_number;
        draft.flat.height = flat.height;
        draft.flat.room_count = flat.room_count;
        draft.flat.area = flat.area;
        draft.flat.floor = flat.floor;
        draft.flat.plan_image_ref = flat.plan_image_ref;
        draft.flat.elevator_nearby = flat.elevator_nearby;
        draft.flat.under_room_is_living = flat.under_room_is_living;
        draft.flat.house_entrance_type = flat.house_entrance_type;
        draft.flat.view_types = flat.view_types;
        draft.flat.toilet_type = flat.toilet_type;

        let entry_step = match scope {
            EditScope::Media => DraftStep::PlanImage,
            EditScope::Details => DraftStep::FlatNumber,
        };
        let session = self.sessions.create(
            operator_id,
            WorkflowMode::Edit {
                advertisement_id,
                flat_id: flat.id,
                scope,
            },
            entry_step,
            draft,
        );
        Ok(StepOutcome::prompting(session, Vec::new()))
    }

    /// Feed one operator input into their session
    pub async fn handle_input(
        &self,
        operator_id: i64,
        draft_id: Uuid,
        input: StepInput,
    ) -> Result<StepOutcome, WorkflowError> {
        let mut session = self
            .sessions
            .get(operator_id, draft_id)
            .ok_or(WorkflowError::SessionNotFound { operator_id })?;

        if input == StepInput::Cancel {
            self.sessions.remove(operator_id, draft_id);
            info!(operator_id, step = %session.current_step, "Draft workflow canceled");
            return Ok(StepOutcome {
                session: None,
                effects: Vec::new(),
                completed: None,
                abandoned: true,
            });
        }

        let result = self.apply_step(&mut session, input).await?;
        match result {
            StepResult::Stay(reason) => {
                self.sessions.save(session.clone());
                Ok(StepOutcome::rejected(session, reason))
            }
            StepResult::Abandon(reason) => {
                self.sessions.remove(operator_id, draft_id);
                warn!(operator_id, reason = %reason, "Draft workflow abandoned");
                Ok(StepOutcome {
                    session: None,
                    effects: vec![Effect::RejectInput { reason }],
                    completed: None,
                    abandoned: true,
                })
            }
            StepResult::Advance => {
                self.advance(session).await
            }
        }
    }

    async fn advance(&self, mut session: DraftSession) -> Result<StepOutcome, WorkflowError> {
        let next = next_step(session.current_step, &session.draft, &session.mode);

        // Leaving the floor branch without asking defaults the answer
        if session.current_step == DraftStep::ElevatorNearby
            && next != DraftStep::RoomUnderIsLiving
            && session.draft.flat.under_room_is_living.is_none()
        {
            session.draft.flat.under_room_is_living = Some(true);
        }

        session.current_step = next;
        if next == DraftStep::Complete {
            return self.finalize(session).await;
        }

        self.sessions.save(session.clone());
        Ok(StepOutcome::prompting(session, Vec::new()))
    }

    async fn apply_step(
        &self,
        session: &mut DraftSession,
        input: StepInput,
    ) -> Result<StepResult, WorkflowError> {
        let step = session.current_step;
        if input == StepInput::Skip {
            if !step.is_skippable() {
                return Ok(StepResult::Stay("Этот шаг нельзя пропустить".to_string()));
            }
            if step == DraftStep::RoomsInfo {
                session.draft.rooms = None;
            }
            return Ok(StepResult::Advance);
        }

        match (step, input) {
            (DraftStep::SubmitUrl, StepInput::Text(text)) => {
                self.submit_url(session, text.trim()).await
            }
            (DraftStep::PlanImage, StepInput::Image(image_ref)) => {
                session.draft.flat.plan_image_ref = Some(image_ref);
                Ok(StepResult::Advance)
            }
            (DraftStep::ContactPhone, StepInput::Text(text)) => {
                match validation::parse_contact(&text) {
                    Ok(contact) => {
                        session.draft.contact = Some(contact);
                        Ok(StepResult::Advance)
                    }
                    Err(e) => Ok(StepResult::Stay(e.to_string())),
                }
            }
            (DraftStep::FlatNumber, StepInput::Text(text)) => {
                self.flat_number(session, &text).await
            }
            (DraftStep::CadastralNumber, StepInput::Text(text)) => {
                match validation::parse_cadastral_number(&text) {
                    Ok(cadnum) => {
                        if let Some(reason) = self.flat_duplicate(session, &cadnum).await? {
                            return Ok(StepResult::Stay(reason));
                        }
                        session.draft.flat.cadastral_number = Some(cadnum);
                        Ok(StepResult::Advance)
                    }
                    Err(e) => Ok(StepResult::Stay(e.to_string())),
                }
            }
            (DraftStep::FlatArea, StepInput::Text(text)) => {
                match validation::parse_decimal(&text) {
                    Ok(area) => {
                        session.draft.flat.area = Some(area);
                        Ok(StepResult::Advance)
                    }
                    Err(e) => Ok(StepResult::Stay(e.to_string())),
                }
            }
            (DraftStep::FlatHeight, StepInput::Text(text)) => {
                match validation::parse_decimal(&text) {
                    Ok(height) => {
                        session.draft.flat.height = Some(height);
                        Ok(StepResult::Advance)
                    }
                    Err(e) => Ok(StepResult::Stay(e.to_string())),
                }
            }
            (DraftStep::HouseIsHistorical, StepInput::Choice(ChoiceInput::YesNo(value))) => {
                if let Some(house) = session.draft.house.as_mut() {
                    house.is_historical = Some(value);
                }
                Ok(StepResult::Advance)
            }
            (DraftStep::ElevatorNearby, StepInput::Choice(ChoiceInput::YesNo(value))) => {
                session.draft.flat.elevator_nearby = Some(value);
                Ok(StepResult::Advance)
            }
            (DraftStep::RoomUnderIsLiving, StepInput::Choice(ChoiceInput::YesNo(value))) => {
                session.draft.flat.under_room_is_living = Some(value);
                Ok(StepResult::Advance)
            }
            (DraftStep::EntranceType, StepInput::Choice(ChoiceInput::Entrance(value))) => {
                session.draft.flat.house_entrance_type = Some(value);
                Ok(StepResult::Advance)
            }
            (DraftStep::WindowsType, StepInput::Choice(ChoiceInput::View(value))) => {
                // The later data model keeps windows as a set; the flow
                // appends the one selected value.
                if !session.draft.flat.view_types.contains(&value) {
                    session.draft.flat.view_types.push(value);
                }
                Ok(StepResult::Advance)
            }
            (DraftStep::ToiletType, StepInput::Choice(ChoiceInput::Toilet(value))) => {
                session.draft.flat.toilet_type = Some(value);
                Ok(StepResult::Advance)
            }
            (DraftStep::RoomsInfo, StepInput::Text(text)) => self.rooms_info(session, &text),
            // A wrong kind of input is recoverable like any other bad answer
            (_, _) => Ok(StepResult::Stay(
                "Здесь ожидается ответ другого типа".to_string(),
            )),
        }
    }

    async fn submit_url(
        &self,
        session: &mut DraftSession,
        text: &str,
    ) -> Result<StepResult, WorkflowError> {
        if !validation::is_listing_url(text) {
            return Ok(StepResult::Stay(
                "Ссылка не похожа на объявление о комнате".to_string(),
            ));
        }
        let url = validation::canonicalize_listing_url(text);

        if self.store.get_advertisement_by_url(&url).await?.is_some() {
            return Ok(StepResult::Stay(
                "Объявление с такой ссылкой уже добавлено".to_string(),
            ));
        }

        let scraped = match self.source.fetch(&url).await {
            Ok(scraped) => scraped,
            Err(e) => return Ok(StepResult::Stay(e.to_string())),
        };

        let resolved = match resolve_house(&*self.enrichment, &scraped.address).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(url = %url, error = %e, "Address enrichment failed");
                return Ok(StepResult::Stay(e.to_string()));
            }
        };
        let Some(resolved) = resolved else {
            // Without a house identifier nothing downstream can be keyed
            return Ok(StepResult::Abandon(format!(
                "Не удалось определить дом по адресу «{}»",
                scraped.address
            )));
        };
        let Some(house_cadastral_number) = resolved.house_cadastral_number.clone() else {
            return Ok(StepResult::Abandon(format!(
                "Не удалось определить дом по адресу «{}»",
                scraped.address
            )));
        };

        let street_name = match (&resolved.street_type, &resolved.street) {
            (Some(street_type), Some(street)) => format!("{street_type} {street}"),
            (None, Some(street)) => street.clone(),
            _ => scraped.address.clone(),
        };
        session.draft.house = Some(NewHouse {
            cadastral_number: house_cadastral_number,
            street_name,
            number: resolved.house.clone().unwrap_or_default(),
            floor_count: scraped.floor_count,
            is_historical: None,
        });
        session.draft.house_address = Some(scraped.address.clone());
        session.draft.url = Some(url);
        session.draft.room_price = Some(scraped.price);
        session.draft.room_area = Some(scraped.room_area);
        session.draft.description = Some(scraped.description);
        session.draft.flat.room_count = Some(scraped.room_count);
        session.draft.flat.floor = Some(scraped.floor);

        Ok(StepResult::Advance)
    }

    async fn flat_number(
        &self,
        session: &mut DraftSession,
        text: &str,
    ) -> Result<StepResult, WorkflowError> {
        let number = match validation::parse_flat_number(text) {
            Ok(number) => number,
            Err(e) => return Ok(StepResult::Stay(e.to_string())),
        };

        let house_address = session.draft.house_address.clone().unwrap_or_default();
        let resolved = match resolve_flat(&*self.enrichment, &house_address, &number).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(flat_number = %number, error = %e, "Flat enrichment failed");
                None
            }
        };

        session.draft.flat.flat_number = Some(number);
        if let Some(resolved) = resolved {
            if let Some(cadnum) = resolved.flat_cadastral_number {
                if let Some(reason) = self.flat_duplicate(session, &cadnum).await? {
                    session.draft.flat.flat_number = None;
                    return Ok(StepResult::Stay(reason));
                }
                session.draft.flat.cadastral_number = Some(cadnum);
                if session.draft.flat.area.is_none() {
                    session.draft.flat.area = resolved.flat_area;
                }
            }
        }

        Ok(StepResult::Advance)
    }

    /// Pre-check for an existing flat with the same cadastral number. In
    /// edit mode the listing's own flat does not count.
    async fn flat_duplicate(
        &self,
        session: &DraftSession,
        cadastral_number: &str,
    ) -> Result<Option<String>, WorkflowError> {
        let existing = self.store.get_flat(cadastral_number).await?;
        let own_flat_id = match session.mode {
            WorkflowMode::Edit { flat_id, .. } => Some(flat_id),
            WorkflowMode::Create => None,
        };
        Ok(existing
            .filter(|flat| Some(flat.id) != own_flat_id)
            .map(|_| "Квартира с таким кадастровым номером уже есть".to_string()))
    }

    fn rooms_info(
        &self,
        session: &mut DraftSession,
        text: &str,
    ) -> Result<StepResult, WorkflowError> {
        let parsed = match validation::parse_rooms_info(text) {
            Ok(parsed) => parsed,
            Err(e) => return Ok(StepResult::Stay(e.to_string())),
        };
        if let Some(expected) = session.draft.flat.room_count {
            if parsed.len() != expected as usize {
                return Ok(StepResult::Stay(
                    validation::ValidationError::RoomCountMismatch {
                        expected: expected as usize,
                        actual: parsed.len(),
                    }
                    .to_string(),
                ));
            }
        }
        session.draft.rooms = Some(
            parsed
                .into_iter()
                .map(|info| {
                    NewRoom::with_defaults(info.number_on_plan, info.area, info.status, info.comment)
                })
                .collect(),
        );
        Ok(StepResult::Advance)
    }

    async fn finalize(&self, session: DraftSession) -> Result<StepOutcome, WorkflowError> {
        match session.mode {
            WorkflowMode::Create => self.finalize_create(session).await,
            WorkflowMode::Edit {
                advertisement_id,
                flat_id,
                scope,
            } => {
                self.finalize_edit(session, advertisement_id, flat_id, scope)
                    .await
            }
        }
    }

    async fn finalize_create(&self, session: DraftSession) -> Result<StepOutcome, WorkflowError> {
        let operator_id = session.operator_id;
        let draft_id = session.draft_id;
        let Some(bundle) = session.draft.clone().into_bundle(operator_id) else {
            error!(operator_id, "Draft reached completion with missing fields");
            self.sessions.remove(operator_id, draft_id);
            return Err(WorkflowError::Store(StoreError::Database(
                "draft incomplete at completion".to_string(),
            )));
        };

        let advertisement = match self.store.create_listing(bundle).await {
            Ok(ad) => ad,
            Err(e @ (StoreError::DuplicateListing | StoreError::DuplicateFlat)) => {
                // The constraint is the authoritative duplicate signal; the
                // operator may adjust the input or abandon.
                let mut session = session;
                session.current_step = DraftStep::RoomsInfo;
                self.sessions.save(session.clone());
                return Ok(StepOutcome::rejected(session, e.to_string()));
            }
            Err(e) => {
                error!(operator_id, draft = ?session.draft, error = %e, "Listing creation failed");
                self.sessions.remove(operator_id, draft_id);
                return Err(e.into());
            }
        };

        self.sessions.remove(operator_id, draft_id);
        self.event_publisher
            .publish(
                "listing.created",
                json!({
                    "advertisement_id": advertisement.id,
                    "url": advertisement.url,
                    "added_by": operator_id,
                }),
            )
            .await
            .ok();

        let mut effects = Vec::new();
        for admin in self.store.list_by_role(UserRole::Admin).await? {
            effects.push(Effect::NotifyParty {
                user_id: admin.id,
                advertisement_id: advertisement.id,
                message: format!("Новое объявление: {}", advertisement.url),
            });
        }

        info!(
            operator_id,
            advertisement_id = advertisement.id,
            "Draft workflow completed"
        );
        Ok(StepOutcome {
            session: None,
            effects,
            completed: Some(advertisement),
            abandoned: false,
        })
    }

    async fn finalize_edit(
        &self,
        session: DraftSession,
        advertisement_id: i64,
        flat_id: i64,
        scope: EditScope,
    ) -> Result<StepOutcome, WorkflowError> {
        let operator_id = session.operator_id;
        let flat = self
            .store
            .update_flat(flat_id, session.draft.flat.clone())
            .await?;

        if let Some(value) = session.draft.house.as_ref().and_then(|h| h.is_historical) {
            self.store.set_house_historical(flat.house_id, value).await?;
        }

        match scope {
            EditScope::Media => {
                if let Some(contact) = &session.draft.contact {
                    self.store
                        .update_contact(
                            advertisement_id,
                            &contact.phone,
                            &contact.status,
                            &contact.name,
                        )
                        .await?;
                }
            }
            EditScope::Details => {
                if let Some(rooms) = session.draft.rooms.clone() {
                    self.store.replace_rooms(flat_id, rooms).await?;
                }
            }
        }

        self.sessions.remove(operator_id, session.draft_id);
        let advertisement = self.store.get_advertisement(advertisement_id).await?;

        info!(operator_id, advertisement_id, "Listing edit completed");
        Ok(StepOutcome {
            session: None,
            effects: Vec::new(),
            completed: advertisement,
            abandoned: false,
        })
    }
}
