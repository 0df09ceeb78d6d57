#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Listing Core
//!
//! Core engine for the intake and review lifecycle of room-for-sale
//! listings gathered from an external marketplace.
//!
//! ## Overview
//!
//! Operators submit a marketplace URL; the draft-collection workflow walks
//! them through an ordered, partially branching sequence of prompts that
//! builds up the House/Flat/Room/Advertisement aggregate, validating each
//! input and enriching the address through an external normalization
//! service. Completed listings are persisted atomically and then driven
//! through a role-gated lifecycle (review, assignment, inspection, outcome)
//! by the listing state machine. A pure calculation engine turns the
//! pricing inputs of a reviewed flat into a per-room profitability report.
//!
//! The crate is transport-agnostic: nothing here renders UI or sends chat
//! messages. Operations return [`events::Effect`] values and publish
//! notification events through [`events::EventPublisher`] for a delivery
//! layer to act on.
//!
//! ## Module Organization
//!
//! - [`models`] - Listing data layer (House, Flat, Room, Advertisement, User, Inspection)
//! - [`validation`] - Pure parsing and predicate functions for operator input
//! - [`clients`] - External collaborators: listing scraper and address enrichment
//! - [`store`] - Persistence boundary with Postgres and in-memory implementations
//! - [`workflow`] - Draft-collection engine and the inspection-planning flow
//! - [`state_machine`] - Listing lifecycle transitions with guards and actions
//! - [`calc`] - Investment calculation engine
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`events`] - Effects and the event publisher
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use listing_core::clients::{AvitoSourceClient, DadataClient};
//! use listing_core::config::ListingCoreConfig;
//! use listing_core::events::EventPublisher;
//! use listing_core::store::{ListingStore, PgListingStore};
//! use listing_core::workflow::{DraftWorkflowEngine, SessionStore, StepInput};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ListingCoreConfig::from_env()?;
//! let store: Arc<dyn ListingStore> = Arc::new(PgListingStore::new(pool));
//! let source = Arc::new(AvitoSourceClient::new(Duration::from_millis(
//!     config.source_timeout_ms,
//! ))?);
//! let enrichment = Arc::new(DadataClient::new(
//!     config.enrichment_token.clone().unwrap_or_default(),
//!     config.enrichment_secret.clone().unwrap_or_default(),
//!     Duration::from_millis(config.enrichment_timeout_ms),
//! )?);
//! let sessions = Arc::new(SessionStore::new(chrono::Duration::minutes(
//!     config.session_ttl_minutes,
//! )));
//!
//! let engine = DraftWorkflowEngine::new(
//!     store,
//!     source,
//!     enrichment,
//!     sessions,
//!     EventPublisher::new(config.event_channel_capacity),
//! );
//! let started = engine.start(42);
//! let session = started.session.unwrap();
//! engine
//!     .handle_input(
//!         42,
//!         session.draft_id,
//!         StepInput::Text("https://www.avito.ru/spb/komnaty/1".into()),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod calc;
pub mod clients;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod state_machine;
pub mod store;
pub mod validation;
pub mod workflow;

pub use config::ListingCoreConfig;
pub use error::{ListingCoreError, Result};
