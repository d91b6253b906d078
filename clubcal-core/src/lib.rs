//! Core types for clubcal.
//!
//! This crate provides everything the club calendar needs apart from the
//! views and a concrete backend:
//! - `Event`, `FileAssociation` and their stored record shapes
//! - `store` ports implemented by backends, plus an in-memory backend
//! - `Planner`, which owns the signed-in user's events and services intents
//! - form, month and upload state used by the views

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod file;
pub mod form;
pub mod logging;
pub mod memory;
pub mod month;
pub mod outcome;
pub mod planner;
pub mod session;
pub mod store;
pub mod upload;

pub use config::{BackendConfig, ClubCalConfig, DeletePolicy, ReportPolicy};
pub use error::{ClubCalError, ClubCalResult};
pub use event::{Event, EventFields, EventId, EventRecord, OwnerId};
pub use file::{BlobPath, FileAssociation, FileId, FileRecord, LocalFile};
pub use form::{EventForm, FormMode};
pub use month::CalendarMonth;
pub use outcome::{Notice, Outcome};
pub use planner::Planner;
pub use session::{Credentials, IdentityProvider, Session, SessionChannel, SessionWatcher};
pub use upload::ReportUpload;
