#![forbid(unsafe_code)]

//! Core domain model and business logic for the coaching backend.
//!
//! This crate provides:
//! - Domain types (workouts, prescription groups, sessions and their records)
//! - Prescription editing and workout duplication
//! - Session instantiation and the session state machine
//! - Weight unit conversion
//! - Authorization of trainers acting for clients
//! - Persistence (repositories, memory and file stores, activity journal, CSV rollup)

pub mod types;
pub mod error;
pub mod units;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod file_store;
pub mod auth;
pub mod workout;
pub mod prescription;
pub mod session;
pub mod tracking;
pub mod journal;
pub mod rollup;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use units::{Weight, WeightUnit};
pub use catalog::{get_default_catalog, Catalog, ExerciseCatalog, RpeCatalog};
pub use config::Config;
pub use store::{MemoryStore, Store};
pub use file_store::FileStore;
pub use auth::{AccessResolver, ClientRoster, TrainerClientDirectory};
pub use workout::WorkoutService;
pub use prescription::{effective_sets, PrescriptionEditor};
pub use session::SessionService;
pub use tracking::SessionTracker;
pub use journal::{ActivityEntry, ActivitySink, JsonlJournal};
