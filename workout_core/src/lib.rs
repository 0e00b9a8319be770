#![forbid(unsafe_code)]

//! Core domain model and session engine for the workout tools.
//!
//! This crate provides:
//! - Domain types (exercises, sequence items, session state)
//! - Catalog management
//! - Pattern expansion and sequence assembly
//! - Exercise substitution scoring
//! - The session timer state machine and its tick sources
//! - Session persistence

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod pattern;
pub mod substitution;
pub mod sequence;
pub mod engine;
pub mod scheduler;
pub mod store;
pub mod timer;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use pattern::{Pattern, PatternSettings};
pub use substitution::{find_alternatives, find_similar, suggest_substitution, Alternative, Preferences, SubstitutionReason, Suggestion};
pub use sequence::SequenceBuilder;
pub use engine::{generate_session, WorkoutRequest};
pub use scheduler::{IntervalTicks, ManualTicks, TickId, TickSource};
pub use store::{FileStore, MemoryStore, SessionStore, Store, SESSION_KEY};
pub use timer::{format_mm_ss, Outcome, SessionTimer, Status, TimerView, TimingPreset, Transition};
