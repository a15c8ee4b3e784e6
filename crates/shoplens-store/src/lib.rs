//! Persistence and access rules for ShopLens.
//!
//! This crate provides:
//! - A [`Database`] abstraction over the hosted tables (`users`,
//!   `user_settings`, `analysis_history`) with in-memory and Supabase backends
//! - The [`TrialGate`] that decides whether a user is inside the free trial
//! - The [`SettingsStore`] for encrypted per-user credentials
//! - The [`HistoryStore`] for saved analysis summaries

pub mod analysis;
pub mod db;
pub mod error;
pub mod history;
pub mod model;
pub mod settings;
pub mod trial;

pub use db::{Database, MemoryDatabase, SupabaseDatabase, TimeoutDatabase};
pub use error::StoreError;
pub use history::{HistoryStore, SaveHistoryRequest};
pub use model::{AnalysisHistoryItem, CredentialKind, DiagnosticScores};
pub use settings::{MaskedSettings, SettingsStore, UserSettings, WriteOutcome};
pub use trial::{DegradedReason, TrialGate, TrialInfo, TrialOutcome};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
