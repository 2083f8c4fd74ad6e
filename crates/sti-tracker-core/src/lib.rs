//! STI Tracker Core Library
//!
//! Local-first personal log of sexually transmitted infection tests.
//!
//! # Architecture
//!
//! ```text
//!                     Preferences page
//!                            │
//!              [preference_settings/preferences.json]
//!                            │
//!          ┌─────────────────┴─────────────────┐
//!          │                                   │
//!          ▼                                   ▼
//!   Register wizard                       History view
//!   1 Date → 2 STIs → 3 Tests             filter → sort
//!   → 4 Details → 5 Complete              manage mode → delete
//!          │                                   │
//!          └──────────────┬────────────────────┘
//!                         ▼
//!            [patient_files/patient_history.csv]
//! ```
//!
//! # Core Principle
//!
//! **Nothing is shown until preferences exist.** A user without tracked STIs
//! is sent to the preferences page on every navigation.
//!
//! # Modules
//!
//! - [`catalog`]: STI, test type, result and tag tables
//! - [`config`]: Data directory and file locations
//! - [`models`]: Domain types (Preferences, RegisterDraft, TestRecord, etc.)
//! - [`store`]: JSON preferences and CSV history persistence
//! - [`wizard`]: Register wizard state machine
//! - [`view`]: History filters and manage mode
//! - [`session`]: Per-user page, banner and draft state
//! - [`tracker`]: Façade tying stores and session together

pub mod catalog;
pub mod config;
pub mod models;
pub mod session;
pub mod store;
pub mod tracker;
pub mod view;
pub mod wizard;

// Re-export commonly used types
pub use config::AppConfig;
pub use models::{
    DisplayRecord, Preferences, PreferencesUpdate, RegisterDraft, TestRecord, WizardStep,
};
pub use session::{Banner, BannerKind, Page, Session};
pub use store::{HistoryLoad, HistoryStore, PreferencesLoad, PreferencesStore, StoreError};
pub use tracker::{PreferencesForm, Tracker};
pub use view::{DateRange, FilterOptions, HistoryFilter, HistoryPage, ManageMode};
pub use wizard::{RegisterWizard, StepView, TestChoice, Transition, WizardError, WizardEvent};
