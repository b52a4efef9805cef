//! Domain models - core admission and scoring types
//!
//! This module contains the canonical data types used throughout the system:
//! - `AttractionState` - authoritative occupancy and incident flag
//! - `CapacityStatus` - derived status band
//! - `CheckInOutcome` / `CheckOutOutcome` - structured admission results
//! - `RankingEntry` - leaderboard row
//! - `AdmissionError` - invalid-input taxonomy

pub mod error;
pub mod types;

// Re-export commonly used types at module level
pub use error::{AdmissionError, AdmissionResult};
pub use types::{
    AttractionId, AttractionState, AttractionStatus, CapacityStatus, CheckInOutcome,
    CheckOutOutcome, RankingEntry, ScoreEntry, VisitorId, VisitorProjection,
};
