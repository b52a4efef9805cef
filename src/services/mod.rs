//! Services - admission and scoring logic
//!
//! This module contains the core business logic services:
//! - `capacity_policy` - Pure status classification
//! - `occupancy_ledger` - Per-attraction occupancy counters
//! - `incident_registry` - Incident flags gating admissions
//! - `admission_controller` - Linearizable check-in / check-out
//! - `score_ledger` - Per-visitor point totals
//! - `ranking` - Leaderboard snapshots
//! - `park` - Facade exposing every operation to the API layer

pub mod admission_controller;
pub mod capacity_policy;
pub mod incident_registry;
pub mod occupancy_ledger;
pub mod park;
pub mod ranking;
pub mod score_ledger;

// Re-export commonly used types
pub use admission_controller::AdmissionController;
pub use capacity_policy::classify;
pub use incident_registry::IncidentRegistry;
pub use occupancy_ledger::{OccupancyLedger, RefreshSummary};
pub use park::Park;
pub use ranking::RankingAggregator;
pub use score_ledger::ScoreLedger;
