//! Shared types for the admission core

use serde::{Deserialize, Serialize};

/// Newtype wrapper for attraction IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct AttractionId(pub u32);

impl std::fmt::Display for AttractionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for visitor IDs
///
/// The derived `Ord` is the ranking tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct VisitorId(pub u64);

impl std::fmt::Display for VisitorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derived capacity band for an attraction. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapacityStatus {
    Available,
    Medium,
    High,
    NearlyFull,
    Full,
    ClosedIncident,
}

impl CapacityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityStatus::Available => "available",
            CapacityStatus::Medium => "medium",
            CapacityStatus::High => "high",
            CapacityStatus::NearlyFull => "nearly_full",
            CapacityStatus::Full => "full",
            CapacityStatus::ClosedIncident => "closed_incident",
        }
    }

    /// Numeric code for the Prometheus status gauge
    pub fn code(&self) -> u64 {
        match self {
            CapacityStatus::Available => 0,
            CapacityStatus::Medium => 1,
            CapacityStatus::High => 2,
            CapacityStatus::NearlyFull => 3,
            CapacityStatus::Full => 4,
            CapacityStatus::ClosedIncident => 5,
        }
    }
}

impl std::fmt::Display for CapacityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative per-attraction state, guarded by one lock per attraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttractionState {
    pub id: AttractionId,
    pub name: String,
    pub max_capacity: u32,
    pub occupancy: u32,
    pub has_incident: bool,
}

impl AttractionState {
    #[inline]
    pub fn new(id: AttractionId, name: impl Into<String>, max_capacity: u32) -> Self {
        Self { id, name: name.into(), max_capacity, occupancy: 0, has_incident: false }
    }
}

/// Result of a check-in. Rejection is an expected outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckInOutcome {
    pub admitted: bool,
    pub status: CapacityStatus,
}

/// Result of a check-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckOutOutcome {
    pub status: CapacityStatus,
}

/// Point-in-time view returned by `getStatus`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttractionStatus {
    pub attraction_id: AttractionId,
    pub name: String,
    pub occupancy: u32,
    pub max_capacity: u32,
    pub status: CapacityStatus,
}

/// Identity fields resolved from the external user directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorProjection {
    pub name: String,
    pub surname: String,
    pub email: String,
}

/// Cumulative score for one visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEntry {
    pub points: u64,
    /// Epoch milliseconds of the last increment
    pub updated_at_ms: i64,
}

/// One row of the leaderboard, derived at read time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    /// 1-based, distinct for tied visitors
    pub position: usize,
    pub visitor_id: VisitorId,
    /// `None` when the directory no longer knows the visitor
    pub visitor: Option<VisitorProjection>,
    pub points: u64,
}
