//! Capacity status classification
//!
//! Pure mapping from (occupancy, max_capacity, incident flag) to a status band.
//! Callers always recompute from the authoritative counters; the result is
//! never cached.

use crate::domain::types::CapacityStatus;

/// Lower bound (percent, inclusive) of the NEARLY_FULL band
pub const NEARLY_FULL_PCT: u64 = 90;
/// Lower bound (percent, inclusive) of the HIGH band
pub const HIGH_PCT: u64 = 70;
/// Lower bound (percent, inclusive) of the MEDIUM band
pub const MEDIUM_PCT: u64 = 40;

/// Classify an attraction's occupancy
///
/// Precedence: incident, then full, then ratio bands. Ratios are compared in
/// integer arithmetic so that exact boundaries (e.g. 90/100) land in the
/// upper band.
#[inline]
pub fn classify(occupancy: u32, max_capacity: u32, incident_open: bool) -> CapacityStatus {
    if incident_open {
        return CapacityStatus::ClosedIncident;
    }
    if occupancy >= max_capacity {
        return CapacityStatus::Full;
    }

    let scaled = u64::from(occupancy) * 100;
    let max = u64::from(max_capacity);
    if scaled >= NEARLY_FULL_PCT * max {
        CapacityStatus::NearlyFull
    } else if scaled >= HIGH_PCT * max {
        CapacityStatus::High
    } else if scaled >= MEDIUM_PCT * max {
        CapacityStatus::Medium
    } else {
        CapacityStatus::Available
    }
}
