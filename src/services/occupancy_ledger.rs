//! Per-attraction occupancy ledger
//!
//! Authoritative counter of admitted visitors for each attraction. Each
//! attraction's state sits behind its own mutex so that admissions at
//! different attractions never serialize against each other. The outer map
//! is only write-locked when the attraction set itself changes (config
//! refresh); request paths take the read lock just long enough to clone the
//! attraction's `Arc`.
//!
//! Key behaviors:
//! - `try_admit` increments only while occupancy < max_capacity
//! - `release` clamps at zero, a release on an empty attraction is a no-op
//! - refresh keeps occupancy and incident flag, only capacity/name change

use crate::domain::error::{AdmissionError, AdmissionResult};
use crate::domain::types::{AttractionId, AttractionState};
use crate::infra::config::{validate_attractions, AttractionConfig};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::info;

type AttractionCell = Arc<Mutex<AttractionState>>;

/// Reserve one slot. Returns false without side effects when full.
#[inline]
pub(crate) fn admit_one(state: &mut AttractionState) -> bool {
    if state.occupancy >= state.max_capacity {
        return false;
    }
    state.occupancy += 1;
    debug_assert!(state.occupancy <= state.max_capacity, "occupancy above ceiling");
    true
}

/// Release one slot. Returns false (no-op) when already empty.
#[inline]
pub(crate) fn release_one(state: &mut AttractionState) -> bool {
    if state.occupancy == 0 {
        return false;
    }
    state.occupancy -= 1;
    true
}

/// Counts of attractions touched by a configuration refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub added: usize,
    pub updated: usize,
}

pub struct OccupancyLedger {
    attractions: RwLock<FxHashMap<AttractionId, AttractionCell>>,
}

impl OccupancyLedger {
    pub fn new() -> Self {
        Self { attractions: RwLock::new(FxHashMap::default()) }
    }

    /// Build a ledger from the startup attraction list
    pub fn from_configs(configs: &[AttractionConfig]) -> AdmissionResult<Self> {
        let ledger = Self::new();
        ledger.configure(configs)?;
        Ok(ledger)
    }

    /// Apply an attraction list (startup or refresh)
    ///
    /// The whole list is validated before anything is applied. New attractions
    /// start empty; existing ones keep occupancy and incident flag. Attractions
    /// missing from the list are left in place.
    pub fn configure(&self, configs: &[AttractionConfig]) -> AdmissionResult<RefreshSummary> {
        validate_attractions(configs)?;

        let mut summary = RefreshSummary::default();
        let mut attractions = self.attractions.write();
        for cfg in configs {
            match attractions.get(&cfg.id) {
                Some(cell) => {
                    let mut state = cell.lock();
                    if state.max_capacity != cfg.max_capacity || state.name != cfg.name {
                        info!(
                            attraction_id = %cfg.id,
                            old_max_capacity = %state.max_capacity,
                            new_max_capacity = %cfg.max_capacity,
                            occupancy = %state.occupancy,
                            "attraction_capacity_updated"
                        );
                        state.max_capacity = cfg.max_capacity;
                        state.name.clone_from(&cfg.name);
                        summary.updated += 1;
                    }
                }
                None => {
                    let state = AttractionState::new(cfg.id, cfg.name.clone(), cfg.max_capacity);
                    attractions.insert(cfg.id, Arc::new(Mutex::new(state)));
                    info!(
                        attraction_id = %cfg.id,
                        name = %cfg.name,
                        max_capacity = %cfg.max_capacity,
                        "attraction_added"
                    );
                    summary.added += 1;
                }
            }
        }
        Ok(summary)
    }

    fn cell(&self, attraction_id: AttractionId) -> AdmissionResult<AttractionCell> {
        self.attractions
            .read()
            .get(&attraction_id)
            .cloned()
            .ok_or(AdmissionError::UnknownAttraction { attraction_id })
    }

    /// Run `f` inside the attraction's critical section
    ///
    /// Everything that reads or writes occupancy or the incident flag goes
    /// through here, which is what makes per-attraction operations
    /// linearizable.
    pub(crate) fn with_attraction<R>(
        &self,
        attraction_id: AttractionId,
        f: impl FnOnce(&mut AttractionState) -> R,
    ) -> AdmissionResult<R> {
        let cell = self.cell(attraction_id)?;
        let mut state = cell.lock();
        Ok(f(&mut *state))
    }

    /// Reserve one slot if below capacity
    ///
    /// Capacity-full is reported as `Ok(false)`, not an error.
    pub fn try_admit(&self, attraction_id: AttractionId) -> AdmissionResult<bool> {
        self.with_attraction(attraction_id, admit_one)
    }

    /// Release one slot, clamped at zero
    ///
    /// Returns whether occupancy actually changed.
    pub fn release(&self, attraction_id: AttractionId) -> AdmissionResult<bool> {
        self.with_attraction(attraction_id, release_one)
    }

    /// Consistent copy of the attraction's state
    pub fn snapshot(&self, attraction_id: AttractionId) -> AdmissionResult<AttractionState> {
        self.with_attraction(attraction_id, |state| state.clone())
    }

    /// Current occupancy
    pub fn occupancy(&self, attraction_id: AttractionId) -> AdmissionResult<u32> {
        self.with_attraction(attraction_id, |state| state.occupancy)
    }

    pub fn contains(&self, attraction_id: AttractionId) -> bool {
        self.attractions.read().contains_key(&attraction_id)
    }

    /// All configured attraction IDs, ascending
    pub fn attraction_ids(&self) -> Vec<AttractionId> {
        let mut ids: Vec<AttractionId> = self.attractions.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.attractions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attractions.read().is_empty()
    }
}

impl Default for OccupancyLedger {
    fn default() -> Self {
        Self::new()
    }
}
