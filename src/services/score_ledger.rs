//! Per-visitor point accumulator
//!
//! Each visitor's entry has its own small mutex so that increments for
//! different visitors never contend and (points, timestamp) always change
//! together. The outer map is read-locked on the increment path and only
//! write-locked the first time a visitor scores.
//!
//! Totals are monotonically non-decreasing; there is no decrement.

use crate::domain::error::{AdmissionError, AdmissionResult};
use crate::domain::types::{ScoreEntry, VisitorId};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

type ScoreCell = Arc<Mutex<ScoreEntry>>;

pub struct ScoreLedger {
    scores: RwLock<FxHashMap<VisitorId, ScoreCell>>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self { scores: RwLock::new(FxHashMap::default()) }
    }

    /// Add points to a visitor's running total, creating the entry on first use
    ///
    /// Negative points are rejected. Returns the new total.
    pub fn increment(&self, visitor_id: VisitorId, points: i64) -> AdmissionResult<u64> {
        let points = u64::try_from(points)
            .map_err(|_| AdmissionError::NegativePoints { visitor_id, points })?;
        let now_ms = Utc::now().timestamp_millis();

        let existing = self.scores.read().get(&visitor_id).cloned();
        let cell = match existing {
            Some(cell) => cell,
            None => self
                .scores
                .write()
                .entry(visitor_id)
                .or_insert_with(|| Arc::new(Mutex::new(ScoreEntry { points: 0, updated_at_ms: now_ms })))
                .clone(),
        };

        let mut entry = cell.lock();
        entry.points = entry
            .points
            .checked_add(points)
            .ok_or(AdmissionError::PointsOverflow { visitor_id })?;
        entry.updated_at_ms = now_ms;
        let total = entry.points;
        drop(entry);

        debug!(visitor_id = %visitor_id, points = %points, total = %total, "points_added");
        Ok(total)
    }

    /// Current entry for one visitor, if they have ever scored
    pub fn get(&self, visitor_id: VisitorId) -> Option<ScoreEntry> {
        let cell = self.scores.read().get(&visitor_id).cloned()?;
        let entry = *cell.lock();
        Some(entry)
    }

    /// Copy every entry
    ///
    /// The map read lock is held for the whole pass, which blocks only the
    /// first-score path for new visitors; increments on existing entries
    /// proceed between the per-entry copies. Each copied entry is a whole
    /// (points, timestamp) pair, never a partial update.
    pub fn snapshot(&self) -> Vec<(VisitorId, ScoreEntry)> {
        let scores = self.scores.read();
        scores.iter().map(|(&id, cell)| (id, *cell.lock())).collect()
    }

    pub fn len(&self) -> usize {
        self.scores.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.read().is_empty()
    }
}

impl Default for ScoreLedger {
    fn default() -> Self {
        Self::new()
    }
}
