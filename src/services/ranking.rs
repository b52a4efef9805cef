//! Leaderboard built from a ScoreLedger snapshot
//!
//! Ordering: points descending, then visitor id ascending. Positions are
//! sequential from 1 over the sorted list, so tied visitors get distinct
//! consecutive positions rather than a shared rank.

use crate::domain::types::{RankingEntry, ScoreEntry, VisitorId};
use crate::io::directory::VisitorDirectory;
use crate::services::score_ledger::ScoreLedger;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::debug;

/// Sort a score snapshot into ranking order and cut it to `limit`
///
/// Returns (position, visitor_id, points).
pub fn rank(
    mut scores: Vec<(VisitorId, ScoreEntry)>,
    limit: Option<usize>,
) -> Vec<(usize, VisitorId, u64)> {
    scores.sort_unstable_by_key(|&(id, entry)| (Reverse(entry.points), id));
    if let Some(limit) = limit {
        scores.truncate(limit);
    }
    scores
        .into_iter()
        .enumerate()
        .map(|(i, (id, entry))| (i + 1, id, entry.points))
        .collect()
}

pub struct RankingAggregator {
    scores: Arc<ScoreLedger>,
    directory: Arc<dyn VisitorDirectory>,
}

impl RankingAggregator {
    pub fn new(scores: Arc<ScoreLedger>, directory: Arc<dyn VisitorDirectory>) -> Self {
        Self { scores, directory }
    }

    /// Ordered leaderboard from one consistent pass over the score ledger
    pub fn snapshot(&self, limit: Option<usize>) -> Vec<RankingEntry> {
        let ranked = rank(self.scores.snapshot(), limit);

        ranked
            .into_iter()
            .map(|(position, visitor_id, points)| {
                let visitor = self.directory.lookup(visitor_id);
                if visitor.is_none() {
                    debug!(visitor_id = %visitor_id, "ranking_visitor_not_in_directory");
                }
                RankingEntry { position, visitor_id, visitor, points }
            })
            .collect()
    }
}
