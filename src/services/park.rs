//! Park facade - the operations exposed to the API layer
//!
//! Wires the admission controller, score ledger and ranking aggregator
//! together with the visitor directory. Everything is owned here and built
//! once from configuration; nothing is held in globals.

use crate::domain::error::{AdmissionError, AdmissionResult};
use crate::domain::types::{
    AttractionId, AttractionStatus, CheckInOutcome, CheckOutOutcome, RankingEntry, VisitorId,
};
use crate::infra::config::{AttractionConfig, Config};
use crate::infra::metrics::Metrics;
use crate::io::directory::VisitorDirectory;
use crate::services::admission_controller::AdmissionController;
use crate::services::occupancy_ledger::{OccupancyLedger, RefreshSummary};
use crate::services::ranking::RankingAggregator;
use crate::services::score_ledger::ScoreLedger;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Park {
    controller: AdmissionController,
    scores: Arc<ScoreLedger>,
    ranking: RankingAggregator,
    directory: Arc<dyn VisitorDirectory>,
    metrics: Arc<Metrics>,
    ranking_default_limit: Option<usize>,
}

impl Park {
    /// Build the park from its startup configuration
    pub fn new(
        config: &Config,
        directory: Arc<dyn VisitorDirectory>,
        metrics: Arc<Metrics>,
    ) -> AdmissionResult<Self> {
        let ledger = Arc::new(OccupancyLedger::from_configs(config.attractions())?);
        let scores = Arc::new(ScoreLedger::new());

        info!(
            attractions = %ledger.len(),
            ranking_default_limit = ?config.ranking_default_limit(),
            "park_initialized"
        );

        Ok(Self {
            controller: AdmissionController::new(ledger, metrics.clone()),
            ranking: RankingAggregator::new(scores.clone(), directory.clone()),
            scores,
            directory,
            metrics,
            ranking_default_limit: config.ranking_default_limit(),
        })
    }

    fn require_visitor(&self, visitor_id: VisitorId) -> AdmissionResult<()> {
        if self.directory.contains(visitor_id) {
            Ok(())
        } else {
            self.metrics.record_invalid_request();
            Err(AdmissionError::UnknownVisitor { visitor_id })
        }
    }

    pub fn check_in(
        &self,
        attraction_id: AttractionId,
        visitor_id: VisitorId,
    ) -> AdmissionResult<CheckInOutcome> {
        self.require_visitor(visitor_id)?;
        self.controller.check_in(attraction_id, visitor_id)
    }

    /// Release a slot
    ///
    /// Not checked against the directory: release is count-based, and a
    /// visitor dropped by a reload must still be able to leave.
    pub fn check_out(
        &self,
        attraction_id: AttractionId,
        visitor_id: VisitorId,
    ) -> AdmissionResult<CheckOutOutcome> {
        self.controller.check_out(attraction_id, visitor_id)
    }

    pub fn declare_incident(&self, attraction_id: AttractionId) -> AdmissionResult<()> {
        self.controller.declare_incident(attraction_id)
    }

    pub fn resolve_incident(&self, attraction_id: AttractionId) -> AdmissionResult<()> {
        self.controller.resolve_incident(attraction_id)
    }

    pub fn get_status(&self, attraction_id: AttractionId) -> AdmissionResult<AttractionStatus> {
        self.controller.get_status(attraction_id)
    }

    /// Status of every attraction, ascending by id
    pub fn statuses(&self) -> Vec<AttractionStatus> {
        self.controller.statuses()
    }

    pub fn open_incidents(&self) -> Vec<AttractionId> {
        self.controller.open_incidents()
    }

    /// Add points to a visitor; returns the new total
    pub fn add_points(&self, visitor_id: VisitorId, points: i64) -> AdmissionResult<u64> {
        self.require_visitor(visitor_id)?;
        match self.scores.increment(visitor_id, points) {
            Ok(total) => {
                self.metrics.record_points(points.unsigned_abs());
                Ok(total)
            }
            Err(e) => {
                self.metrics.record_invalid_request();
                Err(e)
            }
        }
    }

    /// Leaderboard; `None` falls back to the configured default limit
    pub fn get_ranking(&self, limit: Option<usize>) -> Vec<RankingEntry> {
        self.metrics.record_ranking_snapshot();
        self.ranking.snapshot(limit.or(self.ranking_default_limit))
    }

    /// Apply a refreshed attraction list
    pub fn apply_attractions(&self, attractions: &[AttractionConfig]) -> AdmissionResult<RefreshSummary> {
        match self.controller.ledger().configure(attractions) {
            Ok(summary) => {
                info!(added = %summary.added, updated = %summary.updated, "attractions_refreshed");
                Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, "attractions_refresh_rejected");
                Err(e)
            }
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn scores(&self) -> &Arc<ScoreLedger> {
        &self.scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CapacityStatus;
    use crate::infra::config::VisitorConfig;
    use crate::io::directory::StaticDirectory;

    fn visitor(id: u64, name: &str) -> VisitorConfig {
        VisitorConfig {
            id: VisitorId(id),
            name: name.to_string(),
            surname: "Guest".to_string(),
            email: format!("{id}@park.test"),
        }
    }

    fn create_park() -> Park {
        let config = Config::default()
            .with_attractions(vec![AttractionConfig {
                id: AttractionId(1),
                name: "Coaster".to_string(),
                max_capacity: 2,
            }])
            .with_visitors(vec![visitor(1, "Ada"), visitor(2, "Bo"), visitor(3, "Cy")]);
        let directory = Arc::new(StaticDirectory::from_configs(config.visitors()));
        Park::new(&config, directory, Arc::new(Metrics::new())).unwrap()
    }

    #[test]
    fn test_unknown_visitor_rejected() {
        let park = create_park();

        let err = park.check_in(AttractionId(1), VisitorId(99)).unwrap_err();
        assert_eq!(err, AdmissionError::UnknownVisitor { visitor_id: VisitorId(99) });
        assert_eq!(park.get_status(AttractionId(1)).unwrap().occupancy, 0);

        assert!(park.add_points(VisitorId(99), 5).is_err());
        assert!(park.get_ranking(None).is_empty());
    }

    #[test]
    fn test_full_cycle() {
        let park = create_park();

        assert!(park.check_in(AttractionId(1), VisitorId(1)).unwrap().admitted);
        assert!(park.check_in(AttractionId(1), VisitorId(2)).unwrap().admitted);
        let outcome = park.check_in(AttractionId(1), VisitorId(3)).unwrap();
        assert!(!outcome.admitted);
        assert_eq!(outcome.status, CapacityStatus::Full);

        let outcome = park.check_out(AttractionId(1), VisitorId(1)).unwrap();
        assert_eq!(outcome.status, CapacityStatus::Medium);
        assert!(park.check_in(AttractionId(1), VisitorId(3)).unwrap().admitted);
    }

    #[test]
    fn test_points_and_ranking() {
        let park = create_park();

        park.add_points(VisitorId(1), 10).unwrap();
        assert_eq!(park.add_points(VisitorId(1), 5).unwrap(), 15);
        park.add_points(VisitorId(3), 15).unwrap();
        park.add_points(VisitorId(2), 7).unwrap();

        let ranking = park.get_ranking(None);
        let order: Vec<(usize, VisitorId)> =
            ranking.iter().map(|e| (e.position, e.visitor_id)).collect();
        assert_eq!(order, vec![(1, VisitorId(1)), (2, VisitorId(3)), (3, VisitorId(2))]);
        assert_eq!(ranking[0].visitor.as_ref().unwrap().name, "Ada");

        assert_eq!(park.get_ranking(Some(1)).len(), 1);
    }

    #[test]
    fn test_check_out_after_directory_reload() {
        let directory = Arc::new(StaticDirectory::from_configs(&[visitor(1, "Ada")]));
        let config = Config::default()
            .with_attractions(vec![AttractionConfig {
                id: AttractionId(1),
                name: "Coaster".to_string(),
                max_capacity: 1,
            }])
            .with_visitors(vec![visitor(1, "Ada")]);
        let park = Park::new(&config, directory.clone(), Arc::new(Metrics::new())).unwrap();

        assert!(park.check_in(AttractionId(1), VisitorId(1)).unwrap().admitted);
        directory.replace(&[visitor(2, "Bo")]);

        let outcome = park.check_out(AttractionId(1), VisitorId(1)).unwrap();
        assert_eq!(outcome.status, CapacityStatus::Available);
        assert_eq!(park.get_status(AttractionId(1)).unwrap().occupancy, 0);
        assert!(park.check_in(AttractionId(1), VisitorId(2)).unwrap().admitted);
        // Check-in still requires a known visitor
        assert!(park.check_in(AttractionId(1), VisitorId(1)).is_err());
    }

    #[test]
    fn test_open_incidents_listed() {
        let park = create_park();
        assert!(park.open_incidents().is_empty());
        park.declare_incident(AttractionId(1)).unwrap();
        assert_eq!(park.open_incidents(), vec![AttractionId(1)]);
        park.resolve_incident(AttractionId(1)).unwrap();
        assert!(park.open_incidents().is_empty());
    }

    #[test]
    fn test_negative_points_rejected() {
        let park = create_park();
        let err = park.add_points(VisitorId(1), -1).unwrap_err();
        assert_eq!(err, AdmissionError::NegativePoints { visitor_id: VisitorId(1), points: -1 });
    }

    #[test]
    fn test_default_ranking_limit() {
        let config = Config::default()
            .with_visitors(vec![visitor(1, "Ada"), visitor(2, "Bo")])
            .with_ranking_default_limit(Some(1));
        let directory = Arc::new(StaticDirectory::from_configs(config.visitors()));
        let park = Park::new(&config, directory, Arc::new(Metrics::new())).unwrap();

        park.add_points(VisitorId(1), 1).unwrap();
        park.add_points(VisitorId(2), 2).unwrap();

        assert_eq!(park.get_ranking(None).len(), 1);
        assert_eq!(park.get_ranking(Some(5)).len(), 2);
    }

    #[test]
    fn test_apply_attractions() {
        let park = create_park();
        park.check_in(AttractionId(1), VisitorId(1)).unwrap();

        let summary = park
            .apply_attractions(&[
                AttractionConfig { id: AttractionId(1), name: "Coaster".to_string(), max_capacity: 4 },
                AttractionConfig { id: AttractionId(2), name: "Swings".to_string(), max_capacity: 8 },
            ])
            .unwrap();
        assert_eq!(summary, RefreshSummary { added: 1, updated: 1 });

        let status = park.get_status(AttractionId(1)).unwrap();
        assert_eq!(status.occupancy, 1);
        assert_eq!(status.max_capacity, 4);
        assert_eq!(park.statuses().len(), 2);
    }

    #[test]
    fn test_invalid_startup_config() {
        let config = Config::default().with_attractions(vec![AttractionConfig {
            id: AttractionId(1),
            name: "Broken".to_string(),
            max_capacity: 0,
        }]);
        let directory = Arc::new(StaticDirectory::new());
        assert!(Park::new(&config, directory, Arc::new(Metrics::new())).is_err());
    }
}
