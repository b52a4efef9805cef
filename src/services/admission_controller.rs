//! Check-in / check-out orchestration
//!
//! Every decision for an attraction runs inside that attraction's critical
//! section: incident gate, capacity check, increment and status
//! classification happen under one lock acquisition. Two concurrent
//! check-ins can therefore never both take the last slot, and an incident
//! declared concurrently is observed either entirely before or entirely after
//! a given check-in.

use crate::domain::error::AdmissionResult;
use crate::domain::types::{
    AttractionId, AttractionStatus, CapacityStatus, CheckInOutcome, CheckOutOutcome, VisitorId,
};
use crate::infra::metrics::Metrics;
use crate::services::capacity_policy::classify;
use crate::services::incident_registry::IncidentRegistry;
use crate::services::occupancy_ledger::{admit_one, release_one, OccupancyLedger};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// What happened inside the critical section, reported after the lock drops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Admitted,
    RejectedFull,
    RejectedIncident,
}

pub struct AdmissionController {
    ledger: Arc<OccupancyLedger>,
    incidents: IncidentRegistry,
    metrics: Arc<Metrics>,
}

impl AdmissionController {
    pub fn new(ledger: Arc<OccupancyLedger>, metrics: Arc<Metrics>) -> Self {
        let incidents = IncidentRegistry::new(ledger.clone());
        Self { ledger, incidents, metrics }
    }

    /// Try to admit a visitor
    ///
    /// Full and incident-closed attractions return `admitted: false`; only
    /// an unknown attraction is an error.
    pub fn check_in(
        &self,
        attraction_id: AttractionId,
        visitor_id: VisitorId,
    ) -> AdmissionResult<CheckInOutcome> {
        let start = Instant::now();

        let result = self.ledger.with_attraction(attraction_id, |state| {
            if state.has_incident {
                return (Decision::RejectedIncident, CapacityStatus::ClosedIncident, state.occupancy);
            }
            let decision =
                if admit_one(state) { Decision::Admitted } else { Decision::RejectedFull };
            let status = classify(state.occupancy, state.max_capacity, state.has_incident);
            (decision, status, state.occupancy)
        });

        let (decision, status, occupancy) = match result {
            Ok(r) => r,
            Err(e) => {
                self.metrics.record_invalid_request();
                return Err(e);
            }
        };
        self.metrics.record_decision_latency(start.elapsed().as_micros() as u64);

        match decision {
            Decision::Admitted => {
                self.metrics.record_admitted();
                debug!(
                    attraction_id = %attraction_id,
                    visitor_id = %visitor_id,
                    occupancy = %occupancy,
                    status = %status,
                    "check_in_admitted"
                );
            }
            Decision::RejectedFull => {
                self.metrics.record_rejected_full();
                debug!(
                    attraction_id = %attraction_id,
                    visitor_id = %visitor_id,
                    occupancy = %occupancy,
                    reason = "full",
                    "check_in_rejected"
                );
            }
            Decision::RejectedIncident => {
                self.metrics.record_rejected_incident();
                debug!(
                    attraction_id = %attraction_id,
                    visitor_id = %visitor_id,
                    occupancy = %occupancy,
                    reason = "incident",
                    "check_in_rejected"
                );
            }
        }

        Ok(CheckInOutcome { admitted: decision == Decision::Admitted, status })
    }

    /// Release a visitor's slot. Always succeeds for a known attraction;
    /// repeated check-outs never drive occupancy below zero.
    pub fn check_out(
        &self,
        attraction_id: AttractionId,
        visitor_id: VisitorId,
    ) -> AdmissionResult<CheckOutOutcome> {
        let result = self.ledger.with_attraction(attraction_id, |state| {
            let released = release_one(state);
            let status = classify(state.occupancy, state.max_capacity, state.has_incident);
            (released, status, state.occupancy)
        });

        let (released, status, occupancy) = match result {
            Ok(r) => r,
            Err(e) => {
                self.metrics.record_invalid_request();
                return Err(e);
            }
        };
        self.metrics.record_check_out(released);

        if released {
            debug!(
                attraction_id = %attraction_id,
                visitor_id = %visitor_id,
                occupancy = %occupancy,
                status = %status,
                "check_out"
            );
        } else {
            debug!(attraction_id = %attraction_id, visitor_id = %visitor_id, "check_out_noop");
        }

        Ok(CheckOutOutcome { status })
    }

    pub fn declare_incident(&self, attraction_id: AttractionId) -> AdmissionResult<()> {
        if self.incidents.declare_incident(attraction_id)? {
            self.metrics.record_incident_declared();
        }
        Ok(())
    }

    pub fn resolve_incident(&self, attraction_id: AttractionId) -> AdmissionResult<()> {
        if self.incidents.resolve_incident(attraction_id)? {
            self.metrics.record_incident_resolved();
        }
        Ok(())
    }

    /// Occupancy, capacity and derived status read in one critical section
    pub fn get_status(&self, attraction_id: AttractionId) -> AdmissionResult<AttractionStatus> {
        self.ledger.with_attraction(attraction_id, |state| AttractionStatus {
            attraction_id,
            name: state.name.clone(),
            occupancy: state.occupancy,
            max_capacity: state.max_capacity,
            status: classify(state.occupancy, state.max_capacity, state.has_incident),
        })
    }

    /// `get_status` for every attraction, ascending by id
    ///
    /// Each entry is individually consistent; the list is not a global cut.
    pub fn statuses(&self) -> Vec<AttractionStatus> {
        self.ledger
            .attraction_ids()
            .into_iter()
            .filter_map(|id| self.get_status(id).ok())
            .collect()
    }

    /// Attractions currently closed by an incident, ascending
    pub fn open_incidents(&self) -> Vec<AttractionId> {
        self.incidents.open_incidents()
    }

    pub fn ledger(&self) -> &Arc<OccupancyLedger> {
        &self.ledger
    }
}
