//! Incident flags per attraction
//!
//! The flag lives inside the attraction's ledger cell so that it shares the
//! same critical section as occupancy. Declaring closes the attraction to new
//! admissions immediately; current occupants are untouched.

use crate::domain::error::AdmissionResult;
use crate::domain::types::AttractionId;
use crate::services::occupancy_ledger::OccupancyLedger;
use std::sync::Arc;
use tracing::{debug, info};

pub struct IncidentRegistry {
    ledger: Arc<OccupancyLedger>,
}

impl IncidentRegistry {
    pub fn new(ledger: Arc<OccupancyLedger>) -> Self {
        Self { ledger }
    }

    /// Open an incident. Idempotent.
    ///
    /// Returns true if the flag changed.
    pub fn declare_incident(&self, attraction_id: AttractionId) -> AdmissionResult<bool> {
        let (changed, occupancy) = self.ledger.with_attraction(attraction_id, |state| {
            let changed = !state.has_incident;
            state.has_incident = true;
            (changed, state.occupancy)
        })?;

        if changed {
            info!(attraction_id = %attraction_id, occupancy = %occupancy, "incident_declared");
        } else {
            debug!(attraction_id = %attraction_id, "incident_already_open");
        }
        Ok(changed)
    }

    /// Clear an incident. A no-op when none is open; never admits anyone.
    ///
    /// Returns true if the flag changed.
    pub fn resolve_incident(&self, attraction_id: AttractionId) -> AdmissionResult<bool> {
        let (changed, occupancy) = self.ledger.with_attraction(attraction_id, |state| {
            let changed = state.has_incident;
            state.has_incident = false;
            (changed, state.occupancy)
        })?;

        if changed {
            info!(attraction_id = %attraction_id, occupancy = %occupancy, "incident_resolved");
        } else {
            debug!(attraction_id = %attraction_id, "incident_not_open");
        }
        Ok(changed)
    }

    pub fn is_open(&self, attraction_id: AttractionId) -> AdmissionResult<bool> {
        self.ledger.with_attraction(attraction_id, |state| state.has_incident)
    }

    /// Attractions that currently have an open incident, ascending
    pub fn open_incidents(&self) -> Vec<AttractionId> {
        self.ledger
            .attraction_ids()
            .into_iter()
            .filter(|&id| self.is_open(id).unwrap_or(false))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AdmissionError;
    use crate::infra::config::AttractionConfig;

    fn create_registry() -> (Arc<OccupancyLedger>, IncidentRegistry) {
        let configs = vec![
            AttractionConfig { id: AttractionId(1), name: "Log Flume".to_string(), max_capacity: 4 },
            AttractionConfig { id: AttractionId(2), name: "Carousel".to_string(), max_capacity: 4 },
        ];
        let ledger = Arc::new(OccupancyLedger::from_configs(&configs).unwrap());
        let registry = IncidentRegistry::new(ledger.clone());
        (ledger, registry)
    }

    #[test]
    fn test_declare_is_idempotent() {
        let (_ledger, registry) = create_registry();

        assert!(registry.declare_incident(AttractionId(1)).unwrap());
        assert!(!registry.declare_incident(AttractionId(1)).unwrap());
        assert!(registry.is_open(AttractionId(1)).unwrap());
        assert!(!registry.is_open(AttractionId(2)).unwrap());
    }

    #[test]
    fn test_declare_keeps_occupancy() {
        let (ledger, registry) = create_registry();
        ledger.try_admit(AttractionId(1)).unwrap();
        ledger.try_admit(AttractionId(1)).unwrap();

        registry.declare_incident(AttractionId(1)).unwrap();
        assert_eq!(ledger.occupancy(AttractionId(1)).unwrap(), 2);

        registry.resolve_incident(AttractionId(1)).unwrap();
        assert_eq!(ledger.occupancy(AttractionId(1)).unwrap(), 2);
    }

    #[test]
    fn test_resolve_without_incident_is_noop() {
        let (ledger, registry) = create_registry();
        ledger.try_admit(AttractionId(2)).unwrap();

        assert!(!registry.resolve_incident(AttractionId(2)).unwrap());
        assert!(!registry.is_open(AttractionId(2)).unwrap());
        assert_eq!(ledger.occupancy(AttractionId(2)).unwrap(), 1);
    }

    #[test]
    fn test_unknown_attraction() {
        let (_ledger, registry) = create_registry();
        assert_eq!(
            registry.declare_incident(AttractionId(9)).unwrap_err(),
            AdmissionError::UnknownAttraction { attraction_id: AttractionId(9) }
        );
        assert!(registry.is_open(AttractionId(9)).is_err());
    }

    #[test]
    fn test_open_incidents() {
        let (_ledger, registry) = create_registry();
        assert!(registry.open_incidents().is_empty());

        registry.declare_incident(AttractionId(2)).unwrap();
        assert_eq!(registry.open_incidents(), vec![AttractionId(2)]);
    }
}
