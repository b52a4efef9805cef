//! Invalid-input errors for the admission core
//!
//! Capacity-full and incident-closed are expected outcomes and live in
//! `CheckInOutcome`, not here.

use crate::domain::types::{AttractionId, VisitorId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("unknown attraction_id {attraction_id}")]
    UnknownAttraction { attraction_id: AttractionId },

    #[error("unknown visitor_id {visitor_id}")]
    UnknownVisitor { visitor_id: VisitorId },

    #[error("points must be non-negative for visitor_id {visitor_id}, got {points}")]
    NegativePoints { visitor_id: VisitorId, points: i64 },

    #[error("max_capacity must be positive for attraction_id {attraction_id}, got {max_capacity}")]
    InvalidCapacity { attraction_id: AttractionId, max_capacity: u32 },

    #[error("duplicate attraction_id {attraction_id} in configuration")]
    DuplicateAttraction { attraction_id: AttractionId },

    #[error("points total overflow for visitor_id {visitor_id}")]
    PointsOverflow { visitor_id: VisitorId },
}

pub type AdmissionResult<T> = Result<T, AdmissionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_offending_field() {
        let err = AdmissionError::UnknownAttraction { attraction_id: AttractionId(7) };
        assert_eq!(err.to_string(), "unknown attraction_id 7");

        let err = AdmissionError::NegativePoints { visitor_id: VisitorId(3), points: -5 };
        assert!(err.to_string().contains("visitor_id 3"));
        assert!(err.to_string().contains("-5"));
    }
}
