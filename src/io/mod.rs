//! IO modules - external collaborators
//!
//! This module contains the interfaces to systems outside the core:
//! - `directory` - Visitor identity projection lookup
//! - `prometheus` - Prometheus metrics HTTP endpoint

pub mod directory;
pub mod prometheus;

// Re-export commonly used types
pub use directory::{StaticDirectory, VisitorDirectory};
