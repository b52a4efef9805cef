//! Visitor identity lookup
//!
//! The user directory is an external collaborator. The core only needs a
//! projection (name, surname, email) keyed by visitor id to decorate ranking
//! output and to reject unknown visitor ids.

use crate::domain::types::{VisitorId, VisitorProjection};
use crate::infra::config::VisitorConfig;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

pub trait VisitorDirectory: Send + Sync {
    fn lookup(&self, visitor_id: VisitorId) -> Option<VisitorProjection>;

    fn contains(&self, visitor_id: VisitorId) -> bool {
        self.lookup(visitor_id).is_some()
    }
}

/// In-memory directory seeded from configuration, replaceable on refresh
#[derive(Default)]
pub struct StaticDirectory {
    visitors: RwLock<FxHashMap<VisitorId, VisitorProjection>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: &[VisitorConfig]) -> Self {
        let directory = Self::new();
        directory.replace(configs);
        directory
    }

    /// Replace the whole directory contents
    pub fn replace(&self, configs: &[VisitorConfig]) {
        let visitors = configs
            .iter()
            .map(|v| {
                let projection = VisitorProjection {
                    name: v.name.clone(),
                    surname: v.surname.clone(),
                    email: v.email.clone(),
                };
                (v.id, projection)
            })
            .collect();
        *self.visitors.write() = visitors;
    }

    pub fn insert(&self, visitor_id: VisitorId, projection: VisitorProjection) {
        self.visitors.write().insert(visitor_id, projection);
    }

    pub fn len(&self) -> usize {
        self.visitors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.read().is_empty()
    }
}

impl VisitorDirectory for StaticDirectory {
    fn lookup(&self, visitor_id: VisitorId) -> Option<VisitorProjection> {
        self.visitors.read().get(&visitor_id).cloned()
    }

    fn contains(&self, visitor_id: VisitorId) -> bool {
        self.visitors.read().contains_key(&visitor_id)
    }
}
