//! Per-visitor assignment cache protocol.
//!
//! The cache makes variation assignment "sticky": a visitor keeps the variation they were first
//! allocated for as long as the same variation group still matches them. Storage is pluggable;
//! the protocol is fixed: backends read and write the *entire* per-visitor assignment map, there
//! is no partial-key update.
//!
//! The cache is an optimization, not a correctness dependency. The engine treats a read failure
//! as "no cache" and a write failure as a logged warning; neither fails a decision call.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

mod custom;
mod in_memory;
#[cfg(feature = "local-cache")]
mod local;
#[cfg(feature = "redis-cache")]
mod redis;

pub use custom::CustomAssignmentCache;
pub use in_memory::InMemoryAssignmentCache;
#[cfg(feature = "local-cache")]
pub use local::LocalAssignmentCache;
#[cfg(feature = "redis-cache")]
pub use redis::RedisAssignmentCache;

/// A visitor's cached assignment for one campaign.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CachedAssignment {
    /// The variation group that matched when this assignment was made. The assignment is reused
    /// only while the freshly matched group has the same id.
    pub variation_group_id: String,
    pub variation_id: String,
    /// Whether an activation hit was already sent for this assignment. Set by the (external)
    /// activation path; the engine only preserves it across refreshes.
    #[serde(default)]
    pub activated: bool,
    /// Flag keys defined by the assigned variation's modifications.
    #[serde(default)]
    pub flag_keys: Vec<String>,
}

/// The whole assignment map of one visitor, keyed by campaign id.
pub type VisitorAssignments = HashMap<String, CachedAssignment>;

/// Storage backend for per-visitor assignments.
///
/// Implementations provide exactly these two whole-map operations; coordination (when to read,
/// how to merge, when to write back) belongs to the engine.
pub trait AssignmentCache: Send + Sync {
    /// Read the visitor's assignment map. `Ok(None)` means the visitor is unknown to the backend.
    fn get(&self, visitor_id: &str) -> Result<Option<VisitorAssignments>>;

    /// Replace the visitor's assignment map.
    fn set(&self, visitor_id: &str, assignments: &VisitorAssignments) -> Result<()>;
}
