use std::collections::HashMap;
use std::sync::RwLock;

use super::{AssignmentCache, VisitorAssignments};
use crate::error::{Error, Result};

/// Process-local assignment cache. Assignments survive for the lifetime of the process only.
#[derive(Default)]
pub struct InMemoryAssignmentCache {
    entries: RwLock<HashMap<String, VisitorAssignments>>,
}

impl InMemoryAssignmentCache {
    pub fn new() -> Self {
        InMemoryAssignmentCache::default()
    }
}

impl AssignmentCache for InMemoryAssignmentCache {
    fn get(&self, visitor_id: &str) -> Result<Option<VisitorAssignments>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::Cache("poisoned lock".to_owned()))?;

        Ok(entries.get(visitor_id).cloned())
    }

    fn set(&self, visitor_id: &str, assignments: &VisitorAssignments) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::Cache("poisoned lock".to_owned()))?;

        entries.insert(visitor_id.to_owned(), assignments.clone());
        Ok(())
    }
}
