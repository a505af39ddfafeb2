use std::path::Path;

use super::{AssignmentCache, VisitorAssignments};
use crate::error::{Error, Result};

/// Assignment cache backed by an embedded key-value file store.
///
/// Assignment maps are stored as JSON, keyed by visitor id, so they survive process restarts.
pub struct LocalAssignmentCache {
    db: sled::Db,
}

impl LocalAssignmentCache {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path).map_err(|err| Error::Cache(err.to_string()))?;

        Ok(LocalAssignmentCache { db })
    }
}

impl AssignmentCache for LocalAssignmentCache {
    fn get(&self, visitor_id: &str) -> Result<Option<VisitorAssignments>> {
        let data = self
            .db
            .get(visitor_id.as_bytes())
            .map_err(|err| Error::Cache(err.to_string()))?;

        match data {
            Some(bytes) => {
                let assignments = serde_json::from_slice(&bytes)
                    .map_err(|err| Error::Cache(err.to_string()))?;
                Ok(Some(assignments))
            }
            None => Ok(None),
        }
    }

    fn set(&self, visitor_id: &str, assignments: &VisitorAssignments) -> Result<()> {
        let data =
            serde_json::to_vec(assignments).map_err(|err| Error::Cache(err.to_string()))?;

        self.db
            .insert(visitor_id.as_bytes(), data)
            .map_err(|err| Error::Cache(err.to_string()))?;

        Ok(())
    }
}
