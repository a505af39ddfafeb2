use redis::Commands;

use super::{AssignmentCache, VisitorAssignments};
use crate::error::{Error, Result};

/// Assignment cache backed by a Redis server, for sharing assignments across processes and
/// hosts.
///
/// Assignment maps are stored as JSON strings keyed by visitor id, with no expiry: eviction
/// policy belongs to the Redis deployment.
pub struct RedisAssignmentCache {
    client: redis::Client,
}

impl RedisAssignmentCache {
    /// Connect to the Redis server at `url` (e.g. `redis://127.0.0.1/`).
    ///
    /// The connection is verified once up front so that misconfiguration surfaces at
    /// construction rather than on the first decision call.
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|err| Error::Cache(err.to_string()))?;

        // PING to fail fast on an unreachable server.
        let mut connection = client
            .get_connection()
            .map_err(|err| Error::Cache(err.to_string()))?;
        redis::cmd("PING")
            .query::<()>(&mut connection)
            .map_err(|err| Error::Cache(err.to_string()))?;

        Ok(RedisAssignmentCache { client })
    }
}

impl AssignmentCache for RedisAssignmentCache {
    fn get(&self, visitor_id: &str) -> Result<Option<VisitorAssignments>> {
        let mut connection = self
            .client
            .get_connection()
            .map_err(|err| Error::Cache(err.to_string()))?;

        let data: Option<Vec<u8>> = connection
            .get(visitor_id)
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
        let mut connection = self
            .client
            .get_connection()
            .map_err(|err| Error::Cache(err.to_string()))?;

        let data =
            serde_json::to_vec(assignments).map_err(|err| Error::Cache(err.to_string()))?;

        connection
            .set::<_, _, ()>(visitor_id, data)
            .map_err(|err| Error::Cache(err.to_string()))?;

        Ok(())
    }
}
