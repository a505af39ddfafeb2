use super::{AssignmentCache, VisitorAssignments};
use crate::error::Result;

type Getter = dyn Fn(&str) -> Result<Option<VisitorAssignments>> + Send + Sync;
type Setter = dyn Fn(&str, &VisitorAssignments) -> Result<()> + Send + Sync;

/// Assignment cache backed by caller-supplied get/set callbacks.
///
/// Useful when assignments live in storage this crate has no backend for (an application
/// database, a different KV store, a distributed cache).
pub struct CustomAssignmentCache {
    getter: Box<Getter>,
    setter: Box<Setter>,
}

impl CustomAssignmentCache {
    pub fn new(
        getter: impl Fn(&str) -> Result<Option<VisitorAssignments>> + Send + Sync + 'static,
        setter: impl Fn(&str, &VisitorAssignments) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        CustomAssignmentCache {
            getter: Box::new(getter),
            setter: Box::new(setter),
        }
    }
}

impl AssignmentCache for CustomAssignmentCache {
    fn get(&self, visitor_id: &str) -> Result<Option<VisitorAssignments>> {
        (self.getter)(visitor_id)
    }

    fn set(&self, visitor_id: &str, assignments: &VisitorAssignments) -> Result<()> {
        (self.setter)(visitor_id, assignments)
    }
}
