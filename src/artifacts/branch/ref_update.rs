//! Outcome of a conditional branch update
//!
//! A lost race is an expected result of the compare-and-swap, so it is reported as a
//! value rather than as an error. Callers decide how to surface it.

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::ImportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefUpdate {
    /// The branch did not exist and now points at the new revision
    Created(ObjectId),
    /// The branch still held the expected head and was moved forward
    Advanced { from: ObjectId, to: ObjectId },
    /// Another writer got there first; the branch was left untouched
    Conflict {
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },
}

impl RefUpdate {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RefUpdate::Conflict { .. })
    }

    /// The revision the branch points at after a successful update
    pub fn new_head(&self) -> Option<&ObjectId> {
        match self {
            RefUpdate::Created(oid) | RefUpdate::Advanced { to: oid, .. } => Some(oid),
            RefUpdate::Conflict { .. } => None,
        }
    }

    /// Turn a conflict into an [`ImportError::RefConflict`]
    pub fn into_result(self, branch: &BranchName) -> anyhow::Result<ObjectId> {
        match self {
            RefUpdate::Created(oid) | RefUpdate::Advanced { to: oid, .. } => Ok(oid),
            RefUpdate::Conflict { expected, actual } => Err(ImportError::RefConflict {
                branch: branch.to_string(),
                expected: describe(expected.as_ref()),
                actual: describe(actual.as_ref()),
            }
            .into()),
        }
    }
}

fn describe(oid: Option<&ObjectId>) -> String {
    oid.map_or_else(|| "no branch".to_string(), ObjectId::to_string)
}
