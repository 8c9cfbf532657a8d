use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{Actor, DepartmentId, EmployeeId, Position, PositionId};
use super::repository::{
    DepartmentStore, EmployeeDirectory, LookupTables, PositionStore, RepositoryError, VersionStore,
};
use super::service::{next_position_id, RosterService};

/// One batch approval or disapproval request. The cascade holds on to the
/// original request so it can re-issue it once the employee queue drains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalBatch {
    pub department_id: DepartmentId,
    pub position_ids: Vec<PositionId>,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub actor: Actor,
}

/// Reasons a destructive action is refused outright.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintViolation {
    #[error("position '{position}' is approved; approval must be revoked first")]
    ApprovalNotRevoked { position: String },
    #[error("{employees} employee(s) assigned to position '{position}' must be unassigned first")]
    EmployeesAssigned { position: String, employees: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),
    #[error("position '{0}' not found")]
    PositionNotFound(String),
    #[error("position '{position}' does not belong to department '{department}'")]
    WrongDepartment { position: String, department: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// An employee blocking a disapproval, in unassignment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedAssignment {
    pub employee_id: EmployeeId,
    pub position_id: PositionId,
    pub first_name: String,
    pub last_name: String,
    pub employee_code: String,
}

/// Outcome of a batch disapproval.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DisapprovalOutcome {
    /// Every target had `filled == 0`; states flipped and audit entries
    /// appended in one commit.
    Applied { positions: Vec<PositionId> },
    /// At least one target still has employees assigned. Nothing was
    /// mutated; the queue lists every blocking assignment in effectively
    /// first-match order.
    Blocked { queue: Vec<BlockedAssignment> },
}

impl<P, D, E, V, L> RosterService<P, D, E, V, L>
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    /// Approve every position in the batch, appending an audit entry per
    /// target. Re-approving an already-approved position refreshes its
    /// approval record and still appends a fresh entry. All targets are
    /// validated before any write; the batch commits atomically.
    pub fn approve_positions(
        &self,
        batch: &ApprovalBatch,
    ) -> Result<Vec<PositionId>, ApprovalError> {
        let mut targets = self.load_batch(batch)?;
        for position in &mut targets {
            position.record_approval(batch.at, batch.note.clone(), &batch.actor);
        }
        self.positions().update_batch(&targets)?;

        let ids: Vec<PositionId> = targets.into_iter().map(|p| p.id).collect();
        info!(
            department = %batch.department_id.0,
            count = ids.len(),
            actor = %batch.actor.id,
            "positions approved"
        );
        Ok(ids)
    }

    /// Disapprove every position in the batch, or report the employees
    /// that must be unassigned first.
    ///
    /// If any target has `filled > 0` the call mutates nothing and returns
    /// `Blocked` carrying the full unassignment queue; `is_approved` is
    /// never cleared while an employee still references the position.
    pub fn disapprove_positions(
        &self,
        batch: &ApprovalBatch,
    ) -> Result<DisapprovalOutcome, ApprovalError> {
        let mut targets = self.load_batch(batch)?;

        let blocked: Vec<&Position> = targets.iter().filter(|p| p.filled > 0).collect();
        if !blocked.is_empty() {
            let mut queue = Vec::new();
            for position in &blocked {
                for employee in self.directory().by_position(&position.id)? {
                    queue.push(BlockedAssignment {
                        employee_id: employee.id,
                        position_id: position.id.clone(),
                        first_name: employee.first_name,
                        last_name: employee.last_name,
                        employee_code: employee.employee_code,
                    });
                }
            }
            info!(
                department = %batch.department_id.0,
                blocked_positions = blocked.len(),
                queued_employees = queue.len(),
                "disapproval blocked on assigned employees"
            );
            return Ok(DisapprovalOutcome::Blocked { queue });
        }

        for position in &mut targets {
            position.record_disapproval(batch.at, batch.note.clone(), &batch.actor);
        }
        self.positions().update_batch(&targets)?;

        let ids: Vec<PositionId> = targets.into_iter().map(|p| p.id).collect();
        info!(
            department = %batch.department_id.0,
            count = ids.len(),
            actor = %batch.actor.id,
            "positions disapproved"
        );
        Ok(DisapprovalOutcome::Applied { positions: ids })
    }

    /// Remove an unapproved, unfilled position from the live registry.
    /// Past snapshots keep their copies; deletion never rewrites history.
    pub fn delete_position(&self, position_id: &PositionId) -> Result<(), ApprovalError> {
        let position = self
            .positions()
            .fetch(position_id)?
            .ok_or_else(|| ApprovalError::PositionNotFound(position_id.0.clone()))?;

        if position.is_approved {
            return Err(ConstraintViolation::ApprovalNotRevoked {
                position: position.title,
            }
            .into());
        }
        if position.filled > 0 {
            return Err(ConstraintViolation::EmployeesAssigned {
                position: position.title,
                employees: position.filled,
            }
            .into());
        }

        self.positions().remove(position_id)?;
        info!(position = %position_id.0, "position deleted");
        Ok(())
    }

    /// Create an unapproved copy of a position. Identity, fill count, and
    /// approval history are not carried over.
    pub fn duplicate_position(
        &self,
        position_id: &PositionId,
    ) -> Result<PositionId, ApprovalError> {
        let source = self
            .positions()
            .fetch(position_id)?
            .ok_or_else(|| ApprovalError::PositionNotFound(position_id.0.clone()))?;

        let mut copy = Position::new(
            next_position_id(),
            source.department_id.clone(),
            format!("{} (copy)", source.title),
        );
        copy.reports_to = source.reports_to.clone();
        copy.level_id = source.level_id.clone();

        let copy = self.positions().insert(copy)?;
        info!(source = %position_id.0, copy = %copy.id.0, "position duplicated");
        Ok(copy.id)
    }

    fn load_batch(&self, batch: &ApprovalBatch) -> Result<Vec<Position>, ApprovalError> {
        batch
            .position_ids
            .iter()
            .map(|id| {
                let position = self
                    .positions()
                    .fetch(id)?
                    .ok_or_else(|| ApprovalError::PositionNotFound(id.0.clone()))?;
                if position.department_id != batch.department_id {
                    return Err(ApprovalError::WrongDepartment {
                        position: id.0.clone(),
                        department: batch.department_id.0.clone(),
                    });
                }
                Ok(position)
            })
            .collect()
    }
}
