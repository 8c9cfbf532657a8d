use std::collections::VecDeque;

use serde::Serialize;
use tracing::info;

use super::approval::{ApprovalBatch, ApprovalError, BlockedAssignment, DisapprovalOutcome};
use super::domain::{EmployeeId, PositionId};
use super::repository::{
    DepartmentStore, EmployeeDirectory, LookupTables, PositionStore, RepositoryError, VersionStore,
};
use super::service::RosterService;

/// Resumable unassign-then-retry saga.
///
/// Built from a `Blocked` disapproval outcome, the cascade clears one
/// employee-position link per `advance` call, each behind an actor
/// confirmation. When the queue drains it re-issues the original
/// disapproval exactly once. Dropping the value abandons the saga;
/// completed unassignments stay committed (no compensation), and the
/// original disapproval is simply never retried.
#[derive(Debug)]
pub struct UnassignCascade {
    batch: ApprovalBatch,
    queue: VecDeque<BlockedAssignment>,
    processed: usize,
    resumed: bool,
}

/// Result of one cascade step, handed back to the caller as its only
/// in-flight state.
#[derive(Debug, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CascadeStep {
    /// One link cleared; the saga waits for the actor to confirm the next.
    AwaitingConfirmation {
        unassigned: EmployeeId,
        position: PositionId,
        next: BlockedAssignment,
        remaining: usize,
    },
    /// Queue drained and the original disapproval was re-issued.
    Completed {
        unassigned: usize,
        outcome: DisapprovalOutcome,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    #[error("cascade already completed")]
    AlreadyCompleted,
    #[error(transparent)]
    Approval(#[from] ApprovalError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl UnassignCascade {
    pub fn new(batch: ApprovalBatch, queue: Vec<BlockedAssignment>) -> Self {
        Self {
            batch,
            queue: queue.into(),
            processed: 0,
            resumed: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Run the next step: unassign the head employee, then either report
    /// the next confirmation or auto-resume the blocked disapproval.
    pub fn advance<P, D, E, V, L>(
        &mut self,
        service: &RosterService<P, D, E, V, L>,
    ) -> Result<CascadeStep, CascadeError>
    where
        P: PositionStore + 'static,
        D: DepartmentStore + 'static,
        E: EmployeeDirectory + 'static,
        V: VersionStore + 'static,
        L: LookupTables + 'static,
    {
        if self.resumed {
            return Err(CascadeError::AlreadyCompleted);
        }

        if let Some(entry) = self.queue.pop_front() {
            service.clear_assignment(&entry.employee_id, &entry.position_id)?;
            self.processed += 1;

            if let Some(next) = self.queue.front() {
                return Ok(CascadeStep::AwaitingConfirmation {
                    unassigned: entry.employee_id,
                    position: entry.position_id,
                    next: next.clone(),
                    remaining: self.queue.len(),
                });
            }
        }

        // Queue drained: retry the original disapproval once, against
        // current data rather than the state observed when it was blocked.
        self.resumed = true;
        let outcome = service.disapprove_positions(&self.batch)?;
        info!(
            department = %self.batch.department_id.0,
            unassigned = self.processed,
            "unassign cascade completed, disapproval re-issued"
        );
        Ok(CascadeStep::Completed {
            unassigned: self.processed,
            outcome,
        })
    }
}

impl<P, D, E, V, L> RosterService<P, D, E, V, L>
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    /// Clear one employee-position link and decrement the position's
    /// filled count, floored at zero.
    ///
    /// The directory write and the counter update are two store calls; if
    /// the second is lost the drift is repaired by `sync_filled_counts`.
    pub fn clear_assignment(
        &self,
        employee_id: &EmployeeId,
        position_id: &PositionId,
    ) -> Result<(), RepositoryError> {
        self.directory().unassign(employee_id)?;

        let mut position = self
            .positions()
            .fetch(position_id)?
            .ok_or(RepositoryError::NotFound)?;
        position.filled = position.filled.saturating_sub(1);
        self.positions().update_batch(std::slice::from_ref(&position))?;

        info!(employee = %employee_id.0, position = %position_id.0, "assignment cleared");
        Ok(())
    }
}
