use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use super::domain::{DepartmentId, Position, PositionId};
use super::repository::{
    DepartmentStore, EmployeeDirectory, LookupTables, PositionStore, RepositoryError, VersionStore,
};
use super::service::RosterService;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Number of positions whose stored `filled` count was corrected.
    pub corrected: usize,
}

impl<P, D, E, V, L> RosterService<P, D, E, V, L>
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    /// Recompute every position's filled count from the authoritative
    /// employee directory and batch-correct the ones that drifted.
    ///
    /// A second run with no intervening assignment changes writes nothing.
    pub fn sync_filled_counts(
        &self,
        department_id: &DepartmentId,
    ) -> Result<SyncReport, RepositoryError> {
        let positions = self.positions().list_by_department(department_id)?;
        let employees = self.directory().by_department(department_id)?;

        let mut true_counts: HashMap<&PositionId, u32> = HashMap::new();
        for employee in &employees {
            if let Some(position_id) = employee.position_id.as_ref() {
                *true_counts.entry(position_id).or_insert(0) += 1;
            }
        }

        let drifted: Vec<Position> = positions
            .into_iter()
            .filter_map(|mut position| {
                let expected = true_counts.get(&position.id).copied().unwrap_or(0);
                if position.filled != expected {
                    position.filled = expected;
                    Some(position)
                } else {
                    None
                }
            })
            .collect();

        if !drifted.is_empty() {
            self.positions().update_batch(&drifted)?;
            info!(
                department = %department_id.0,
                corrected = drifted.len(),
                "filled counts reconciled"
            );
        }

        Ok(SyncReport {
            corrected: drifted.len(),
        })
    }
}
