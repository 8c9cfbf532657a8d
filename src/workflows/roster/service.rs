use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::domain::{DepartmentId, Position, PositionId};
use super::repository::{
    DepartmentStore, EmployeeDirectory, LookupTables, PositionStore, RepositoryError, VersionStore,
};
use super::tree::{build_tree, PositionNode};
use super::versioning::VersionId;

/// Facade composing the position store, department store, employee
/// directory, version history, and lookup tables behind the engine's
/// public operations.
///
/// Approval, cascade, versioning, and reconciliation operations live in
/// their own modules as `impl` blocks on this type.
pub struct RosterService<P, D, E, V, L> {
    positions: Arc<P>,
    departments: Arc<D>,
    directory: Arc<E>,
    versions: Arc<V>,
    lookups: Arc<L>,
}

static POSITION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static VERSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_position_id() -> PositionId {
    let id = POSITION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PositionId(format!("pos-{id:06}"))
}

pub(crate) fn next_version_id() -> VersionId {
    let id = VERSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    VersionId(format!("ver-{id:06}"))
}

impl<P, D, E, V, L> RosterService<P, D, E, V, L>
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    pub fn new(
        positions: Arc<P>,
        departments: Arc<D>,
        directory: Arc<E>,
        versions: Arc<V>,
        lookups: Arc<L>,
    ) -> Self {
        Self {
            positions,
            departments,
            directory,
            versions,
            lookups,
        }
    }

    pub(crate) fn positions(&self) -> &P {
        &self.positions
    }

    pub(crate) fn departments(&self) -> &D {
        &self.departments
    }

    pub(crate) fn directory(&self) -> &E {
        &self.directory
    }

    pub(crate) fn versions(&self) -> &V {
        &self.versions
    }

    pub(crate) fn lookups(&self) -> &L {
        &self.lookups
    }

    /// Live positions of a department, in store order.
    pub fn department_positions(
        &self,
        department_id: &DepartmentId,
    ) -> Result<Vec<Position>, RepositoryError> {
        self.positions.list_by_department(department_id)
    }

    /// Reporting-line forest over the department's live positions.
    ///
    /// Read-only display view; has no write path into the roster.
    pub fn structure_tree(
        &self,
        department_id: &DepartmentId,
    ) -> Result<Vec<PositionNode>, RepositoryError> {
        let positions = self.positions.list_by_department(department_id)?;
        Ok(build_tree(&positions))
    }
}
