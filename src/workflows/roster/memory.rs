use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{
    Department, DepartmentId, Employee, EmployeeId, LevelId, LevelNames, Position, PositionId,
    TypeId, TypeNames,
};
use super::repository::{
    DepartmentStore, EmployeeDirectory, LookupTables, PositionStore, RepositoryError, VersionStore,
};
use super::versioning::DepartmentVersion;

#[derive(Debug, Default)]
struct RosterState {
    positions: Vec<Position>,
    departments: Vec<Department>,
    employees: Vec<Employee>,
    versions: Vec<DepartmentVersion>,
    levels: BTreeMap<LevelId, String>,
    types: BTreeMap<TypeId, String>,
}

/// In-memory backing store implementing every repository trait behind a
/// single mutex, so batch updates and the close-and-insert version swap
/// are atomic for in-process callers.
///
/// Used by the demo CLI, the router state, and the integration tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRoster {
    state: Arc<Mutex<RosterState>>,
}

impl InMemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RosterState> {
        self.state.lock().expect("roster state mutex poisoned")
    }

    pub fn seed_department(&self, department: Department) {
        self.lock().departments.push(department);
    }

    pub fn seed_position(&self, position: Position) {
        self.lock().positions.push(position);
    }

    pub fn seed_employee(&self, employee: Employee) {
        self.lock().employees.push(employee);
    }

    pub fn seed_level(&self, id: LevelId, name: impl Into<String>) {
        self.lock().levels.insert(id, name.into());
    }

    pub fn seed_type(&self, id: TypeId, name: impl Into<String>) {
        self.lock().types.insert(id, name.into());
    }

    pub fn employee(&self, id: &EmployeeId) -> Option<Employee> {
        self.lock().employees.iter().find(|e| &e.id == id).cloned()
    }
}

impl PositionStore for InMemoryRoster {
    fn list_by_department(
        &self,
        department: &DepartmentId,
    ) -> Result<Vec<Position>, RepositoryError> {
        Ok(self
            .lock()
            .positions
            .iter()
            .filter(|p| &p.department_id == department)
            .cloned()
            .collect())
    }

    fn fetch(&self, id: &PositionId) -> Result<Option<Position>, RepositoryError> {
        Ok(self.lock().positions.iter().find(|p| &p.id == id).cloned())
    }

    fn insert(&self, position: Position) -> Result<Position, RepositoryError> {
        let mut state = self.lock();
        if state.positions.iter().any(|p| p.id == position.id) {
            return Err(RepositoryError::Conflict);
        }
        state.positions.push(position.clone());
        Ok(position)
    }

    fn update_batch(&self, positions: &[Position]) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        // Validate the whole batch before touching anything so a missing
        // record cannot leave a partial write behind.
        for update in positions {
            if !state.positions.iter().any(|p| p.id == update.id) {
                return Err(RepositoryError::NotFound);
            }
        }
        for update in positions {
            if let Some(slot) = state.positions.iter_mut().find(|p| p.id == update.id) {
                *slot = update.clone();
            }
        }
        Ok(())
    }

    fn remove(&self, id: &PositionId) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let before = state.positions.len();
        state.positions.retain(|p| &p.id != id);
        if state.positions.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl DepartmentStore for InMemoryRoster {
    fn load(&self, id: &DepartmentId) -> Result<Option<Department>, RepositoryError> {
        Ok(self.lock().departments.iter().find(|d| &d.id == id).cloned())
    }

    fn update(&self, department: Department) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let slot = state
            .departments
            .iter_mut()
            .find(|d| d.id == department.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = department;
        Ok(())
    }
}

impl EmployeeDirectory for InMemoryRoster {
    fn by_department(&self, department: &DepartmentId) -> Result<Vec<Employee>, RepositoryError> {
        Ok(self
            .lock()
            .employees
            .iter()
            .filter(|e| e.department_id.as_ref() == Some(department))
            .cloned()
            .collect())
    }

    fn by_position(&self, position: &PositionId) -> Result<Vec<Employee>, RepositoryError> {
        Ok(self
            .lock()
            .employees
            .iter()
            .filter(|e| e.position_id.as_ref() == Some(position))
            .cloned()
            .collect())
    }

    fn unassign(&self, employee: &EmployeeId) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let slot = state
            .employees
            .iter_mut()
            .find(|e| &e.id == employee)
            .ok_or(RepositoryError::NotFound)?;
        slot.position_id = None;
        slot.department_id = None;
        Ok(())
    }
}

impl VersionStore for InMemoryRoster {
    fn history(
        &self,
        department: &DepartmentId,
    ) -> Result<Vec<DepartmentVersion>, RepositoryError> {
        let mut versions: Vec<DepartmentVersion> = self
            .lock()
            .versions
            .iter()
            .filter(|v| &v.department_id == department)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.approved_at);
        Ok(versions)
    }

    fn open_version(
        &self,
        department: &DepartmentId,
    ) -> Result<Option<DepartmentVersion>, RepositoryError> {
        Ok(self
            .lock()
            .versions
            .iter()
            .find(|v| &v.department_id == department && v.is_open())
            .cloned())
    }

    fn replace_open(
        &self,
        valid_to: DateTime<Utc>,
        next: DepartmentVersion,
    ) -> Result<DepartmentVersion, RepositoryError> {
        let mut state = self.lock();
        if state.versions.iter().any(|v| v.id == next.id) {
            return Err(RepositoryError::Conflict);
        }
        if let Some(open) = state
            .versions
            .iter_mut()
            .find(|v| v.department_id == next.department_id && v.is_open())
        {
            open.valid_to = Some(valid_to);
        }
        state.versions.push(next.clone());
        Ok(next)
    }

    fn close_open(
        &self,
        department: &DepartmentId,
        valid_to: DateTime<Utc>,
    ) -> Result<Option<DepartmentVersion>, RepositoryError> {
        let mut state = self.lock();
        let Some(open) = state
            .versions
            .iter_mut()
            .find(|v| &v.department_id == department && v.is_open())
        else {
            return Ok(None);
        };
        open.valid_to = Some(valid_to);
        Ok(Some(open.clone()))
    }

    fn append(&self, version: DepartmentVersion) -> Result<DepartmentVersion, RepositoryError> {
        let mut state = self.lock();
        if state.versions.iter().any(|v| v.id == version.id) {
            return Err(RepositoryError::Conflict);
        }
        state.versions.push(version.clone());
        Ok(version)
    }
}

impl LookupTables for InMemoryRoster {
    fn level_names(&self) -> Result<LevelNames, RepositoryError> {
        Ok(LevelNames(self.lock().levels.clone()))
    }

    fn type_names(&self) -> Result<TypeNames, RepositoryError> {
        Ok(TypeNames(self.lock().types.clone()))
    }
}
