use chrono::{DateTime, Utc};

use super::domain::{
    Department, DepartmentId, Employee, EmployeeId, LevelNames, Position, PositionId, TypeNames,
};
use super::versioning::DepartmentVersion;

/// Error enumeration for storage and directory failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction for live position records.
///
/// `update_batch` is the atomicity seam: every position in the slice is
/// persisted in one commit or none are.
pub trait PositionStore: Send + Sync {
    fn list_by_department(&self, department: &DepartmentId)
        -> Result<Vec<Position>, RepositoryError>;
    fn fetch(&self, id: &PositionId) -> Result<Option<Position>, RepositoryError>;
    fn insert(&self, position: Position) -> Result<Position, RepositoryError>;
    fn update_batch(&self, positions: &[Position]) -> Result<(), RepositoryError>;
    fn remove(&self, id: &PositionId) -> Result<(), RepositoryError>;
}

/// Storage abstraction for department records.
pub trait DepartmentStore: Send + Sync {
    fn load(&self, id: &DepartmentId) -> Result<Option<Department>, RepositoryError>;
    fn update(&self, department: Department) -> Result<(), RepositoryError>;
}

/// Seam to the external employee directory.
///
/// The directory owns employee records; this engine reads assignments and
/// clears them during cascade unassignment. Both sides honor that contract.
pub trait EmployeeDirectory: Send + Sync {
    fn by_department(&self, department: &DepartmentId) -> Result<Vec<Employee>, RepositoryError>;
    fn by_position(&self, position: &PositionId) -> Result<Vec<Employee>, RepositoryError>;
    /// Clear the employee's position and department links.
    fn unassign(&self, employee: &EmployeeId) -> Result<(), RepositoryError>;
}

/// Storage abstraction for the append-only structure version history.
///
/// Implementations must keep at most one open version (`valid_to == None`)
/// per department: `replace_open` closes the current open version, if any,
/// and inserts the new one under a single writer.
pub trait VersionStore: Send + Sync {
    /// Versions for a department ordered by `approved_at` ascending.
    fn history(
        &self,
        department: &DepartmentId,
    ) -> Result<Vec<DepartmentVersion>, RepositoryError>;
    fn open_version(
        &self,
        department: &DepartmentId,
    ) -> Result<Option<DepartmentVersion>, RepositoryError>;
    /// Close the open version at `valid_to` (when one exists) and insert
    /// `next` as the new open version.
    fn replace_open(
        &self,
        valid_to: DateTime<Utc>,
        next: DepartmentVersion,
    ) -> Result<DepartmentVersion, RepositoryError>;
    /// Close the open version without starting a new one (dissolution).
    fn close_open(
        &self,
        department: &DepartmentId,
        valid_to: DateTime<Utc>,
    ) -> Result<Option<DepartmentVersion>, RepositoryError>;
    fn append(&self, version: DepartmentVersion) -> Result<DepartmentVersion, RepositoryError>;
}

/// Read-only lookup tables, consumed as typed projections.
pub trait LookupTables: Send + Sync {
    fn level_names(&self) -> Result<LevelNames, RepositoryError>;
    fn type_names(&self) -> Result<TypeNames, RepositoryError>;
}
