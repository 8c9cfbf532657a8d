use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::checklist::StructureChecklist;
use super::domain::{
    ApprovalLogEntry, DepartmentId, DepartmentStatus, EmployeeId, LevelId, LevelNames, Position,
    PositionId,
};
use super::repository::{
    DepartmentStore, EmployeeDirectory, LookupTables, PositionStore, RepositoryError, VersionStore,
};
use super::service::{next_version_id, RosterService};

/// Employee assignment frozen into a snapshot at approval time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedEmployee {
    pub employee_id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub employee_code: String,
}

/// Frozen copy of one position, enriched with the resolved level name and
/// the employees assigned at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub id: PositionId,
    pub title: String,
    pub reports_to: Option<PositionId>,
    pub level_id: Option<LevelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_name: Option<String>,
    pub is_approved: bool,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by_name: Option<String>,
    pub approval_history: Vec<ApprovalLogEntry>,
    pub filled: u32,
    pub is_active: bool,
    pub assigned: Vec<AssignedEmployee>,
}

impl PositionSnapshot {
    fn freeze(
        position: &Position,
        level_names: &LevelNames,
        assigned: Vec<AssignedEmployee>,
    ) -> Self {
        Self {
            id: position.id.clone(),
            title: position.title.clone(),
            reports_to: position.reports_to.clone(),
            level_id: position.level_id.clone(),
            level_name: level_names.resolve(position.level_id.as_ref()),
            is_approved: position.is_approved,
            approved_at: position.approved_at,
            approved_by_name: position.approved_by_name.clone(),
            approval_history: position.approval_history.clone(),
            filled: position.filled,
            is_active: position.is_active,
            assigned,
        }
    }
}

/// Identifier for one immutable structure version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionId(pub String);

/// An immutable record of a department's approved structure, valid over
/// `[approved_at, valid_to)`. `valid_to == None` marks the current version.
///
/// The department's type name is resolved and frozen at approval time, so
/// the history stays readable after lookup-table edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentVersion {
    pub id: VersionId,
    pub department_id: DepartmentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub approved_at: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub is_dissolution: bool,
    pub snapshot: Vec<PositionSnapshot>,
}

impl DepartmentVersion {
    pub fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }
}

/// Failure modes of the structure approval operation.
#[derive(Debug, thiserror::Error)]
pub enum StructureApprovalError {
    #[error("{}", describe_incomplete(checklist))]
    Incomplete { checklist: StructureChecklist },
    #[error("department not found")]
    DepartmentNotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn describe_incomplete(checklist: &StructureChecklist) -> String {
    if !checklist.all_positions_approved && checklist.has_positions {
        let n = checklist.unapproved_count;
        let noun = if n == 1 { "position" } else { "positions" };
        return format!("structure approval blocked: {n} {noun} unapproved");
    }
    let failed: Vec<&str> = checklist
        .failed_checks()
        .iter()
        .map(|item| item.label())
        .collect();
    format!("structure approval blocked: {}", failed.join(", "))
}

/// Receipt for a successful structure approval.
#[derive(Debug, Clone, Serialize)]
pub struct StructureApproval {
    pub version_id: VersionId,
    pub approved_at: DateTime<Utc>,
    pub position_count: usize,
    pub closed_previous: bool,
    pub draft_merged: bool,
}

impl<P, D, E, V, L> RosterService<P, D, E, V, L>
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    /// Approve the whole department structure.
    ///
    /// Gates on the checklist with zero side effects, freezes the snapshot,
    /// chains the previous open version's validity window to `approved_at`,
    /// writes the new current version, then merges any pending draft edits.
    pub fn approve_structure(
        &self,
        department_id: &DepartmentId,
        approved_at: DateTime<Utc>,
    ) -> Result<StructureApproval, StructureApprovalError> {
        let mut department = self
            .departments()
            .load(department_id)?
            .ok_or(StructureApprovalError::DepartmentNotFound)?;
        let positions = self.positions().list_by_department(department_id)?;

        let checklist = StructureChecklist::evaluate(&department, &positions);
        if !checklist.is_complete() {
            return Err(StructureApprovalError::Incomplete { checklist });
        }

        let snapshot = self.freeze_positions(&positions)?;
        let position_count = snapshot.len();
        let type_name = self
            .lookups()
            .type_names()?
            .resolve(department.type_id.as_ref());

        let had_open = self.versions().open_version(department_id)?.is_some();
        let version = DepartmentVersion {
            id: next_version_id(),
            department_id: department_id.clone(),
            type_name,
            approved_at,
            valid_to: None,
            is_dissolution: false,
            snapshot,
        };
        let version = self.versions().replace_open(approved_at, version)?;

        let draft_merged = department.draft.is_some();
        if draft_merged {
            department.merge_draft();
            self.departments().update(department)?;
        }

        info!(
            department = %department_id.0,
            version = %version.id.0,
            positions = position_count,
            draft_merged,
            "structure approved"
        );

        Ok(StructureApproval {
            version_id: version.id,
            approved_at,
            position_count,
            closed_previous: had_open,
            draft_merged,
        })
    }

    /// Record a department teardown: closes the open version and writes a
    /// final snapshot flagged as a dissolution.
    pub fn dissolve_structure(
        &self,
        department_id: &DepartmentId,
        at: DateTime<Utc>,
    ) -> Result<StructureApproval, StructureApprovalError> {
        let mut department = self
            .departments()
            .load(department_id)?
            .ok_or(StructureApprovalError::DepartmentNotFound)?;
        let positions = self.positions().list_by_department(department_id)?;
        let snapshot = self.freeze_positions(&positions)?;
        let position_count = snapshot.len();
        let type_name = self
            .lookups()
            .type_names()?
            .resolve(department.type_id.as_ref());

        let had_open = self.versions().open_version(department_id)?.is_some();
        let version = DepartmentVersion {
            id: next_version_id(),
            department_id: department_id.clone(),
            type_name,
            approved_at: at,
            // A dissolution version never stays open; the department has no
            // current structure afterwards.
            valid_to: Some(at),
            is_dissolution: true,
            snapshot,
        };
        self.versions().close_open(department_id, at)?;
        let version = self.versions().append(version)?;

        department.status = DepartmentStatus::Dissolved;
        self.departments().update(department)?;

        info!(department = %department_id.0, version = %version.id.0, "structure dissolved");

        Ok(StructureApproval {
            version_id: version.id,
            approved_at: at,
            position_count,
            closed_previous: had_open,
            draft_merged: false,
        })
    }

    /// Version history for a department, oldest first.
    pub fn structure_versions(
        &self,
        department_id: &DepartmentId,
    ) -> Result<Vec<DepartmentVersion>, RepositoryError> {
        self.versions().history(department_id)
    }

    fn freeze_positions(
        &self,
        positions: &[Position],
    ) -> Result<Vec<PositionSnapshot>, RepositoryError> {
        let level_names = self.lookups().level_names()?;
        positions
            .iter()
            .map(|position| {
                let assigned = self
                    .directory()
                    .by_position(&position.id)?
                    .into_iter()
                    .map(|employee| AssignedEmployee {
                        employee_id: employee.id,
                        first_name: employee.first_name,
                        last_name: employee.last_name,
                        employee_code: employee.employee_code,
                    })
                    .collect();
                Ok(PositionSnapshot::freeze(position, &level_names, assigned))
            })
            .collect()
    }
}
