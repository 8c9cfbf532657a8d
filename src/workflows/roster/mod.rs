//! Position approval and structure versioning for a department roster.
//!
//! The engine covers the per-position approval state machine, the
//! structure checklist, the resumable unassign cascade, the append-only
//! version history, filled-count reconciliation, and the reporting-line
//! tree view. Storage and the employee directory sit behind traits so the
//! whole engine runs against the in-memory store in tests and demos.

pub mod approval;
pub mod cascade;
pub mod checklist;
pub mod domain;
pub mod memory;
pub mod reconcile;
pub mod repository;
pub mod router;
pub mod service;
pub mod tree;
pub mod versioning;

pub use approval::{
    ApprovalBatch, ApprovalError, BlockedAssignment, ConstraintViolation, DisapprovalOutcome,
};
pub use cascade::{CascadeError, CascadeStep, UnassignCascade};
pub use checklist::{ChecklistItem, StructureChecklist};
pub use domain::{
    Actor, ApprovalAction, ApprovalLogEntry, Department, DepartmentDraft, DepartmentId,
    DepartmentStatus, Employee, EmployeeId, LevelId, LevelNames, Position, PositionId, TypeId,
    TypeNames,
};
pub use memory::InMemoryRoster;
pub use reconcile::SyncReport;
pub use repository::{
    DepartmentStore, EmployeeDirectory, LookupTables, PositionStore, RepositoryError, VersionStore,
};
pub use router::roster_router;
pub use service::RosterService;
pub use tree::{build_tree, PositionNode};
pub use versioning::{
    AssignedEmployee, DepartmentVersion, PositionSnapshot, StructureApproval,
    StructureApprovalError, VersionId,
};
