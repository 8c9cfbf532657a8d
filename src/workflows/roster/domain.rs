use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for positions in a department roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub String);

/// Identifier wrapper for departments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepartmentId(pub String);

/// Identifier wrapper for employees held by the external directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

/// Identifier for a job level row in the lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(pub String);

/// Identifier for a department type row in the lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub String);

/// Acting user attached to every approval record and audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Approve,
    Disapprove,
}

impl ApprovalAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "Approved",
            Self::Disapprove => "Disapproved",
        }
    }
}

/// One entry of a position's append-only approval audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalLogEntry {
    pub action: ApprovalAction,
    pub actor_id: String,
    pub actor_name: String,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A job slot in a department's structure.
///
/// `filled` is a denormalized count of assigned employees; the employee
/// directory stays authoritative and `sync_filled_counts` corrects drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub department_id: DepartmentId,
    pub title: String,
    pub reports_to: Option<PositionId>,
    pub level_id: Option<LevelId>,
    pub is_approved: bool,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub approved_by_name: Option<String>,
    pub disapproved_at: Option<DateTime<Utc>>,
    pub disapproved_by: Option<String>,
    pub disapproved_by_name: Option<String>,
    pub approval_history: Vec<ApprovalLogEntry>,
    pub filled: u32,
    pub is_active: bool,
}

impl Position {
    /// A fresh, unapproved slot with no assignments.
    pub fn new(id: PositionId, department_id: DepartmentId, title: impl Into<String>) -> Self {
        Self {
            id,
            department_id,
            title: title.into(),
            reports_to: None,
            level_id: None,
            is_approved: false,
            approved_at: None,
            approved_by: None,
            approved_by_name: None,
            disapproved_at: None,
            disapproved_by: None,
            disapproved_by_name: None,
            approval_history: Vec::new(),
            filled: 0,
            is_active: true,
        }
    }

    pub fn record_approval(&mut self, at: DateTime<Utc>, note: Option<String>, actor: &Actor) {
        self.is_approved = true;
        self.approved_at = Some(at);
        self.approved_by = Some(actor.id.clone());
        self.approved_by_name = Some(actor.display_name.clone());
        self.approval_history.push(ApprovalLogEntry {
            action: ApprovalAction::Approve,
            actor_id: actor.id.clone(),
            actor_name: actor.display_name.clone(),
            at,
            note,
        });
    }

    pub fn record_disapproval(&mut self, at: DateTime<Utc>, note: Option<String>, actor: &Actor) {
        self.is_approved = false;
        self.disapproved_at = Some(at);
        self.disapproved_by = Some(actor.id.clone());
        self.disapproved_by_name = Some(actor.display_name.clone());
        self.approval_history.push(ApprovalLogEntry {
            action: ApprovalAction::Disapprove,
            actor_id: actor.id.clone(),
            actor_name: actor.display_name.clone(),
            at,
            note,
        });
    }
}

/// Draft overlay holding not-yet-approved edits to a department's live
/// fields. Merged into the live record only when the structure is approved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<TypeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A department owning positions and version history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub code: String,
    pub vision: String,
    pub description: String,
    pub type_id: Option<TypeId>,
    pub parent_id: Option<DepartmentId>,
    pub color: String,
    pub status: DepartmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<DepartmentDraft>,
}

impl Department {
    /// Fold the draft overlay into the live fields and clear it.
    pub fn merge_draft(&mut self) {
        let Some(draft) = self.draft.take() else {
            return;
        };

        if let Some(name) = draft.name {
            self.name = name;
        }
        if let Some(code) = draft.code {
            self.code = code;
        }
        if let Some(vision) = draft.vision {
            self.vision = vision;
        }
        if let Some(description) = draft.description {
            self.description = description;
        }
        if let Some(type_id) = draft.type_id {
            self.type_id = Some(type_id);
        }
        if let Some(color) = draft.color {
            self.color = color;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentStatus {
    Active,
    Dissolved,
}

/// Employee record as mirrored from the external directory. Only the
/// fields this engine reads or clears are modeled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub position_id: Option<PositionId>,
    pub department_id: Option<DepartmentId>,
    pub first_name: String,
    pub last_name: String,
    pub employee_code: String,
}

/// Read-only projection of level ids to display names, built once per
/// operation from the lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelNames(pub BTreeMap<LevelId, String>);

impl LevelNames {
    pub fn resolve(&self, level_id: Option<&LevelId>) -> Option<String> {
        level_id.and_then(|id| self.0.get(id).cloned())
    }
}

/// Read-only projection of department type ids to display names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeNames(pub BTreeMap<TypeId, String>);

impl TypeNames {
    pub fn resolve(&self, type_id: Option<&TypeId>) -> Option<String> {
        type_id.and_then(|id| self.0.get(id).cloned())
    }
}
