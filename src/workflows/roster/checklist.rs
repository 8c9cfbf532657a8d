use serde::Serialize;

use super::domain::{Department, Position};

/// The named checks gating whole-structure approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItem {
    HasName,
    HasCode,
    HasType,
    HasVision,
    HasDescription,
    HasColor,
    HasPositions,
    AllPositionsApproved,
}

impl ChecklistItem {
    pub const fn label(self) -> &'static str {
        match self {
            Self::HasName => "department name missing",
            Self::HasCode => "department code missing",
            Self::HasType => "department type missing",
            Self::HasVision => "vision statement missing",
            Self::HasDescription => "description missing",
            Self::HasColor => "display color missing",
            Self::HasPositions => "no positions defined",
            Self::AllPositionsApproved => "unapproved positions remain",
        }
    }
}

/// Structured verdict on whether a department is ready for structure
/// approval. Every check is reported individually so callers can surface
/// the exact gaps.
#[derive(Debug, Clone, Serialize)]
pub struct StructureChecklist {
    pub has_name: bool,
    pub has_code: bool,
    pub has_type: bool,
    pub has_vision: bool,
    pub has_description: bool,
    pub has_color: bool,
    pub has_positions: bool,
    pub all_positions_approved: bool,
    pub unapproved_count: usize,
}

impl StructureChecklist {
    pub fn evaluate(department: &Department, positions: &[Position]) -> Self {
        let unapproved_count = positions.iter().filter(|p| !p.is_approved).count();
        Self {
            has_name: !department.name.trim().is_empty(),
            has_code: !department.code.trim().is_empty(),
            has_type: department.type_id.is_some(),
            has_vision: !department.vision.trim().is_empty(),
            has_description: !department.description.trim().is_empty(),
            has_color: !department.color.trim().is_empty(),
            has_positions: !positions.is_empty(),
            all_positions_approved: !positions.is_empty() && unapproved_count == 0,
            unapproved_count,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.has_name
            && self.has_code
            && self.has_type
            && self.has_vision
            && self.has_description
            && self.has_color
            && self.has_positions
            && self.all_positions_approved
    }

    /// Failing items, the unapproved-position check first since it is the
    /// primary blocking reason reported to actors.
    pub fn failed_checks(&self) -> Vec<ChecklistItem> {
        let mut failed = Vec::new();
        if self.has_positions && !self.all_positions_approved {
            failed.push(ChecklistItem::AllPositionsApproved);
        }
        if !self.has_name {
            failed.push(ChecklistItem::HasName);
        }
        if !self.has_code {
            failed.push(ChecklistItem::HasCode);
        }
        if !self.has_type {
            failed.push(ChecklistItem::HasType);
        }
        if !self.has_vision {
            failed.push(ChecklistItem::HasVision);
        }
        if !self.has_description {
            failed.push(ChecklistItem::HasDescription);
        }
        if !self.has_color {
            failed.push(ChecklistItem::HasColor);
        }
        if !self.has_positions {
            failed.push(ChecklistItem::HasPositions);
        }
        failed
    }
}
