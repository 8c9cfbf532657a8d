use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::approval::{ApprovalBatch, ApprovalError, DisapprovalOutcome};
use super::domain::{Actor, DepartmentId, EmployeeId, PositionId};
use super::repository::{
    DepartmentStore, EmployeeDirectory, LookupTables, PositionStore, RepositoryError, VersionStore,
};
use super::service::RosterService;
use super::versioning::StructureApprovalError;

/// Router builder exposing the roster engine contract as JSON endpoints.
pub fn roster_router<P, D, E, V, L>(service: Arc<RosterService<P, D, E, V, L>>) -> Router
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    Router::new()
        .route(
            "/api/v1/roster/departments/:department_id/positions/approve",
            post(approve_handler::<P, D, E, V, L>),
        )
        .route(
            "/api/v1/roster/departments/:department_id/positions/disapprove",
            post(disapprove_handler::<P, D, E, V, L>),
        )
        .route(
            "/api/v1/roster/departments/:department_id/structure/approve",
            post(approve_structure_handler::<P, D, E, V, L>),
        )
        .route(
            "/api/v1/roster/departments/:department_id/structure/dissolve",
            post(dissolve_structure_handler::<P, D, E, V, L>),
        )
        .route(
            "/api/v1/roster/departments/:department_id/sync-filled",
            post(sync_filled_handler::<P, D, E, V, L>),
        )
        .route(
            "/api/v1/roster/departments/:department_id/tree",
            get(tree_handler::<P, D, E, V, L>),
        )
        .route(
            "/api/v1/roster/departments/:department_id/versions",
            get(versions_handler::<P, D, E, V, L>),
        )
        .route(
            "/api/v1/roster/positions/:position_id",
            delete(delete_position_handler::<P, D, E, V, L>),
        )
        .route(
            "/api/v1/roster/positions/:position_id/duplicate",
            post(duplicate_position_handler::<P, D, E, V, L>),
        )
        .route(
            "/api/v1/roster/employees/:employee_id/unassign",
            post(unassign_handler::<P, D, E, V, L>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApprovalRequest {
    pub(crate) position_ids: Vec<String>,
    pub(crate) at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) note: Option<String>,
    pub(crate) actor_id: String,
    pub(crate) actor_name: String,
}

impl ApprovalRequest {
    fn into_batch(self, department_id: String) -> ApprovalBatch {
        ApprovalBatch {
            department_id: DepartmentId(department_id),
            position_ids: self.position_ids.into_iter().map(PositionId).collect(),
            at: self.at,
            note: self.note,
            actor: Actor {
                id: self.actor_id,
                display_name: self.actor_name,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StructureApprovalRequest {
    pub(crate) approved_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnassignRequest {
    pub(crate) position_id: String,
}

pub(crate) async fn approve_handler<P, D, E, V, L>(
    State(service): State<Arc<RosterService<P, D, E, V, L>>>,
    Path(department_id): Path<String>,
    axum::Json(request): axum::Json<ApprovalRequest>,
) -> Response
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    let batch = request.into_batch(department_id);
    match service.approve_positions(&batch) {
        Ok(positions) => {
            (StatusCode::OK, axum::Json(json!({ "approved": positions }))).into_response()
        }
        Err(error) => approval_error_response(error),
    }
}

pub(crate) async fn disapprove_handler<P, D, E, V, L>(
    State(service): State<Arc<RosterService<P, D, E, V, L>>>,
    Path(department_id): Path<String>,
    axum::Json(request): axum::Json<ApprovalRequest>,
) -> Response
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    let batch = request.into_batch(department_id);
    match service.disapprove_positions(&batch) {
        Ok(outcome @ DisapprovalOutcome::Applied { .. }) => {
            (StatusCode::OK, axum::Json(outcome)).into_response()
        }
        // Blocked carries the unassignment queue; the client drives the
        // cascade through the unassign endpoint and re-issues the call.
        Ok(outcome @ DisapprovalOutcome::Blocked { .. }) => {
            (StatusCode::CONFLICT, axum::Json(outcome)).into_response()
        }
        Err(error) => approval_error_response(error),
    }
}

pub(crate) async fn approve_structure_handler<P, D, E, V, L>(
    State(service): State<Arc<RosterService<P, D, E, V, L>>>,
    Path(department_id): Path<String>,
    axum::Json(request): axum::Json<StructureApprovalRequest>,
) -> Response
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    let department_id = DepartmentId(department_id);
    match service.approve_structure(&department_id, request.approved_at) {
        Ok(approval) => (StatusCode::CREATED, axum::Json(approval)).into_response(),
        Err(error) => structure_error_response(error),
    }
}

pub(crate) async fn dissolve_structure_handler<P, D, E, V, L>(
    State(service): State<Arc<RosterService<P, D, E, V, L>>>,
    Path(department_id): Path<String>,
    axum::Json(request): axum::Json<StructureApprovalRequest>,
) -> Response
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    let department_id = DepartmentId(department_id);
    match service.dissolve_structure(&department_id, request.approved_at) {
        Ok(approval) => (StatusCode::CREATED, axum::Json(approval)).into_response(),
        Err(error) => structure_error_response(error),
    }
}

pub(crate) async fn sync_filled_handler<P, D, E, V, L>(
    State(service): State<Arc<RosterService<P, D, E, V, L>>>,
    Path(department_id): Path<String>,
) -> Response
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    let department_id = DepartmentId(department_id);
    match service.sync_filled_counts(&department_id) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => repository_error_response(error),
    }
}

pub(crate) async fn tree_handler<P, D, E, V, L>(
    State(service): State<Arc<RosterService<P, D, E, V, L>>>,
    Path(department_id): Path<String>,
) -> Response
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    let department_id = DepartmentId(department_id);
    match service.structure_tree(&department_id) {
        Ok(forest) => (StatusCode::OK, axum::Json(forest)).into_response(),
        Err(error) => repository_error_response(error),
    }
}

pub(crate) async fn versions_handler<P, D, E, V, L>(
    State(service): State<Arc<RosterService<P, D, E, V, L>>>,
    Path(department_id): Path<String>,
) -> Response
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    let department_id = DepartmentId(department_id);
    match service.structure_versions(&department_id) {
        Ok(versions) => (StatusCode::OK, axum::Json(versions)).into_response(),
        Err(error) => repository_error_response(error),
    }
}

pub(crate) async fn delete_position_handler<P, D, E, V, L>(
    State(service): State<Arc<RosterService<P, D, E, V, L>>>,
    Path(position_id): Path<String>,
) -> Response
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    let position_id = PositionId(position_id);
    match service.delete_position(&position_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => approval_error_response(error),
    }
}

pub(crate) async fn duplicate_position_handler<P, D, E, V, L>(
    State(service): State<Arc<RosterService<P, D, E, V, L>>>,
    Path(position_id): Path<String>,
) -> Response
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    let position_id = PositionId(position_id);
    match service.duplicate_position(&position_id) {
        Ok(copy) => (
            StatusCode::CREATED,
            axum::Json(json!({ "position_id": copy })),
        )
            .into_response(),
        Err(error) => approval_error_response(error),
    }
}

pub(crate) async fn unassign_handler<P, D, E, V, L>(
    State(service): State<Arc<RosterService<P, D, E, V, L>>>,
    Path(employee_id): Path<String>,
    axum::Json(request): axum::Json<UnassignRequest>,
) -> Response
where
    P: PositionStore + 'static,
    D: DepartmentStore + 'static,
    E: EmployeeDirectory + 'static,
    V: VersionStore + 'static,
    L: LookupTables + 'static,
{
    let employee_id = EmployeeId(employee_id);
    let position_id = PositionId(request.position_id);
    match service.clear_assignment(&employee_id, &position_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => repository_error_response(error),
    }
}

fn approval_error_response(error: ApprovalError) -> Response {
    let status = match &error {
        ApprovalError::Constraint(_) => StatusCode::CONFLICT,
        ApprovalError::PositionNotFound(_) => StatusCode::NOT_FOUND,
        ApprovalError::WrongDepartment { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ApprovalError::Repository(repository) => repository_status(repository),
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn structure_error_response(error: StructureApprovalError) -> Response {
    match &error {
        StructureApprovalError::Incomplete { checklist } => {
            let payload = json!({
                "error": error.to_string(),
                "failed_checks": checklist.failed_checks(),
                "unapproved_count": checklist.unapproved_count,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        StructureApprovalError::DepartmentNotFound => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        StructureApprovalError::Repository(repository) => {
            let status = repository_status(repository);
            let payload = json!({ "error": error.to_string() });
            (status, axum::Json(payload)).into_response()
        }
    }
}

fn repository_error_response(error: RepositoryError) -> Response {
    let status = repository_status(&error);
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn repository_status(error: &RepositoryError) -> StatusCode {
    match error {
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
