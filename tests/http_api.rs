//! Endpoint-level coverage for the roster router: status-code mapping for
//! validation failures, blocked disapprovals, and constraint violations.

mod common {
    use std::sync::Arc;

    use axum::Router;

    use org_roster::workflows::roster::{
        roster_router, Actor, Department, DepartmentId, DepartmentStatus, Employee, EmployeeId,
        InMemoryRoster, Position, PositionId, RosterService, TypeId,
    };

    pub(super) fn dept_id() -> DepartmentId {
        DepartmentId("dept-eng".to_string())
    }

    /// Router over a department with one approved+filled position and one
    /// unapproved one.
    pub(super) fn router() -> (Router, InMemoryRoster) {
        let store = InMemoryRoster::new();
        store.seed_department(Department {
            id: dept_id(),
            name: "Engineering".to_string(),
            code: "ENG".to_string(),
            vision: "Ship reliable software".to_string(),
            description: "Product engineering".to_string(),
            type_id: Some(TypeId("type-core".to_string())),
            parent_id: None,
            color: "#112233".to_string(),
            status: DepartmentStatus::Active,
            draft: None,
        });

        let staffed = PositionId("pos-staffed".to_string());
        let mut position = Position::new(staffed.clone(), dept_id(), "Staff Engineer");
        position.record_approval(
            chrono::Utc::now(),
            None,
            &Actor {
                id: "user-1".to_string(),
                display_name: "Admin".to_string(),
            },
        );
        position.filled = 1;
        store.seed_position(position);

        store.seed_position(Position::new(
            PositionId("pos-open".to_string()),
            dept_id(),
            "Platform Engineer",
        ));

        store.seed_employee(Employee {
            id: EmployeeId("emp-1".to_string()),
            position_id: Some(staffed),
            department_id: Some(dept_id()),
            first_name: "Devon".to_string(),
            last_name: "Price".to_string(),
            employee_code: "ENG-001".to_string(),
        });

        let shared = Arc::new(store.clone());
        let service = Arc::new(RosterService::new(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared,
        ));
        (roster_router(service), store)
    }

    pub(super) fn json_post(uri: &str, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .expect("request builds")
    }
}

use axum::body::to_bytes;
use axum::http::StatusCode;
use common::*;
use serde_json::{json, Value};
use tower::util::ServiceExt;

#[tokio::test]
async fn approving_an_incomplete_structure_returns_422_with_the_count() {
    let (router, _store) = router();

    let response = router
        .oneshot(json_post(
            "/api/v1/roster/departments/dept-eng/structure/approve",
            json!({ "approved_at": "2026-05-01T09:00:00Z" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let payload: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(payload["unapproved_count"], 1);
    assert_eq!(payload["failed_checks"][0], "all_positions_approved");
}

#[tokio::test]
async fn blocked_disapproval_returns_409_with_the_queue() {
    let (router, _store) = router();

    let response = router
        .oneshot(json_post(
            "/api/v1/roster/departments/dept-eng/positions/disapprove",
            json!({
                "position_ids": ["pos-staffed"],
                "at": "2026-05-01T09:00:00Z",
                "actor_id": "user-1",
                "actor_name": "Admin",
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let payload: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(payload["outcome"], "blocked");
    assert_eq!(payload["queue"][0]["employee_id"], "emp-1");
}

#[tokio::test]
async fn deleting_an_approved_position_returns_409() {
    let (router, _store) = router();

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .method("DELETE")
                .uri("/api/v1/roster/positions/pos-staffed")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn deleting_an_unapproved_position_returns_204() {
    let (router, _store) = router();

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .method("DELETE")
                .uri("/api/v1/roster/positions/pos-open")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn approving_positions_then_the_structure_succeeds() {
    let (router, _store) = router();

    let response = router
        .clone()
        .oneshot(json_post(
            "/api/v1/roster/departments/dept-eng/positions/approve",
            json!({
                "position_ids": ["pos-open"],
                "at": "2026-05-01T09:00:00Z",
                "note": "filling out the team",
                "actor_id": "user-1",
                "actor_name": "Admin",
            }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(json_post(
            "/api/v1/roster/departments/dept-eng/structure/approve",
            json!({ "approved_at": "2026-05-01T10:00:00Z" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn tree_endpoint_returns_the_forest() {
    let (router, _store) = router();

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .method("GET")
                .uri("/api/v1/roster/departments/dept-eng/tree")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let payload: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(payload.as_array().map(Vec::len), Some(2));
}
