//! Integration coverage for the unassign cascade: a disapproval blocked on
//! assigned employees, the per-employee confirmation loop, exactly-once
//! auto-resume, and abandonment without compensation.

mod common {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};

    use org_roster::workflows::roster::{
        Actor, ApprovalBatch, Department, DepartmentId, DepartmentStatus, Employee, EmployeeId,
        InMemoryRoster, Position, PositionId, RosterService, TypeId,
    };

    pub(super) type Service = RosterService<
        InMemoryRoster,
        InMemoryRoster,
        InMemoryRoster,
        InMemoryRoster,
        InMemoryRoster,
    >;

    pub(super) fn dept_id() -> DepartmentId {
        DepartmentId("dept-ops".to_string())
    }

    pub(super) fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, 14, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    pub(super) fn disapproval(ids: Vec<PositionId>) -> ApprovalBatch {
        ApprovalBatch {
            department_id: dept_id(),
            position_ids: ids,
            at: at(),
            note: Some("role rescoped".to_string()),
            actor: Actor {
                id: "user-202".to_string(),
                display_name: "Imani Bell".to_string(),
            },
        }
    }

    /// One approved position with `count` assigned employees, plus the
    /// service wired over the shared in-memory store.
    pub(super) fn filled_position(count: usize) -> (Service, InMemoryRoster, PositionId) {
        let store = InMemoryRoster::new();
        store.seed_department(Department {
            id: dept_id(),
            name: "Operations".to_string(),
            code: "OPS".to_string(),
            vision: "Keep the lights on".to_string(),
            description: "Facilities and logistics".to_string(),
            type_id: Some(TypeId("type-support".to_string())),
            parent_id: None,
            color: "#884422".to_string(),
            status: DepartmentStatus::Active,
            draft: None,
        });

        let id = PositionId("pos-coordinator".to_string());
        let mut position = Position::new(id.clone(), dept_id(), "Logistics Coordinator");
        position.is_approved = true;
        position.filled = count as u32;
        store.seed_position(position);

        for n in 0..count {
            store.seed_employee(Employee {
                id: EmployeeId(format!("emp-{n}")),
                position_id: Some(id.clone()),
                department_id: Some(dept_id()),
                first_name: format!("First{n}"),
                last_name: format!("Last{n}"),
                employee_code: format!("OPS-{n:03}"),
            });
        }

        let shared = Arc::new(store.clone());
        let service = RosterService::new(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared,
        );
        (service, store, id)
    }
}

use common::*;
use org_roster::workflows::roster::{
    CascadeError, CascadeStep, DisapprovalOutcome, EmployeeId, PositionStore, UnassignCascade,
};

#[test]
fn blocked_disapproval_returns_the_full_queue_without_mutating() {
    let (service, store, position) = filled_position(2);

    let outcome = service
        .disapprove_positions(&disapproval(vec![position.clone()]))
        .expect("disapproval evaluates");

    let DisapprovalOutcome::Blocked { queue } = outcome else {
        panic!("expected a blocked outcome");
    };
    assert_eq!(queue.len(), 2);
    assert!(queue.iter().all(|entry| entry.position_id == position));

    let current = store
        .fetch(&position)
        .expect("store readable")
        .expect("present");
    assert!(current.is_approved, "blocked path must not flip state");
    assert_eq!(current.filled, 2);
    assert!(store.employee(&EmployeeId("emp-0".to_string()))
        .expect("employee present")
        .position_id
        .is_some());
}

#[test]
fn cascade_drains_the_queue_then_resumes_the_disapproval() {
    let (service, store, position) = filled_position(2);
    let batch = disapproval(vec![position.clone()]);

    let DisapprovalOutcome::Blocked { queue } = service
        .disapprove_positions(&batch)
        .expect("disapproval evaluates")
    else {
        panic!("expected a blocked outcome");
    };

    let mut cascade = UnassignCascade::new(batch, queue);
    assert_eq!(cascade.remaining(), 2);
    assert_eq!(cascade.processed(), 0);

    let step = cascade.advance(&service).expect("first step runs");
    let CascadeStep::AwaitingConfirmation {
        unassigned,
        remaining,
        next,
        ..
    } = step
    else {
        panic!("first step should await confirmation");
    };
    assert_eq!(remaining, 1);
    assert_eq!(cascade.remaining(), 1);
    assert_eq!(cascade.processed(), 1);
    assert_ne!(unassigned, next.employee_id);

    // Partway through: one link cleared, the position still approved.
    let midway = store
        .fetch(&position)
        .expect("store readable")
        .expect("present");
    assert!(midway.is_approved);
    assert_eq!(midway.filled, 1);
    assert!(store
        .employee(&unassigned)
        .expect("employee present")
        .position_id
        .is_none());

    let step = cascade.advance(&service).expect("final step runs");
    let CascadeStep::Completed {
        unassigned: cleared,
        outcome,
    } = step
    else {
        panic!("final step should complete the cascade");
    };
    assert_eq!(cleared, 2);
    assert!(matches!(outcome, DisapprovalOutcome::Applied { .. }));

    let done = store
        .fetch(&position)
        .expect("store readable")
        .expect("present");
    assert!(!done.is_approved);
    assert_eq!(done.filled, 0);
}

#[test]
fn completed_cascade_refuses_further_steps() {
    let (service, _store, position) = filled_position(1);
    let batch = disapproval(vec![position]);

    let DisapprovalOutcome::Blocked { queue } = service
        .disapprove_positions(&batch)
        .expect("disapproval evaluates")
    else {
        panic!("expected a blocked outcome");
    };

    let mut cascade = UnassignCascade::new(batch, queue);
    let step = cascade.advance(&service).expect("single step completes");
    assert!(matches!(step, CascadeStep::Completed { unassigned: 1, .. }));

    let error = cascade
        .advance(&service)
        .expect_err("resume happens exactly once");
    assert!(matches!(error, CascadeError::AlreadyCompleted));
}

#[test]
fn abandoning_the_cascade_keeps_completed_unassignments() {
    let (service, store, position) = filled_position(3);
    let batch = disapproval(vec![position.clone()]);

    let DisapprovalOutcome::Blocked { queue } = service
        .disapprove_positions(&batch)
        .expect("disapproval evaluates")
    else {
        panic!("expected a blocked outcome");
    };

    let mut cascade = UnassignCascade::new(batch, queue);
    cascade.advance(&service).expect("first step runs");
    drop(cascade);

    // No rollback of the processed step, no retry of the disapproval.
    let current = store
        .fetch(&position)
        .expect("store readable")
        .expect("present");
    assert!(current.is_approved);
    assert_eq!(current.filled, 2);
}

#[test]
fn queue_lists_earlier_targets_before_later_ones() {
    let (service, store, first) = filled_position(1);

    let second = org_roster::workflows::roster::PositionId("pos-dispatcher".to_string());
    let mut position =
        org_roster::workflows::roster::Position::new(second.clone(), dept_id(), "Dispatcher");
    position.is_approved = true;
    position.filled = 1;
    store.seed_position(position);
    store.seed_employee(org_roster::workflows::roster::Employee {
        id: EmployeeId("emp-late".to_string()),
        position_id: Some(second.clone()),
        department_id: Some(dept_id()),
        first_name: "Noor".to_string(),
        last_name: "Haddad".to_string(),
        employee_code: "OPS-900".to_string(),
    });

    let DisapprovalOutcome::Blocked { queue } = service
        .disapprove_positions(&disapproval(vec![first.clone(), second.clone()]))
        .expect("disapproval evaluates")
    else {
        panic!("expected a blocked outcome");
    };

    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].position_id, first);
    assert_eq!(queue[1].position_id, second);
}
