//! Integration coverage for filled-count reconciliation against the
//! employee directory.

mod common {
    use std::sync::Arc;

    use org_roster::workflows::roster::{
        Department, DepartmentId, DepartmentStatus, Employee, EmployeeId, InMemoryRoster,
        Position, PositionId, RosterService, TypeId,
    };

    pub(super) type Service = RosterService<
        InMemoryRoster,
        InMemoryRoster,
        InMemoryRoster,
        InMemoryRoster,
        InMemoryRoster,
    >;

    pub(super) fn dept_id() -> DepartmentId {
        DepartmentId("dept-support".to_string())
    }

    pub(super) fn service() -> (Service, InMemoryRoster) {
        let store = InMemoryRoster::new();
        store.seed_department(Department {
            id: dept_id(),
            name: "Support".to_string(),
            code: "SUP".to_string(),
            vision: "Answer every ticket".to_string(),
            description: "Customer support".to_string(),
            type_id: Some(TypeId("type-support".to_string())),
            parent_id: None,
            color: "#22aa55".to_string(),
            status: DepartmentStatus::Active,
            draft: None,
        });
        let shared = Arc::new(store.clone());
        let service = RosterService::new(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared,
        );
        (service, store)
    }

    pub(super) fn seed_position(store: &InMemoryRoster, id: &str, filled: u32) -> PositionId {
        let mut position = Position::new(PositionId(id.to_string()), dept_id(), format!("Role {id}"));
        position.filled = filled;
        store.seed_position(position.clone());
        position.id
    }

    pub(super) fn seed_employee(store: &InMemoryRoster, id: &str, position: Option<&PositionId>) {
        store.seed_employee(Employee {
            id: EmployeeId(id.to_string()),
            position_id: position.cloned(),
            department_id: Some(dept_id()),
            first_name: "Kai".to_string(),
            last_name: "Moreno".to_string(),
            employee_code: format!("SUP-{id}"),
        });
    }
}

use common::*;
use org_roster::workflows::roster::PositionStore;

#[test]
fn drifted_counts_are_corrected_from_the_directory() {
    let (service, store) = service();
    let overstated = seed_position(&store, "pos-a", 5);
    let understated = seed_position(&store, "pos-b", 0);
    let accurate = seed_position(&store, "pos-c", 1);

    seed_employee(&store, "emp-1", Some(&overstated));
    seed_employee(&store, "emp-2", Some(&understated));
    seed_employee(&store, "emp-3", Some(&understated));
    seed_employee(&store, "emp-4", Some(&accurate));
    seed_employee(&store, "emp-5", None);

    let report = service
        .sync_filled_counts(&dept_id())
        .expect("reconciliation runs");
    assert_eq!(report.corrected, 2);

    let read = |id: &org_roster::workflows::roster::PositionId| {
        store
            .fetch(id)
            .expect("store readable")
            .expect("present")
            .filled
    };
    assert_eq!(read(&overstated), 1);
    assert_eq!(read(&understated), 2);
    assert_eq!(read(&accurate), 1);
}

#[test]
fn a_clean_second_run_corrects_nothing() {
    let (service, store) = service();
    let position = seed_position(&store, "pos-a", 9);
    seed_employee(&store, "emp-1", Some(&position));

    let first = service
        .sync_filled_counts(&dept_id())
        .expect("first pass runs");
    assert_eq!(first.corrected, 1);

    let second = service
        .sync_filled_counts(&dept_id())
        .expect("second pass runs");
    assert_eq!(second.corrected, 0);
}

#[test]
fn positions_with_no_employees_settle_at_zero() {
    let (service, store) = service();
    let empty = seed_position(&store, "pos-empty", 4);

    let report = service
        .sync_filled_counts(&dept_id())
        .expect("reconciliation runs");
    assert_eq!(report.corrected, 1);
    assert_eq!(
        store
            .fetch(&empty)
            .expect("store readable")
            .expect("present")
            .filled,
        0
    );
}
