//! tests/component/fault_injection.rs
//!
//! Runs the workspace-query suite against libraries that misbehave in one
//! specific way and checks that each misbehaviour is reported as the right
//! kind of failure, on the right cases, without stopping the run.

use crate::common::harness::{
    omission_case_name, run_workspace_suite, FaultPlan, FaultyLibrary, WORKSPACE_ARGUMENTS,
};
use op_apitest::{
    domain::Status,
    harness::{
        coverage::CONTROL_CASE,
        report::{Outcome, TeardownFault, TeardownStage},
    },
};
use test_log::test;

#[test]
fn library_accepting_a_null_output_slot_is_reported_as_unexpected() {
    let mut library = FaultyLibrary::new(FaultPlan {
        accept_missing: Some("workspace_size"),
        ..FaultPlan::default()
    });
    let report = run_workspace_suite(&mut library);

    assert_eq!(report.cases.len(), 8);
    assert_eq!(report.failed(), 1, "only the output-slot case should fail");

    let case = report.case(&omission_case_name("workspace_size")).unwrap();
    assert_eq!(
        case.outcome,
        Outcome::Unexpected {
            expected: Status::BadParam,
            actual: Status::Success
        }
    );
    assert!(case.describe().contains("`workspace_size` omitted"));
    assert_eq!(library.live_resources(), 0);
}

#[test]
fn panicking_query_is_caught_per_case_and_resources_are_released() {
    let mut library = FaultyLibrary::new(FaultPlan {
        panic_in_query: Some("kernel trap"),
        ..FaultPlan::default()
    });
    let report = run_workspace_suite(&mut library);

    assert_eq!(report.cases.len(), 8, "a fault must not abort the run");
    assert_eq!(report.passed(), 0);
    assert_eq!(library.queries(), 8);

    for argument in WORKSPACE_ARGUMENTS {
        let case = report.case(&omission_case_name(argument)).unwrap();
        let Outcome::Fault { message } = &case.outcome else {
            panic!("expected a fault for {argument}, got {:?}", case.outcome);
        };
        assert!(message.contains("kernel trap"), "{message}");
        assert!(message.contains(&format!("`{argument}` omitted")), "{message}");
        assert!(case.teardown_faults.is_empty());
    }
    assert_eq!(library.live_resources(), 0);
}

#[test]
fn failed_queue_sync_is_a_teardown_fault_that_keeps_the_primary_outcome() {
    let mut library = FaultyLibrary::new(FaultPlan {
        fail_queue_sync: Some(Status::ExecutionFailed),
        ..FaultPlan::default()
    });
    let report = run_workspace_suite(&mut library);

    // Only the case without a handle has nothing to sync.
    assert_eq!(report.passed(), 1);
    assert!(report.case(&omission_case_name("handle")).unwrap().passed());

    let control = report.case(CONTROL_CASE).unwrap();
    assert_eq!(control.outcome, Outcome::Expected { status: Status::Success });
    assert_eq!(
        control.teardown_faults,
        vec![TeardownFault::returned(
            "handle",
            TeardownStage::QueueSync,
            Status::ExecutionFailed,
        )]
    );
    // The handle is still destroyed after the failed wait.
    assert_eq!(library.live_resources(), 0);
}

#[test]
fn every_failed_descriptor_release_is_recorded() {
    let mut library = FaultyLibrary::new(FaultPlan {
        fail_destroy_descriptor: Some(Status::InternalError),
        ..FaultPlan::default()
    });
    let report = run_workspace_suite(&mut library);

    assert_eq!(report.passed(), 0);
    let control = report.case(CONTROL_CASE).unwrap();
    assert_eq!(control.teardown_faults.len(), 4);
    assert!(control
        .teardown_faults
        .iter()
        .all(|fault| fault.stage == TeardownStage::DestroyDescriptor));

    let filters_null = report.case(&omission_case_name("filters_desc")).unwrap();
    assert_eq!(filters_null.outcome, Outcome::Expected { status: Status::BadParam });
    let released: Vec<_> = filters_null.teardown_faults.iter().map(|f| f.argument).collect();
    assert_eq!(released, ["features_desc", "indice_pairs_desc", "features_out_desc"]);
}

#[test]
fn handle_creation_failure_is_a_setup_failure() {
    let mut library = FaultyLibrary::new(FaultPlan {
        fail_create_handle: Some(Status::AllocFailed),
        ..FaultPlan::default()
    });
    let report = run_workspace_suite(&mut library);

    assert_eq!(
        report.case(CONTROL_CASE).unwrap().outcome,
        Outcome::SetupFailed {
            argument: "handle",
            status: Status::AllocFailed
        }
    );
    // The handle-null case never needs a handle, so it still runs and passes.
    assert!(report.case(&omission_case_name("handle")).unwrap().passed());
    assert_eq!(report.passed(), 1);
    assert_eq!(library.queries(), 1);
    assert_eq!(library.live_resources(), 0);
}

#[test]
fn panic_during_teardown_keeps_the_primary_outcome_and_releases_the_rest() {
    let mut library = FaultyLibrary::new(FaultPlan {
        panic_in_destroy_handle: true,
        ..FaultPlan::default()
    });
    let report = run_workspace_suite(&mut library);

    assert_eq!(report.cases.len(), 8);
    // Only the case without a handle has no handle to destroy.
    assert_eq!(report.passed(), 1);

    let control = report.case(CONTROL_CASE).unwrap();
    assert_eq!(control.outcome, Outcome::Expected { status: Status::Success });
    assert_eq!(control.outputs.get("workspace_size"), Some(&2080));
    let [fault] = control.teardown_faults.as_slice() else {
        panic!("expected one teardown fault, got {:?}", control.teardown_faults);
    };
    assert_eq!(fault.argument, "handle");
    assert_eq!(fault.stage, TeardownStage::DestroyHandle);
    assert_eq!(fault.status, Status::InternalError);
    assert!(fault.panic.as_deref().is_some_and(|m| m.contains("driver lost")), "{fault}");

    let filters_null = report.case(&omission_case_name("filters_desc")).unwrap();
    assert_eq!(filters_null.outcome, Outcome::Expected { status: Status::BadParam });
    assert_eq!(filters_null.teardown_faults.len(), 1);

    // Descriptors built after the handle are still released.
    assert_eq!(library.live_resources(), 0);
}

#[test]
fn panic_while_syncing_still_destroys_the_handle() {
    let mut library = FaultyLibrary::new(FaultPlan {
        panic_in_queue_sync: true,
        ..FaultPlan::default()
    });
    let report = run_workspace_suite(&mut library);

    let control = report.case(CONTROL_CASE).unwrap();
    assert_eq!(control.outcome, Outcome::Expected { status: Status::Success });
    let stages: Vec<_> = control.teardown_faults.iter().map(|f| f.stage).collect();
    assert_eq!(stages, [TeardownStage::QueueSync]);
    assert_eq!(library.live_resources(), 0);
}

#[test]
fn panic_during_setup_is_a_fault_and_the_handle_is_released() {
    let mut library = FaultyLibrary::new(FaultPlan {
        panic_in_create_descriptor: true,
        ..FaultPlan::default()
    });
    let report = run_workspace_suite(&mut library);

    assert_eq!(report.cases.len(), 8);
    assert_eq!(report.passed(), 0);
    assert_eq!(library.queries(), 0);
    let control = report.case(CONTROL_CASE).unwrap();
    let Outcome::Fault { message } = &control.outcome else {
        panic!("expected a fault, got {:?}", control.outcome);
    };
    assert!(message.contains("outside the target call"), "{message}");
    assert!(message.contains("descriptor pool corrupted"), "{message}");
    assert_eq!(library.live_resources(), 0);
}
