//! tests/component/harness_lifecycle.rs
//!
//! Drives `NullArgumentHarness` directly, one case at a time.

use crate::common::harness::{FaultPlan, FaultyLibrary, WORKSPACE_ARGUMENTS};
use op_apitest::{
    domain::Status,
    harness::{coverage, InvocationResult, NullArgumentHarness, Selection, TargetApi},
    library::ReferenceLibrary,
    targets::IndiceConvolutionForwardWorkspace,
};
use test_log::test;

#[test]
fn each_omission_leaves_exactly_that_argument_absent() {
    let target = IndiceConvolutionForwardWorkspace::new();
    let mut library = ReferenceLibrary::new();

    for argument in WORKSPACE_ARGUMENTS {
        let case = coverage::omission_case(target.arguments(), argument).unwrap();
        let mut harness = NullArgumentHarness::new(&mut library, &target);
        harness.configure(&case.selection).unwrap();

        for other in WORKSPACE_ARGUMENTS {
            assert_eq!(harness.arguments().contains(other), other != argument, "{other}");
        }

        let invocation = harness.invoke();
        assert_eq!(invocation.omitted, vec![argument]);
        assert_eq!(invocation.result, InvocationResult::Returned(Status::BadParam));
        assert!(invocation.teardown_faults.is_empty());
        assert_eq!(library.live_resources(), 0, "{argument} case leaked");
    }
}

#[test]
fn rejected_query_leaves_the_output_slot_untouched() {
    let target = IndiceConvolutionForwardWorkspace::new();
    let mut library = ReferenceLibrary::new();
    let case = coverage::omission_case(target.arguments(), "features_desc").unwrap();

    let mut harness = NullArgumentHarness::new(&mut library, &target);
    harness.configure(&case.selection).unwrap();
    let invocation = harness.invoke();

    assert_eq!(invocation.outputs.get("workspace_size"), Some(&0));
}

#[test]
fn dropping_a_configured_harness_releases_everything() {
    let target = IndiceConvolutionForwardWorkspace::new();
    let mut library = ReferenceLibrary::new();
    let all: Selection = target.arguments().iter().map(|spec| spec.name).collect();

    {
        let mut harness = NullArgumentHarness::new(&mut library, &target);
        harness.configure(&all).unwrap();
    }
    assert_eq!(library.live_resources(), 0);
}

#[test]
fn fault_message_names_the_omitted_argument() {
    let target = IndiceConvolutionForwardWorkspace::new();
    let mut library = FaultyLibrary::new(FaultPlan {
        panic_in_query: Some("illegal address"),
        ..FaultPlan::default()
    });
    let case = coverage::omission_case(target.arguments(), "indice_pairs_desc").unwrap();

    let mut harness = NullArgumentHarness::new(&mut library, &target);
    harness.configure(&case.selection).unwrap();
    let invocation = harness.invoke();

    assert_eq!(
        invocation.result,
        InvocationResult::Fault {
            message: "caught `illegal address` in indice_convolution_forward_workspace \
                      with `indice_pairs_desc` omitted"
                .to_string()
        }
    );
    assert_eq!(library.live_resources(), 0);
}
