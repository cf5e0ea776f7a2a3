//! tests/integration/coverage_properties.rs
//!
//! Property-based checks of the single-fault coverage rule over arbitrary
//! argument tables, plus a check against the reference library for every
//! single omission.

use op_apitest::{
    domain::Status,
    harness::{
        coverage::{single_fault_cases, CONTROL_CASE},
        ArgumentKind, ArgumentSpec, InvocationResult, NullArgumentHarness, Selection, TargetApi,
    },
    library::ReferenceLibrary,
    targets::IndiceConvolutionForwardWorkspace,
};
use proptest::prelude::*;

const NAMES: [&str; 10] = [
    "handle", "input", "weight", "bias", "index", "output", "counts", "scale", "slot", "stream",
];

fn table(flags: &[bool]) -> Vec<ArgumentSpec> {
    flags
        .iter()
        .zip(NAMES)
        .map(|(&required, name)| {
            if required {
                ArgumentSpec::required(name, ArgumentKind::OutputSlot)
            } else {
                ArgumentSpec::optional(name, ArgumentKind::OutputSlot)
            }
        })
        .collect()
}

proptest! {
    /// Property: k required arguments give exactly k omission cases.
    #[test]
    fn case_count_matches_required_count(
        flags in prop::collection::vec(any::<bool>(), 0..NAMES.len()),
        include_control in any::<bool>(),
    ) {
        let arguments = table(&flags);
        let required = flags.iter().filter(|&&f| f).count();
        let cases = single_fault_cases(&arguments, include_control);
        prop_assert_eq!(cases.len(), required + usize::from(include_control));
    }

    /// Property: every generated case omits at most one argument, and that
    /// argument is required.
    #[test]
    fn cases_are_single_fault(flags in prop::collection::vec(any::<bool>(), 0..NAMES.len())) {
        let arguments = table(&flags);
        for case in single_fault_cases(&arguments, true) {
            let missing: Vec<_> = arguments
                .iter()
                .filter(|spec| !case.selection.contains(spec.name))
                .collect();
            match case.omitted {
                None => {
                    prop_assert_eq!(case.name.as_str(), CONTROL_CASE);
                    prop_assert!(missing.is_empty());
                }
                Some(name) => {
                    prop_assert_eq!(missing.len(), 1);
                    prop_assert_eq!(missing[0].name, name);
                    prop_assert!(missing[0].required);
                    prop_assert_eq!(case.expected, Status::BadParam);
                }
            }
        }
    }

    /// Property: the reference library rejects any single omission.
    #[test]
    fn reference_library_rejects_any_single_omission(index in 0usize..7) {
        let target = IndiceConvolutionForwardWorkspace::new();
        let omitted = target.arguments()[index].name;
        let selection: Selection = target
            .arguments()
            .iter()
            .map(|spec| spec.name)
            .filter(|name| *name != omitted)
            .collect();

        let mut library = ReferenceLibrary::new();
        let mut harness = NullArgumentHarness::new(&mut library, &target);
        harness.configure(&selection).unwrap();
        let invocation = harness.invoke();

        prop_assert_eq!(invocation.result, InvocationResult::Returned(Status::BadParam));
        prop_assert_eq!(library.live_resources(), 0);
    }
}
