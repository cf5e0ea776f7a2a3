//! src/harness/coverage.rs
//!
//! Single-fault coverage: one case per required argument, each leaving out
//! exactly that argument, plus an optional control case that leaves out
//! nothing. Combinations of omissions are never generated.

use crate::{
    domain::Status,
    harness::{ArgumentSpec, Selection},
};

/// Name of the case that constructs every argument.
pub const CONTROL_CASE: &str = "success_all_arguments_valid";

/// One configuration of the target's arguments and the status it must produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    /// The argument left out, or `None` for the control case.
    pub omitted: Option<&'static str>,
    pub selection: Selection,
    pub expected: Status,
}

/// The case that builds every argument and expects success.
pub fn control_case(arguments: &[ArgumentSpec]) -> TestCase {
    TestCase {
        name: CONTROL_CASE.to_string(),
        omitted: None,
        selection: arguments.iter().map(|spec| spec.name).collect(),
        expected: Status::Success,
    }
}

/// The case that leaves out `name`. `None` if `name` is not a required argument.
pub fn omission_case(arguments: &[ArgumentSpec], name: &str) -> Option<TestCase> {
    let omitted = arguments
        .iter()
        .find(|spec| spec.required && spec.name == name)?
        .name;
    Some(TestCase {
        name: format!("bad_param_{omitted}_null"),
        omitted: Some(omitted),
        selection: arguments
            .iter()
            .map(|spec| spec.name)
            .filter(|candidate| *candidate != omitted)
            .collect(),
        expected: Status::BadParam,
    })
}

/// The control case (if requested) followed by one omission case per
/// required argument, in table order.
pub fn single_fault_cases(arguments: &[ArgumentSpec], include_control: bool) -> Vec<TestCase> {
    let control = include_control.then(|| control_case(arguments));
    control
        .into_iter()
        .chain(
            arguments
                .iter()
                .filter(|spec| spec.required)
                .filter_map(|spec| omission_case(arguments, spec.name)),
        )
        .collect()
}
