//! src/runner.rs
//!
//! Runs the single-fault suite of one target. Every case gets a fresh harness
//! and its own panic boundary, so a case that faults during setup or
//! teardown is reported as that case's failure and the rest still run.

use crate::{
    error::Error,
    harness::{
        coverage::{self, TestCase},
        panic_message,
        report::{CaseReport, SuiteReport},
        NullArgumentHarness, TargetApi,
    },
    library::OpLibrary,
};
use std::panic::{self, AssertUnwindSafe};

pub struct SuiteRunner<'a, L: OpLibrary> {
    library: &'a mut L,
    include_control: bool,
}

impl<'a, L: OpLibrary> SuiteRunner<'a, L> {
    pub fn new(library: &'a mut L) -> Self {
        Self {
            library,
            include_control: true,
        }
    }

    /// Whether to run the all-arguments-valid case before the omission cases.
    pub fn with_control(mut self, include_control: bool) -> Self {
        self.include_control = include_control;
        self
    }

    pub fn run(&mut self, target: &dyn TargetApi) -> SuiteReport {
        let cases = coverage::single_fault_cases(target.arguments(), self.include_control);
        tracing::info!(api = target.name(), cases = cases.len(), "Running null-argument suite");

        let cases = cases
            .iter()
            .map(|case| self.run_case(target, case))
            .collect();
        let report = SuiteReport {
            target: target.name().to_string(),
            cases,
        };
        tracing::info!(
            api = %report.target,
            passed = report.passed(),
            failed = report.failed(),
            "Suite finished"
        );
        report
    }

    pub fn run_case(&mut self, target: &dyn TargetApi, case: &TestCase) -> CaseReport {
        let library = &mut *self.library;
        let report = match panic::catch_unwind(AssertUnwindSafe(|| execute(library, target, case))) {
            Ok(report) => report,
            Err(payload) => CaseReport::fault(
                case,
                format!(
                    "caught `{}` outside the target call in {}",
                    panic_message(payload.as_ref()),
                    target.name()
                ),
            ),
        };

        if report.passed() {
            tracing::info!(case = %report.name, "Case passed");
        } else {
            tracing::warn!(case = %report.name, detail = %report.describe(), "Case failed");
        }
        report
    }
}

fn execute<L: OpLibrary>(library: &mut L, target: &dyn TargetApi, case: &TestCase) -> CaseReport {
    let mut harness = NullArgumentHarness::new(library, target);
    match harness.configure(&case.selection) {
        Ok(()) => CaseReport::from_invocation(case, harness.invoke()),
        Err(Error::Setup { argument, status }) => CaseReport::setup_failed(case, argument, status),
        Err(e) => CaseReport::fault(case, e.to_string()),
    }
}
