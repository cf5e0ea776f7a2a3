//! src/harness/report.rs
//!
//! Classifies invocations into per-case reports and aggregates them into a
//! suite report. Reports serialize to JSON for the `op-apitest` binary.

use crate::{
    domain::Status,
    error::Result,
    harness::{coverage::TestCase, omitted_label, Invocation, InvocationResult},
};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

/// The teardown step a `TeardownFault` came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownStage {
    QueueSync,
    DestroyHandle,
    DestroyDescriptor,
}

impl TeardownStage {
    /// The library call this stage performs.
    pub fn call_name(self) -> &'static str {
        match self {
            TeardownStage::QueueSync => "queue_sync",
            TeardownStage::DestroyHandle => "destroy_handle",
            TeardownStage::DestroyDescriptor => "destroy_tensor_descriptor",
        }
    }
}

/// A release step that did not return success, or panicked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TeardownFault {
    pub argument: &'static str,
    pub stage: TeardownStage,
    /// `INTERNAL_ERROR` when the step panicked.
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panic: Option<String>,
}

impl TeardownFault {
    pub fn returned(argument: &'static str, stage: TeardownStage, status: Status) -> Self {
        Self {
            argument,
            stage,
            status,
            panic: None,
        }
    }

    pub fn panicked(argument: &'static str, stage: TeardownStage, message: String) -> Self {
        Self {
            argument,
            stage,
            status: Status::InternalError,
            panic: Some(message),
        }
    }
}

impl fmt::Display for TeardownFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.panic {
            Some(message) => write!(
                f,
                "{} of `{}` panicked with `{}`",
                self.stage.call_name(),
                self.argument,
                message
            ),
            None => write!(
                f,
                "{} of `{}` returned {}",
                self.stage.call_name(),
                self.argument,
                self.status
            ),
        }
    }
}

/// The primary result of one case. Teardown faults are tracked separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The target returned the status the case expects.
    Expected { status: Status },
    /// The target returned any other status.
    Unexpected { expected: Status, actual: Status },
    /// The target, or the case around it, panicked.
    Fault { message: String },
    /// A valid argument could not be built, so the target was never called.
    SetupFailed { argument: &'static str, status: Status },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub omitted: Option<&'static str>,
    pub expected: Status,
    pub outcome: Outcome,
    pub outputs: BTreeMap<&'static str, usize>,
    pub teardown_faults: Vec<TeardownFault>,
}

impl CaseReport {
    pub fn from_invocation(case: &TestCase, invocation: Invocation) -> Self {
        let outcome = match invocation.result {
            InvocationResult::Returned(status) if status == case.expected => {
                Outcome::Expected { status }
            }
            InvocationResult::Returned(actual) => Outcome::Unexpected {
                expected: case.expected,
                actual,
            },
            InvocationResult::Fault { message } => Outcome::Fault { message },
        };
        Self {
            outcome,
            outputs: invocation.outputs,
            teardown_faults: invocation.teardown_faults,
            ..Self::pending(case)
        }
    }

    pub fn setup_failed(case: &TestCase, argument: &'static str, status: Status) -> Self {
        Self {
            outcome: Outcome::SetupFailed { argument, status },
            ..Self::pending(case)
        }
    }

    pub fn fault(case: &TestCase, message: String) -> Self {
        Self {
            outcome: Outcome::Fault { message },
            ..Self::pending(case)
        }
    }

    fn pending(case: &TestCase) -> Self {
        Self {
            name: case.name.clone(),
            omitted: case.omitted,
            expected: case.expected,
            outcome: Outcome::Fault {
                message: "case did not run".to_string(),
            },
            outputs: BTreeMap::new(),
            teardown_faults: Vec::new(),
        }
    }

    /// True iff the target returned the expected status and teardown was clean.
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Expected { .. }) && self.teardown_faults.is_empty()
    }

    /// One human-readable line for this case.
    pub fn describe(&self) -> String {
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        let omitted = omitted_label(self.omitted.as_slice());
        let mut line = match &self.outcome {
            Outcome::Expected { status } => {
                format!("[{verdict}] {}: {status} with {omitted} omitted", self.name)
            }
            Outcome::Unexpected { expected, actual } => format!(
                "[{verdict}] {}: expected {expected}, got {actual} with {omitted} omitted",
                self.name
            ),
            Outcome::Fault { message } => {
                format!("[{verdict}] {}: uncaught fault: {message}", self.name)
            }
            Outcome::SetupFailed { argument, status } => format!(
                "[{verdict}] {}: could not construct `{argument}`: {status}",
                self.name
            ),
        };
        if !self.teardown_faults.is_empty() {
            let faults: Vec<String> = self.teardown_faults.iter().map(ToString::to_string).collect();
            line.push_str(&format!("; teardown: {}", faults.join(", ")));
        }
        line
    }
}

/// All case reports for one target.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SuiteReport {
    pub target: String,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|case| case.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|case| !case.passed())
    }

    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|case| case.name == name)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} passed, {} failed",
            self.target,
            self.passed(),
            self.failed()
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
