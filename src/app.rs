//! src/app.rs
//!
//! Defines the main `App` struct, which resolves the configured targets, runs
//! each target's suite against the operator library and writes the report.

use crate::{
    config::{Config, ReportFormat},
    error::Result,
    harness::{report::SuiteReport, TargetApi},
    library::ReferenceLibrary,
    runner::SuiteRunner,
    targets,
};
use serde::Serialize;
use std::{fs, io::Write};

/// Every suite report produced by one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub suites: Vec<SuiteReport>,
    /// Handles and descriptors still alive after every suite finished.
    pub leaked: usize,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.suites.iter().map(SuiteReport::passed).sum()
    }

    pub fn failed(&self) -> usize {
        self.suites.iter().map(SuiteReport::failed).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.leaked == 0
    }
}

/// Encapsulates one run: configuration plus the resolved targets.
pub struct App {
    config: Config,
    targets: Vec<Box<dyn TargetApi>>,
}

impl App {
    /// Creates a new `App`, failing early on unknown target names.
    pub fn new(config: Config) -> Result<Self> {
        let targets = config
            .targets
            .iter()
            .map(|name| targets::by_name(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { config, targets })
    }

    /// Runs every configured suite, then writes the report.
    ///
    /// Case failures do not make this return `Err`; inspect the summary.
    pub fn run(self) -> Result<RunSummary> {
        let mut library = ReferenceLibrary::new();
        tracing::info!(targets = self.targets.len(), "🚀 Starting null-argument suites...");

        let mut suites = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let report = SuiteRunner::new(&mut library)
                .with_control(self.config.include_control)
                .run(target.as_ref());
            suites.push(report);
        }

        let leaked = library.live_resources();
        if leaked > 0 {
            tracing::error!(leaked, "Resources still alive after all suites finished");
        }

        let summary = RunSummary { suites, leaked };
        self.write_report(&summary)?;
        tracing::info!(
            passed = summary.passed(),
            failed = summary.failed(),
            "Run finished"
        );
        Ok(summary)
    }

    fn write_report(&self, summary: &RunSummary) -> Result<()> {
        let rendered = render(summary, self.config.report.format)?;
        match &self.config.report.path {
            Some(path) => {
                fs::write(path, rendered)?;
                tracing::info!(path = %path.display(), "Report written");
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

/// Renders a run in the requested format.
pub fn render(summary: &RunSummary, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        ReportFormat::Text => {
            let mut out = String::new();
            for suite in &summary.suites {
                for case in &suite.cases {
                    out.push_str(&case.describe());
                    out.push('\n');
                }
                out.push_str(&suite.summary());
                out.push('\n');
            }
            if summary.leaked > 0 {
                out.push_str(&format!("leaked: {} resources\n", summary.leaked));
            }
            out.push_str(&format!(
                "total: {} passed, {} failed\n",
                summary.passed(),
                summary.failed()
            ));
            Ok(out)
        }
    }
}
