//! src/lib.rs
//!
//! Parameter-validation test infrastructure for accelerator operator APIs.
//!
//! The core is the `NullArgumentHarness`: for one entry point it builds every
//! argument validly except the one under test, calls the entry point once,
//! and checks that the call rejects the missing argument with `BAD_PARAM`
//! instead of crashing or succeeding. `SuiteRunner` applies it once per
//! required argument, and `App` runs the configured suites end to end.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod harness;
pub mod library;
pub mod runner;
pub mod targets;

pub use app::{App, RunSummary};
pub use config::Config;
pub use error::{Error, Result};
