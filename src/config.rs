//! src/config.rs
//!
//! Defines the strongly-typed `Config` struct for all runtime parameters,
//! loaded from files and environment variables via `figment`.

use crate::targets::IndiceConvolutionForwardWorkspace;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level struct holding all application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Target APIs to run, by name.
    pub targets: Vec<String>,
    /// Run the all-arguments-valid case alongside the omission cases.
    pub include_control: bool,
    pub report: ReportConfig,
    /// Filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

/// Where and how the suite report is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub format: ReportFormat,
    /// Write the report here instead of standard output.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Json,
}

impl Config {
    /// Loads configuration from `apitest.toml` and environment variables.
    /// It uses the `Default` implementation as a base layer.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("apitest.toml"))
            .merge(Env::prefixed("APITEST_").split("__"))
            .extract()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: vec![IndiceConvolutionForwardWorkspace::NAME.to_string()],
            include_control: true,
            report: ReportConfig {
                format: ReportFormat::Text,
                path: None,
            },
            log_filter: "info".to_string(),
        }
    }
}
