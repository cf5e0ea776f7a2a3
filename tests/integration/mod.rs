//! tests/integration/mod.rs

mod coverage_properties;
