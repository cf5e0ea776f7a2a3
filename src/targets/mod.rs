//! src/targets/mod.rs
//!
//! The entry points this crate knows how to exercise, looked up by name.

use crate::{
    error::{Error, Result},
    harness::TargetApi,
};

pub mod indice_convolution_forward;

pub use indice_convolution_forward::IndiceConvolutionForwardWorkspace;

/// Names accepted by `by_name`.
pub const AVAILABLE: &[&str] = &[IndiceConvolutionForwardWorkspace::NAME];

pub fn by_name(name: &str) -> Result<Box<dyn TargetApi>> {
    match name {
        IndiceConvolutionForwardWorkspace::NAME => Ok(Box::new(IndiceConvolutionForwardWorkspace::new())),
        other => Err(Error::UnknownTarget(other.to_string())),
    }
}
