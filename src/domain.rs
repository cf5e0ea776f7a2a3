//! src/domain.rs
//!
//! Consolidates the value types shared by the operator library boundary and
//! the harness: status codes, element types, layouts, tensor shapes and the
//! opaque ids that stand in for native handles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The highest tensor rank a descriptor may carry.
pub const MAX_TENSOR_RANK: usize = 8;

// --- Status Codes ---

/// Status returned by every operator library entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    NotInitialized,
    AllocFailed,
    BadParam,
    InternalError,
    ArchMismatch,
    ExecutionFailed,
    NotSupported,
    NumericalOverflow,
}

impl Status {
    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    /// Converts a status into a `Result`, treating anything but `Success` as an error.
    pub fn into_result(self) -> Result<(), Status> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::NotInitialized => "NOT_INITIALIZED",
            Status::AllocFailed => "ALLOC_FAILED",
            Status::BadParam => "BAD_PARAM",
            Status::InternalError => "INTERNAL_ERROR",
            Status::ArchMismatch => "ARCH_MISMATCH",
            Status::ExecutionFailed => "EXECUTION_FAILED",
            Status::NotSupported => "NOT_SUPPORTED",
            Status::NumericalOverflow => "NUMERICAL_OVERFLOW",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Tensor Metadata ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Invalid,
    Half,
    Float,
    Double,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Bool,
}

impl DataType {
    /// Size of one element in bytes. `Invalid` has no size.
    pub fn size_in_bytes(self) -> usize {
        match self {
            DataType::Invalid => 0,
            DataType::Int8 | DataType::Uint8 | DataType::Bool => 1,
            DataType::Half | DataType::Int16 => 2,
            DataType::Float | DataType::Int32 => 4,
            DataType::Double | DataType::Int64 => 8,
        }
    }
}

/// Memory layout tag carried by a descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Layout {
    Nchw,
    Nhwc,
    Hwcn,
    Ndhwc,
    Ncdhw,
    Array,
    Nlc,
    Nc,
}

/// The full content of a configured tensor descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSpec {
    pub layout: Layout,
    pub dtype: DataType,
    pub dims: Vec<i32>,
}

impl TensorSpec {
    pub fn new(layout: Layout, dtype: DataType, dims: impl Into<Vec<i32>>) -> Self {
        Self {
            layout,
            dtype,
            dims: dims.into(),
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of elements described, or `None` if it does not fit in `usize`.
    /// Negative dims count as zero.
    pub fn element_count(&self) -> Option<usize> {
        self.dims
            .iter()
            .map(|&d| usize::try_from(d).unwrap_or(0))
            .try_fold(1usize, usize::checked_mul)
    }

    pub fn size_in_bytes(&self) -> Option<usize> {
        self.element_count()?.checked_mul(self.dtype.size_in_bytes())
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}{:?}", self.layout, self.dtype, self.dims)
    }
}

// --- Opaque Ids ---

/// Stands in for a native runtime handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(pub u64);

/// Stands in for a native tensor descriptor handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DescriptorId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle::{}", self.0)
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "desc::{}", self.0)
    }
}
