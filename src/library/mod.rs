//! src/library/mod.rs
//!
//! The interface this crate consumes from the operator library under test.
//! Everything the harness does to the library goes through `OpLibrary`, so a
//! native binding, the in-process `ReferenceLibrary`, or a fault-injecting
//! wrapper can be swapped in without touching the harness.

use crate::{
    domain::{DataType, DescriptorId, HandleId, Layout, Status},
    error::{Error, Result},
};

pub mod reference;

pub use reference::ReferenceLibrary;

/// Arguments of the indice convolution forward workspace query.
///
/// Every pointer-like argument is an `Option`; `None` is how a caller passes a
/// null handle, descriptor, count array or output slot.
#[derive(Debug)]
pub struct IndiceConvWorkspaceArgs<'a> {
    pub handle: Option<HandleId>,
    pub features_desc: Option<DescriptorId>,
    pub filters_desc: Option<DescriptorId>,
    pub indice_pairs_desc: Option<DescriptorId>,
    pub features_out_desc: Option<DescriptorId>,
    pub indice_num: Option<&'a [i64]>,
    pub num_act_out: i64,
    pub inverse: i64,
    pub sub_m: i64,
    pub workspace_size: Option<&'a mut usize>,
}

/// Handle and descriptor lifecycle plus the entry points exercised by the harness.
pub trait OpLibrary {
    fn create_handle(&mut self) -> Result<HandleId, Status>;

    /// Blocks until all work queued on the handle has drained.
    fn queue_sync(&mut self, handle: HandleId) -> Status;

    fn destroy_handle(&mut self, handle: HandleId) -> Status;

    fn create_tensor_descriptor(&mut self) -> Result<DescriptorId, Status>;

    fn set_tensor_descriptor(
        &mut self,
        desc: DescriptorId,
        layout: Layout,
        dtype: DataType,
        rank: usize,
        dims: &[i32],
    ) -> Status;

    fn destroy_tensor_descriptor(&mut self, desc: DescriptorId) -> Status;

    /// Computes the scratch memory a forward indice convolution would need.
    fn indice_convolution_forward_workspace_size(&self, args: IndiceConvWorkspaceArgs<'_>)
        -> Status;
}

/// Turns a non-success status from a lifecycle call into an `Error::Library`.
pub fn check(call: &'static str, status: Status) -> Result<()> {
    status
        .into_result()
        .map_err(|status| Error::Library { call, status })
}
