//! src/library/reference.rs
//!
//! An in-process implementation of `OpLibrary`. It keeps handle and descriptor
//! tables, validates every argument the way the native library does, and
//! answers the workspace query with the same arithmetic. It never touches a
//! device, so the harness can run anywhere.

use crate::{
    domain::{DataType, DescriptorId, HandleId, Layout, Status, TensorSpec, MAX_TENSOR_RANK},
    library::{IndiceConvWorkspaceArgs, OpLibrary},
};
use std::collections::{HashMap, HashSet};

const WORKSPACE_API: &str = "indice_convolution_forward_workspace_size";

#[derive(Debug, Default)]
pub struct ReferenceLibrary {
    next_id: u64,
    handles: HashSet<HandleId>,
    // `None` until the descriptor has been configured.
    descriptors: HashMap<DescriptorId, Option<TensorSpec>>,
}

impl ReferenceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles plus descriptors that have been created but not destroyed.
    pub fn live_resources(&self) -> usize {
        self.handles.len() + self.descriptors.len()
    }

    /// The configuration of a live descriptor, if it has been set.
    pub fn descriptor(&self, desc: DescriptorId) -> Option<&TensorSpec> {
        self.descriptors.get(&desc).and_then(Option::as_ref)
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn configured(&self, desc: DescriptorId, name: &str) -> Result<&TensorSpec, Status> {
        match self.descriptors.get(&desc) {
            Some(Some(spec)) => Ok(spec),
            Some(None) => Err(reject(name, "descriptor was never configured")),
            None => Err(reject(name, "unknown or destroyed descriptor")),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_workspace(
        &self,
        handle: HandleId,
        features_desc: DescriptorId,
        filters_desc: DescriptorId,
        indice_pairs_desc: DescriptorId,
        features_out_desc: DescriptorId,
        indice_num: &[i64],
        num_act_out: i64,
        inverse: i64,
        sub_m: i64,
    ) -> Result<usize, Status> {
        if !self.handles.contains(&handle) {
            return Err(reject("handle", "unknown or destroyed handle"));
        }
        let features = self.configured(features_desc, "features_desc")?;
        let filters = self.configured(filters_desc, "filters_desc")?;
        let indice_pairs = self.configured(indice_pairs_desc, "indice_pairs_desc")?;
        let features_out = self.configured(features_out_desc, "features_out_desc")?;

        // Shapes.
        if features.rank() != 2 {
            return Err(reject("features_desc", "rank must be 2"));
        }
        if features_out.rank() != 2 {
            return Err(reject("features_out_desc", "rank must be 2"));
        }
        if indice_pairs.rank() != 3 || indice_pairs.dims[1] != 2 {
            return Err(reject("indice_pairs_desc", "shape must be [K, 2, N]"));
        }
        if !matches!(filters.rank(), 4 | 5) {
            return Err(reject("filters_desc", "rank must be 4 or 5"));
        }

        // Element types.
        if !matches!(features.dtype, DataType::Float | DataType::Half) {
            return Err(reject("features_desc", "dtype must be float or half"));
        }
        if filters.dtype != features.dtype || features_out.dtype != features.dtype {
            return Err(reject("filters_desc", "dtypes of features, filters and output differ"));
        }
        if indice_pairs.dtype != DataType::Int32 {
            return Err(reject("indice_pairs_desc", "dtype must be int32"));
        }

        // Scalar flags.
        if !matches!(inverse, 0 | 1) {
            return Err(reject("inverse", "must be 0 or 1"));
        }
        if !matches!(sub_m, 0 | 1) {
            return Err(reject("sub_m", "must be 0 or 1"));
        }
        if inverse == 1 {
            tracing::debug!(api = WORKSPACE_API, "Inverse convolution is not supported");
            return Err(Status::NotSupported);
        }

        // Cross-argument consistency.
        let (ci, co, kernel_volume) = filter_geometry(filters)?;
        if i64::from(indice_pairs.dims[0]) != kernel_volume {
            return Err(reject("indice_pairs_desc", "dims[0] must equal the kernel volume"));
        }
        if i64::try_from(indice_num.len()).ok() != Some(kernel_volume) {
            return Err(reject("indice_num", "length must equal the kernel volume"));
        }
        if i64::from(features.dims[1]) != ci {
            return Err(reject("features_desc", "channel must match filter input channel"));
        }
        if i64::from(features_out.dims[1]) != co {
            return Err(reject("features_out_desc", "channel must match filter output channel"));
        }
        if i64::from(features_out.dims[0]) != num_act_out {
            return Err(reject("num_act_out", "must equal features_out dims[0]"));
        }
        if indice_pairs.dims[2] != features.dims[0] {
            return Err(reject("indice_pairs_desc", "dims[2] must equal the number of input points"));
        }
        let max_pairs = i64::from(indice_pairs.dims[2]);
        if indice_num.iter().any(|&n| n < 0 || n > max_pairs) {
            return Err(reject("indice_num", "counts must lie in [0, input points]"));
        }

        let max_count = indice_num.iter().copied().max().unwrap_or(0);
        let elem = features.dtype.size_in_bytes();
        let filters_bytes = filters.size_in_bytes().ok_or_else(overflow)?;
        max_count
            .checked_mul(ci + co)
            .and_then(|n| usize::try_from(n).ok())
            .and_then(|per_point| per_point.checked_mul(elem))
            .and_then(|bytes| bytes.checked_add(filters_bytes))
            .ok_or_else(overflow)
    }
}

fn reject(argument: &str, reason: &str) -> Status {
    tracing::debug!(api = WORKSPACE_API, argument, reason, "Rejected argument");
    Status::BadParam
}

fn overflow() -> Status {
    tracing::debug!(api = WORKSPACE_API, "Workspace size does not fit in usize");
    Status::NumericalOverflow
}

/// Returns `(input_channels, output_channels, kernel_volume)` for a filter descriptor.
fn filter_geometry(filters: &TensorSpec) -> Result<(i64, i64, i64), Status> {
    let dims: Vec<i64> = filters.dims.iter().map(|&d| i64::from(d)).collect();
    let last = dims.len() - 1;
    let (ci, co, spatial) = match filters.layout {
        Layout::Ndhwc | Layout::Nhwc => (dims[last], dims[0], &dims[1..last]),
        Layout::Ncdhw | Layout::Nchw => (dims[1], dims[0], &dims[2..]),
        Layout::Hwcn => (dims[last - 1], dims[last], &dims[..last - 1]),
        Layout::Array | Layout::Nlc | Layout::Nc => {
            return Err(reject("filters_desc", "layout has no channel mapping"));
        }
    };
    let kernel_volume = spatial
        .iter()
        .try_fold(1i64, |acc, &d| acc.checked_mul(d))
        .ok_or_else(overflow)?;
    Ok((ci, co, kernel_volume))
}

impl OpLibrary for ReferenceLibrary {
    fn create_handle(&mut self) -> Result<HandleId, Status> {
        let handle = HandleId(self.allocate_id());
        self.handles.insert(handle);
        Ok(handle)
    }

    fn queue_sync(&mut self, handle: HandleId) -> Status {
        if self.handles.contains(&handle) {
            Status::Success
        } else {
            Status::BadParam
        }
    }

    fn destroy_handle(&mut self, handle: HandleId) -> Status {
        if self.handles.remove(&handle) {
            Status::Success
        } else {
            Status::BadParam
        }
    }

    fn create_tensor_descriptor(&mut self) -> Result<DescriptorId, Status> {
        let desc = DescriptorId(self.allocate_id());
        self.descriptors.insert(desc, None);
        Ok(desc)
    }

    fn set_tensor_descriptor(
        &mut self,
        desc: DescriptorId,
        layout: Layout,
        dtype: DataType,
        rank: usize,
        dims: &[i32],
    ) -> Status {
        let Some(slot) = self.descriptors.get_mut(&desc) else {
            return Status::BadParam;
        };
        if rank != dims.len() || rank > MAX_TENSOR_RANK {
            return Status::BadParam;
        }
        if dtype == DataType::Invalid || dims.iter().any(|&d| d < 0) {
            return Status::BadParam;
        }
        *slot = Some(TensorSpec::new(layout, dtype, dims));
        Status::Success
    }

    fn destroy_tensor_descriptor(&mut self, desc: DescriptorId) -> Status {
        match self.descriptors.remove(&desc) {
            Some(_) => Status::Success,
            None => Status::BadParam,
        }
    }

    fn indice_convolution_forward_workspace_size(
        &self,
        args: IndiceConvWorkspaceArgs<'_>,
    ) -> Status {
        let Some(handle) = args.handle else {
            return reject("handle", "null");
        };
        let Some(features_desc) = args.features_desc else {
            return reject("features_desc", "null");
        };
        let Some(filters_desc) = args.filters_desc else {
            return reject("filters_desc", "null");
        };
        let Some(indice_pairs_desc) = args.indice_pairs_desc else {
            return reject("indice_pairs_desc", "null");
        };
        let Some(features_out_desc) = args.features_out_desc else {
            return reject("features_out_desc", "null");
        };
        let Some(indice_num) = args.indice_num else {
            return reject("indice_num", "null");
        };
        let Some(workspace_size) = args.workspace_size else {
            return reject("workspace_size", "null");
        };

        match self.plan_workspace(
            handle,
            features_desc,
            filters_desc,
            indice_pairs_desc,
            features_out_desc,
            indice_num,
            args.num_act_out,
            args.inverse,
            args.sub_m,
        ) {
            Ok(size) => {
                *workspace_size = size;
                Status::Success
            }
            Err(status) => status,
        }
    }
}
