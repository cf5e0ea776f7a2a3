//! src/targets/indice_convolution_forward.rs
//!
//! The workspace-size query of the forward indice (sparse) convolution. The
//! argument table below holds the valid shape of every argument; the scalar
//! flags are fixed and are not part of null-argument coverage.

use crate::{
    domain::{DataType, Layout, Status, TensorSpec},
    harness::{ArgumentKind, ArgumentSet, ArgumentSpec, TargetApi},
    library::{IndiceConvWorkspaceArgs, OpLibrary},
};

pub struct IndiceConvolutionForwardWorkspace {
    arguments: Vec<ArgumentSpec>,
}

impl IndiceConvolutionForwardWorkspace {
    pub const NAME: &'static str = "indice_convolution_forward_workspace";

    pub const NUM_ACT_OUT: i64 = 10;
    pub const INVERSE: i64 = 0;
    pub const SUB_M: i64 = 0;

    pub fn new() -> Self {
        Self {
            arguments: vec![
                ArgumentSpec::required("handle", ArgumentKind::Handle),
                ArgumentSpec::required(
                    "features_desc",
                    ArgumentKind::Tensor(TensorSpec::new(Layout::Array, DataType::Float, [2, 7])),
                ),
                ArgumentSpec::required(
                    "filters_desc",
                    ArgumentKind::Tensor(TensorSpec::new(
                        Layout::Ndhwc,
                        DataType::Float,
                        [9, 2, 2, 2, 7],
                    )),
                ),
                ArgumentSpec::required(
                    "indice_pairs_desc",
                    ArgumentKind::Tensor(TensorSpec::new(Layout::Array, DataType::Int32, [8, 2, 2])),
                ),
                ArgumentSpec::required(
                    "features_out_desc",
                    ArgumentKind::Tensor(TensorSpec::new(Layout::Array, DataType::Float, [10, 9])),
                ),
                ArgumentSpec::required("indice_num", ArgumentKind::Counts(vec![1; 8])),
                ArgumentSpec::required("workspace_size", ArgumentKind::OutputSlot),
            ],
        }
    }
}

impl Default for IndiceConvolutionForwardWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetApi for IndiceConvolutionForwardWorkspace {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    fn call(&self, library: &dyn OpLibrary, args: &mut ArgumentSet) -> Status {
        let indice_num = args.counts("indice_num").map(<[i64]>::to_vec);
        let handle = args.handle("handle");
        let features_desc = args.tensor("features_desc");
        let filters_desc = args.tensor("filters_desc");
        let indice_pairs_desc = args.tensor("indice_pairs_desc");
        let features_out_desc = args.tensor("features_out_desc");

        library.indice_convolution_forward_workspace_size(IndiceConvWorkspaceArgs {
            handle,
            features_desc,
            filters_desc,
            indice_pairs_desc,
            features_out_desc,
            indice_num: indice_num.as_deref(),
            num_act_out: Self::NUM_ACT_OUT,
            inverse: Self::INVERSE,
            sub_m: Self::SUB_M,
            workspace_size: args.output_slot("workspace_size"),
        })
    }
}
