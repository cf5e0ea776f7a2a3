//! src/harness/mod.rs
//!
//! Defines the `NullArgumentHarness`, which builds the arguments of one target
//! entry point (leaving out whichever the caller did not select), calls the
//! entry point exactly once behind a panic boundary, and releases every
//! resource it built on every exit path.

use crate::{
    domain::{DescriptorId, HandleId, Status, TensorSpec},
    error::{Error, Result},
    library::{check, OpLibrary},
};
use std::{
    any::Any,
    collections::{BTreeMap, BTreeSet},
    panic::{self, AssertUnwindSafe},
};

pub mod coverage;
pub mod report;

use report::{TeardownFault, TeardownStage};

/// Names of the arguments a harness should construct. Anything else is left absent.
pub type Selection = BTreeSet<&'static str>;

/// How to build a valid instance of one argument.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgumentKind {
    /// A runtime handle from `create_handle`.
    Handle,
    /// A tensor descriptor configured with the given shape.
    Tensor(TensorSpec),
    /// A host-side sequence of counts.
    Counts(Vec<i64>),
    /// A destination the target writes a scalar into.
    OutputSlot,
}

/// One entry in a target API's argument list.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgumentSpec {
    pub name: &'static str,
    pub required: bool,
    pub kind: ArgumentKind,
}

impl ArgumentSpec {
    pub fn required(name: &'static str, kind: ArgumentKind) -> Self {
        Self {
            name,
            required: true,
            kind,
        }
    }

    pub fn optional(name: &'static str, kind: ArgumentKind) -> Self {
        Self {
            name,
            required: false,
            kind,
        }
    }
}

/// A constructed argument.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgumentValue {
    Handle(HandleId),
    Tensor(DescriptorId),
    Counts(Vec<i64>),
    OutputSlot(usize),
}

/// The configured arguments for one invocation, keyed by argument name.
/// A name with no entry is an absent (null) argument.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArgumentSet {
    values: BTreeMap<&'static str, ArgumentValue>,
}

impl ArgumentSet {
    pub fn handle(&self, name: &str) -> Option<HandleId> {
        match self.values.get(name) {
            Some(ArgumentValue::Handle(handle)) => Some(*handle),
            _ => None,
        }
    }

    pub fn tensor(&self, name: &str) -> Option<DescriptorId> {
        match self.values.get(name) {
            Some(ArgumentValue::Tensor(desc)) => Some(*desc),
            _ => None,
        }
    }

    pub fn counts(&self, name: &str) -> Option<&[i64]> {
        match self.values.get(name) {
            Some(ArgumentValue::Counts(counts)) => Some(counts),
            _ => None,
        }
    }

    pub fn output_slot(&mut self, name: &str) -> Option<&mut usize> {
        match self.values.get_mut(name) {
            Some(ArgumentValue::OutputSlot(slot)) => Some(slot),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Current values of every present output slot.
    pub fn outputs(&self) -> BTreeMap<&'static str, usize> {
        self.values
            .iter()
            .filter_map(|(name, value)| match value {
                ArgumentValue::OutputSlot(slot) => Some((*name, *slot)),
                _ => None,
            })
            .collect()
    }

    fn insert(&mut self, name: &'static str, value: ArgumentValue) {
        self.values.insert(name, value);
    }
}

/// An entry point whose argument checking is under test.
pub trait TargetApi {
    fn name(&self) -> &str;

    /// The argument table, in the order the entry point takes them.
    fn arguments(&self) -> &[ArgumentSpec];

    /// Calls the entry point once with whatever `args` holds.
    fn call(&self, library: &dyn OpLibrary, args: &mut ArgumentSet) -> Status;
}

/// What came back from the single call to the target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationResult {
    Returned(Status),
    /// The target panicked. The message names the target, the omitted
    /// arguments and the panic payload.
    Fault { message: String },
}

/// The raw result of `NullArgumentHarness::invoke`. Pass/fail is decided by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    pub result: InvocationResult,
    pub omitted: Vec<&'static str>,
    pub outputs: BTreeMap<&'static str, usize>,
    pub teardown_faults: Vec<TeardownFault>,
}

#[derive(Debug)]
enum Resource {
    Handle(HandleId),
    Descriptor(DescriptorId),
}

#[derive(Debug)]
struct Owned {
    argument: &'static str,
    resource: Resource,
}

/// Single-use harness: `configure`, then `invoke`.
pub struct NullArgumentHarness<'a, L: OpLibrary> {
    library: &'a mut L,
    target: &'a dyn TargetApi,
    arguments: ArgumentSet,
    // Construction order; released front to back.
    resources: Vec<Owned>,
    omitted: Vec<&'static str>,
    configured: bool,
}

impl<'a, L: OpLibrary> NullArgumentHarness<'a, L> {
    pub fn new(library: &'a mut L, target: &'a dyn TargetApi) -> Self {
        Self {
            library,
            target,
            arguments: ArgumentSet::default(),
            resources: Vec::new(),
            omitted: Vec::new(),
            configured: false,
        }
    }

    /// Builds every argument named in `selection` and leaves the rest absent.
    ///
    /// If the library fails while building, everything built so far is
    /// released and `Error::Setup` names the argument that could not be built.
    pub fn configure(&mut self, selection: &Selection) -> Result<()> {
        if self.configured {
            return Err(Error::AlreadyConfigured);
        }
        let target = self.target;
        if let Some(unknown) = selection
            .iter()
            .find(|name| !target.arguments().iter().any(|spec| spec.name == **name))
        {
            return Err(Error::UnknownArgument {
                argument: unknown.to_string(),
                target: target.name().to_string(),
            });
        }
        self.configured = true;

        for spec in target.arguments() {
            if !selection.contains(spec.name) {
                self.omitted.push(spec.name);
                continue;
            }
            if let Err(status) = self.construct(spec) {
                tracing::warn!(argument = spec.name, %status, "Failed to construct argument");
                for fault in self.release() {
                    tracing::error!(%fault, "Teardown fault after failed setup");
                }
                return Err(Error::Setup {
                    argument: spec.name,
                    status,
                });
            }
        }
        Ok(())
    }

    fn construct(&mut self, spec: &ArgumentSpec) -> Result<(), Status> {
        let value = match &spec.kind {
            ArgumentKind::Handle => {
                let handle = self.library.create_handle()?;
                self.own(spec.name, Resource::Handle(handle));
                ArgumentValue::Handle(handle)
            }
            ArgumentKind::Tensor(tensor) => {
                let desc = self.library.create_tensor_descriptor()?;
                // Owned before it is configured so a failed set is still released.
                self.own(spec.name, Resource::Descriptor(desc));
                self.library
                    .set_tensor_descriptor(desc, tensor.layout, tensor.dtype, tensor.rank(), &tensor.dims)
                    .into_result()?;
                ArgumentValue::Tensor(desc)
            }
            ArgumentKind::Counts(counts) => ArgumentValue::Counts(counts.clone()),
            ArgumentKind::OutputSlot => ArgumentValue::OutputSlot(0),
        };
        self.arguments.insert(spec.name, value);
        Ok(())
    }

    fn own(&mut self, argument: &'static str, resource: Resource) {
        self.resources.push(Owned { argument, resource });
    }

    /// Arguments that are currently constructed.
    pub fn arguments(&self) -> &ArgumentSet {
        &self.arguments
    }

    /// Calls the target once, then releases everything this harness built.
    pub fn invoke(mut self) -> Invocation {
        let target = self.target;
        let omitted = std::mem::take(&mut self.omitted);
        let library: &dyn OpLibrary = &*self.library;
        let arguments = &mut self.arguments;

        let result = match panic::catch_unwind(AssertUnwindSafe(|| target.call(library, arguments))) {
            Ok(status) => {
                tracing::debug!(api = target.name(), %status, "Target returned");
                InvocationResult::Returned(status)
            }
            Err(payload) => {
                let message = format!(
                    "caught `{}` in {} with {} omitted",
                    panic_message(payload.as_ref()),
                    target.name(),
                    omitted_label(&omitted),
                );
                tracing::error!(%message, "Target panicked");
                InvocationResult::Fault { message }
            }
        };

        let outputs = self.arguments.outputs();
        let teardown_faults = self.release();
        Invocation {
            result,
            omitted,
            outputs,
            teardown_faults,
        }
    }

    /// Releases owned resources in construction order, each exactly once.
    /// A handle's queue is drained before the handle is destroyed.
    ///
    /// Every release call runs behind its own panic boundary, so a panicking
    /// step becomes a `TeardownFault` and the remaining resources are still
    /// released. A resource stays owned by the harness until its turn.
    fn release(&mut self) -> Vec<TeardownFault> {
        let mut faults = Vec::new();
        while !self.resources.is_empty() {
            let Owned { argument, resource } = self.resources.remove(0);
            let library = &mut *self.library;
            match resource {
                Resource::Handle(handle) => {
                    tracing::debug!(argument, %handle, "Syncing queue");
                    release_step(&mut faults, argument, TeardownStage::QueueSync, || {
                        library.queue_sync(handle)
                    });

                    tracing::debug!(argument, %handle, "Destroying handle");
                    release_step(&mut faults, argument, TeardownStage::DestroyHandle, || {
                        library.destroy_handle(handle)
                    });
                }
                Resource::Descriptor(desc) => {
                    tracing::debug!(argument, %desc, "Destroying descriptor");
                    release_step(&mut faults, argument, TeardownStage::DestroyDescriptor, || {
                        library.destroy_tensor_descriptor(desc)
                    });
                }
            }
        }
        // Any ids still held are dangling now.
        self.arguments = ArgumentSet::default();
        faults
    }
}

impl<L: OpLibrary> Drop for NullArgumentHarness<'_, L> {
    fn drop(&mut self) {
        if self.resources.is_empty() {
            return;
        }
        tracing::warn!(
            count = self.resources.len(),
            "Harness dropped before invoke. Releasing its resources."
        );
        for fault in self.release() {
            tracing::error!(%fault, "Teardown fault during drop");
        }
    }
}

fn release_step(
    faults: &mut Vec<TeardownFault>,
    argument: &'static str,
    stage: TeardownStage,
    call: impl FnOnce() -> Status,
) {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(status) => {
            if let Err(e) = check(stage.call_name(), status) {
                tracing::warn!(argument, error = %e, "Teardown step failed");
                faults.push(TeardownFault::returned(argument, stage, status));
            }
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(argument, call = stage.call_name(), %message, "Teardown step panicked");
            faults.push(TeardownFault::panicked(argument, stage, message));
        }
    }
}

pub(crate) fn omitted_label(omitted: &[&str]) -> String {
    if omitted.is_empty() {
        "nothing".to_string()
    } else {
        omitted
            .iter()
            .map(|name| format!("`{name}`"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Extracts the message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
