//! Phase-sequencing engine for sdlcflow
//!
//! - [`PhaseRegistry`]: total mapping from phase to handler
//! - [`WorkflowRunner`]: the transition function, with confirmation gating and a
//!   bounded auto-chaining loop
//! - [`WorkflowOrchestrator`]: per-workflow session store with start, confirm, edit
//!   and inspect operations
//! - [`StepObserver`]: begin/end bracketing around each handler invocation
//!
//! # Integration Rule
//!
//! Outside this crate, drive workflows through [`WorkflowOrchestrator`]. The runner
//! and registry are public for composition and tests.

mod observer;
mod orchestrator;
mod registry;
mod runner;
mod view;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use observer::{
    NoopObserver, StepContext, StepGuard, StepObserver, StepOutcome, TracingObserver,
    observer_for,
};
pub use orchestrator::WorkflowOrchestrator;
pub use registry::{PhaseRegistry, RegistryBuilder};
pub use runner::WorkflowRunner;
pub use view::WorkflowStateView;

pub use sdlcflow_utils::error::{RegistryError, WorkflowError};
