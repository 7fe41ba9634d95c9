// The repair loop and its per-iteration context

pub mod context;
pub mod controller;

pub use context::IterationContext;
pub use controller::{RepairLoop, RunOutcome};
