// Patch generation and application

pub mod applier;
pub mod generator;
pub mod types;

pub use applier::{resolve_under_base, ApplyReport, PatchApplier};
pub use generator::PatchGenerator;
pub use types::{PatchResponse, PatchSet};
