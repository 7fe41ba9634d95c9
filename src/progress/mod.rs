// Progress tracking and reflection

pub mod reflection;
pub mod tracker;

pub use reflection::{ReflectionEngine, ReflectionLog};
pub use tracker::ProgressTracker;
