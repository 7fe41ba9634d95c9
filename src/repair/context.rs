// Per-iteration snapshot
//
// Everything the patch generator is allowed to see for one iteration is
// assembled here up front and never mutated afterwards, so two prompts built
// from the same context always describe the same project state.

use std::collections::HashMap;

use crate::analysis::CategorizedErrors;
use crate::project::ProjectStructure;

#[derive(Debug, Clone)]
pub struct IterationContext {
    pub iteration: usize,
    pub requirement: String,
    pub language: String,
    pub libraries: Vec<String>,
    /// Raw output of the latest test run
    pub test_results: String,
    pub errors: CategorizedErrors,
    /// Contents of the files flagged for modification, in flag order
    pub files: Vec<(String, String)>,
    pub configuration_files: HashMap<String, String>,
    pub structure: ProjectStructure,
    /// Rendered reflection history, empty until the loop stagnates
    pub reflections: String,
}
