// Required project documents
//
// The design-generation collaborator must have run before this core starts;
// a missing document is a fatal precondition failure, never retried.

use anyhow::{Context, Result};
use std::path::Path;

pub const README_FILE: &str = "README.md";
pub const TECHNICAL_DESIGN_FILE: &str = "TECHNICAL_DESIGN.json";

#[derive(Debug, Clone)]
pub struct ProjectDocuments {
    pub readme: String,
    pub technical_design: String,
}

/// Load README and the technical design record from the base path.
pub fn read_required_documents(base_path: &Path) -> Result<ProjectDocuments> {
    let readme_path = base_path.join(README_FILE);
    let design_path = base_path.join(TECHNICAL_DESIGN_FILE);

    let readme = std::fs::read_to_string(&readme_path)
        .with_context(|| format!("{} does not exist", readme_path.display()))?;
    let technical_design = std::fs::read_to_string(&design_path)
        .with_context(|| format!("{} does not exist", design_path.display()))?;

    Ok(ProjectDocuments {
        readme,
        technical_design,
    })
}
