// Patch representation

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::artifact;

/// One proposed change set: full replacement contents for files plus files
/// to remove. Deletions are applied before writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    /// (base-relative path, full new content), in reply order
    pub files: Vec<(String, String)>,
    pub deletions: Vec<String>,
}

impl PatchSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.deletions.is_empty()
    }
}

/// Wire shape of a modification reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchResponse {
    #[serde(default)]
    pub files: BTreeMap<String, String>,
    #[serde(default)]
    pub files_to_delete: Vec<String>,
}

impl From<PatchResponse> for PatchSet {
    fn from(response: PatchResponse) -> Self {
        PatchSet {
            files: response
                .files
                .into_iter()
                .map(|(path, content)| (path, artifact::clean_block(&content)))
                .collect(),
            deletions: response.files_to_delete,
        }
    }
}
