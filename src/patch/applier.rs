// Patch application
//
// Writes a patch to disk under the project base path. Every path is resolved
// lexically and rejected when it would land outside the base path; deletions
// run before writes so a file moved by the patch never loses its new content.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

use super::types::PatchSet;

/// What one application pass actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub written: Vec<String>,
    pub deleted: Vec<String>,
    /// Paths refused because they resolve outside the base path
    pub rejected: Vec<String>,
}

impl ApplyReport {
    pub fn changed_anything(&self) -> bool {
        !self.written.is_empty() || !self.deleted.is_empty()
    }
}

pub struct PatchApplier {
    base_path: PathBuf,
}

impl PatchApplier {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn apply(&self, patch: &PatchSet) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        for path in &patch.deletions {
            let Some(resolved) = resolve_under_base(&self.base_path, path) else {
                tracing::warn!("Rejected deletion outside the project: {}", path);
                report.rejected.push(path.clone());
                continue;
            };
            if resolved.is_file() {
                std::fs::remove_file(&resolved)
                    .with_context(|| format!("Failed to delete {}", resolved.display()))?;
                tracing::info!("Deleted {}", path);
                report.deleted.push(path.clone());
            } else {
                tracing::debug!("Skipping deletion of missing file {}", path);
            }
        }

        for (path, content) in &patch.files {
            let Some(resolved) = resolve_under_base(&self.base_path, path) else {
                tracing::warn!("Rejected write outside the project: {}", path);
                report.rejected.push(path.clone());
                continue;
            };
            if let Some(parent) = resolved.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&resolved, content)
                .with_context(|| format!("Failed to write {}", resolved.display()))?;
            tracing::info!("Wrote {} ({} bytes)", path, content.len());
            report.written.push(path.clone());
        }

        Ok(report)
    }
}

/// Resolve `relative` under `base` without touching the filesystem. Absolute
/// paths and any traversal that escapes the base are refused.
pub fn resolve_under_base(base: &Path, relative: &str) -> Option<PathBuf> {
    let candidate = Path::new(relative);
    if candidate.is_absolute() {
        return None;
    }

    let mut depth: usize = 0;
    let mut resolved = base.to_path_buf();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                resolved.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if depth == 0 {
        return None;
    }
    Some(resolved)
}
