// Project structure scan — folders to file names, under skip/extension rules

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use walkdir::WalkDir;

/// Relative folder path → file names in that folder. The filesystem is the
/// source of truth: callers rebuild this at the start of every iteration.
pub type ProjectStructure = BTreeMap<String, BTreeSet<String>>;

/// Enumerate project files under `base`.
///
/// Skip folders exclude the folder and all its descendants. Only files whose
/// name ends with one of `extensions` are listed. The base folder itself is
/// keyed as `"."`.
pub fn scan(base: &Path, skip_folders: &[String], extensions: &[String]) -> Result<ProjectStructure> {
    let mut structure = ProjectStructure::new();

    let walker = WalkDir::new(base).into_iter().filter_entry(|entry| {
        if !entry.file_type().is_dir() {
            return true;
        }
        let relative = match entry.path().strip_prefix(base) {
            Ok(r) => r,
            Err(_) => return true,
        };
        !is_skipped(relative, skip_folders)
    });

    for entry in walker {
        let entry = entry.context("Failed to walk project tree")?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if !extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(base)
            .context("Walked file outside the base path")?;
        let folder = relative
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        structure.entry(folder).or_default().insert(name);
    }

    Ok(structure)
}

fn is_skipped(relative: &Path, skip_folders: &[String]) -> bool {
    relative.components().any(|component| {
        let name = component.as_os_str().to_string_lossy();
        skip_folders.iter().any(|skip| skip.as_str() == name)
    })
}

/// Flatten a structure into base-relative file paths.
pub fn all_files(structure: &ProjectStructure) -> Vec<String> {
    let mut files = Vec::new();
    for (folder, names) in structure {
        for name in names {
            if folder == "." {
                files.push(name.clone());
            } else {
                files.push(format!("{}/{}", folder, name));
            }
        }
    }
    files
}
