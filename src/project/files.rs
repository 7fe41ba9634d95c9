// File content map — lazily loaded project file contents
//
// Contents are never assumed authoritative across iterations: after every
// patch application the whole map is reloaded from disk so no-op detection
// compares against ground truth.

use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct FileContentMap {
    base_path: PathBuf,
    contents: HashMap<String, String>,
}

impl FileContentMap {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            contents: HashMap::new(),
        }
    }

    /// Pull the given base-relative paths from disk into the map.
    /// Paths that do not exist are skipped with a warning.
    pub fn load(&mut self, paths: &[String]) {
        for path in paths {
            let full = self.base_path.join(path);
            match std::fs::read_to_string(&full) {
                Ok(content) => {
                    self.contents.insert(path.clone(), content);
                }
                Err(e) => {
                    tracing::warn!("File {} could not be read, skipping: {}", full.display(), e);
                }
            }
        }
    }

    /// Re-read every known path from disk. Entries whose file has vanished
    /// are dropped.
    pub fn reload(&mut self) -> Result<()> {
        let paths: Vec<String> = self.contents.keys().cloned().collect();
        for path in paths {
            let full = self.base_path.join(&path);
            match std::fs::read_to_string(&full) {
                Ok(content) => {
                    self.contents.insert(path, content);
                }
                Err(_) => {
                    self.contents.remove(&path);
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.contents.get(path).map(String::as_str)
    }

    /// Snapshot of the requested paths, in request order, silently omitting
    /// unknown ones. Used to assemble prompt payloads.
    pub fn subset(&self, paths: &[String]) -> Vec<(String, String)> {
        paths
            .iter()
            .filter_map(|p| self.contents.get(p).map(|c| (p.clone(), c.clone())))
            .collect()
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
