// Scan-rule discovery and configuration-file lookup

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::artifact;
use crate::oracle::{self, Oracle};

use super::structure::{all_files, ProjectStructure};

/// Folders to skip and file extensions to include when scanning the project.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRules {
    #[serde(default)]
    pub skip_folders: Vec<String>,
    #[serde(default)]
    pub file_extensions: Vec<String>,
}

/// Project configuration files recognized without asking the oracle.
/// The analyzer reports which of these need modification.
const WELL_KNOWN_CONFIG_FILES: &[&str] = &[
    "Cargo.toml",
    "package.json",
    "pyproject.toml",
    "setup.py",
    "requirements.txt",
    "go.mod",
    "Makefile",
];

/// Ask the oracle which folders to skip and which extensions to check for
/// the configured language. Falls back to built-in defaults on a malformed
/// response.
pub async fn discover_scan_rules(
    oracle: &dyn Oracle,
    language: &str,
    libraries: &[String],
) -> ScanRules {
    let system = "You are an expert software developer. Return only common build or output \
                  directories to skip and the file extensions to check during file processing.";

    let prompt = format!(
        "Based on the following programming language and libraries, list the common directories \
         that should be skipped and the file extensions that should be checked during file \
         processing.\n\n\
         Programming Language:\n{language}\n\n\
         Libraries:\n{libraries}\n\n\
         Ensure the following:\n\
         1. **skip_folders** should only contain folder names, not specific files.\n\
         2. **file_extensions** should contain valid file extensions to be checked, including \
         test-related file extensions.\n\n\
         Return the result in JSON format without any explanation.\n\n\
         JSON Format Example:\n\
         {{\n\
             \"skip_folders\": A JSON array of folder names to be skipped (directories only),\n\
             \"file_extensions\": A JSON array of file extensions to be checked (including test files)\n\
         }}",
        language = language,
        libraries = libraries.join(", "),
    );

    match oracle::complete(oracle, system, &prompt).await {
        Ok(response) => match artifact::parse_json_object::<ScanRules>(&response) {
            Some(rules) if !rules.file_extensions.is_empty() => rules,
            _ => {
                tracing::warn!("Scan-rule response did not parse; using built-in defaults");
                default_scan_rules(language)
            }
        },
        Err(e) => {
            tracing::warn!("Scan-rule discovery failed ({}); using built-in defaults", e);
            default_scan_rules(language)
        }
    }
}

/// Built-in rules for the common languages this agent repairs.
pub fn default_scan_rules(language: &str) -> ScanRules {
    let skip_folders = ["target", "node_modules", "dist", "build", ".git", "__pycache__", ".venv", "venv"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let file_extensions: Vec<&str> = match language.to_lowercase().as_str() {
        "rust" => vec![".rs", ".toml"],
        "python" => vec![".py", ".toml", ".txt", ".cfg"],
        "javascript" | "typescript" => vec![".js", ".ts", ".jsx", ".tsx", ".json"],
        "go" => vec![".go", ".mod", ".sum"],
        _ => vec![".rs", ".py", ".js", ".ts", ".go", ".toml", ".json"],
    };

    ScanRules {
        skip_folders,
        file_extensions: file_extensions.iter().map(|s| s.to_string()).collect(),
    }
}

/// Load the contents of every well-known configuration file present in the
/// structure, keyed by base-relative path.
pub fn load_configuration_files(
    base_path: &Path,
    structure: &ProjectStructure,
) -> HashMap<String, String> {
    let mut configuration = HashMap::new();

    for path in all_files(structure) {
        let name = path.rsplit('/').next().unwrap_or(path.as_str());
        if !WELL_KNOWN_CONFIG_FILES.contains(&name) {
            continue;
        }
        if let Ok(content) = std::fs::read_to_string(base_path.join(&path)) {
            configuration.insert(path, content);
        }
    }

    configuration
}
