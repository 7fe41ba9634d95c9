// Project view: structure scan, file contents, required documents

pub mod discovery;
pub mod docs;
pub mod files;
pub mod structure;

pub use discovery::{discover_scan_rules, load_configuration_files, ScanRules};
pub use docs::{read_required_documents, ProjectDocuments};
pub use files::FileContentMap;
pub use structure::{all_files, scan, ProjectStructure};
