// Test-result analysis and error categorization

pub mod analyzer;
pub mod categorizer;

pub use analyzer::{Analysis, AnalysisError, TestResultAnalyzer};
pub use categorizer::{categorize_heuristically, CategorizedErrors, ErrorCategorizer};
