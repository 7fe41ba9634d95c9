// Test-result analysis
//
// The oracle turns raw test output into an error count, the error lines, and
// the set of files to modify. The reply must parse as JSON; the analyzer
// retries a bounded number of times with backoff before giving up.

use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::artifact;
use crate::oracle::{self, Oracle};
use crate::project::ProjectStructure;

const RETRY_BASE_DELAY_MS: u64 = 500;

/// Structured verdict over one test run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub error_count: usize,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub files_to_modify: Vec<String>,
    #[serde(default)]
    pub configuration_files_to_modify: Vec<String>,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis reply was not parseable after {attempts} attempts")]
    Unparseable { attempts: u32 },
    #[error(transparent)]
    Oracle(#[from] anyhow::Error),
}

pub struct TestResultAnalyzer<'a> {
    oracle: &'a dyn Oracle,
    retry_limit: u32,
}

impl<'a> TestResultAnalyzer<'a> {
    pub fn new(oracle: &'a dyn Oracle, retry_limit: u32) -> Self {
        Self {
            oracle,
            retry_limit: retry_limit.max(1),
        }
    }

    /// Analyze raw test output against the project structure and the
    /// configuration files currently in play. `guidance` carries the
    /// rendered reflection log, empty until the loop has stagnated.
    pub async fn analyze(
        &self,
        test_results: &str,
        language: &str,
        libraries: &[String],
        structure: &ProjectStructure,
        configuration_files: &HashMap<String, String>,
        guidance: &str,
    ) -> Result<Analysis, AnalysisError> {
        let system = "You are an expert software developer. Analyze the following test results \
                      and identify the errors and the files that must change.";

        let prompt = format!(
            "Analyze the following test results and identify every error. For each error, \
             determine which project files must be modified to fix it, using the project \
             structure to resolve file paths relative to the project root.\n\n\
             Programming Language:\n{language}\n\n\
             Libraries:\n{libraries}\n\n\
             Test Results:\n{results}\n\n\
             Project Structure:\n{structure}\n\n\
             Configuration Files:\n{configuration}\n\n\
             Reflections on Previous Attempts:\n{guidance}\n\n\
             Ensure the following:\n\
             1. **error_count** is the total number of distinct errors in the test results. \
             Report 0 when all tests passed.\n\
             2. **errors** lists each error message verbatim.\n\
             3. **files_to_modify** lists project-root-relative source file paths that must \
             change. Include test files only when the test itself is wrong.\n\
             4. **configuration_files_to_modify** lists configuration files (from the provided \
             set) that must change, for example to add a missing dependency.\n\n\
             Return the result in JSON format without any explanation.\n\n\
             JSON Format Example:\n\
             {format}",
            language = language,
            libraries = libraries.join(", "),
            results = test_results,
            structure = serde_json::to_string_pretty(structure).unwrap_or_default(),
            configuration = serde_json::to_string_pretty(configuration_files).unwrap_or_default(),
            guidance = if guidance.is_empty() { "None yet." } else { guidance },
            format = json!({
                "error_count": 0,
                "errors": ["..."],
                "files_to_modify": ["..."],
                "configuration_files_to_modify": ["..."]
            }),
        );

        for attempt in 1..=self.retry_limit {
            let response = oracle::complete(self.oracle, system, &prompt).await?;
            if let Some(analysis) = artifact::parse_json_object::<Analysis>(&response) {
                return Ok(analysis);
            }

            tracing::warn!(
                "Analysis reply did not parse (attempt {}/{})",
                attempt,
                self.retry_limit
            );
            if attempt < self.retry_limit {
                let delay = RETRY_BASE_DELAY_MS * 2u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AnalysisError::Unparseable {
            attempts: self.retry_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleReply, OracleRequest};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingOracle {
        calls: AtomicU32,
        replies: Vec<&'static str>,
    }

    impl CountingOracle {
        fn new(replies: Vec<&'static str>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                replies,
            }
        }
    }

    #[async_trait]
    impl Oracle for CountingOracle {
        async fn complete_once(&self, _request: &OracleRequest) -> Result<OracleReply> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let text = self.replies.get(n).copied().unwrap_or("not json");
            Ok(OracleReply {
                text: text.to_string(),
                natural_stop: true,
            })
        }
        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_parses_analysis_reply() {
        let oracle = CountingOracle::new(vec![
            r#"{"error_count": 2, "errors": ["a", "b"], "files_to_modify": ["calc.py"], "configuration_files_to_modify": []}"#,
        ]);
        let analyzer = TestResultAnalyzer::new(&oracle, 3);
        let analysis = analyzer
            .analyze("2 failed", "Python", &[], &ProjectStructure::new(), &HashMap::new(), "")
            .await
            .unwrap();
        assert_eq!(analysis.error_count, 2);
        assert_eq!(analysis.files_to_modify, vec!["calc.py".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_parseable() {
        let oracle = CountingOracle::new(vec![
            "garbage",
            r#"{"error_count": 1, "errors": ["x"], "files_to_modify": [], "configuration_files_to_modify": []}"#,
        ]);
        let analyzer = TestResultAnalyzer::new(&oracle, 3);
        let analysis = analyzer
            .analyze("1 failed", "Python", &[], &ProjectStructure::new(), &HashMap::new(), "")
            .await
            .unwrap();
        assert_eq!(analysis.error_count, 1);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_retry_limit() {
        let oracle = CountingOracle::new(vec!["bad", "bad", "bad"]);
        let analyzer = TestResultAnalyzer::new(&oracle, 3);
        let error = analyzer
            .analyze("output", "Python", &[], &ProjectStructure::new(), &HashMap::new(), "")
            .await
            .unwrap_err();
        assert!(matches!(error, AnalysisError::Unparseable { attempts: 3 }));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_oracle_error_propagates() {
        struct DownOracle;

        #[async_trait]
        impl Oracle for DownOracle {
            async fn complete_once(&self, _request: &OracleRequest) -> Result<OracleReply> {
                anyhow::bail!("connection refused")
            }
            fn name(&self) -> &str {
                "down"
            }
        }

        let analyzer = TestResultAnalyzer::new(&DownOracle, 3);
        let error = analyzer
            .analyze("output", "Python", &[], &ProjectStructure::new(), &HashMap::new(), "")
            .await
            .unwrap_err();
        assert!(matches!(error, AnalysisError::Oracle(_)));
    }
}
