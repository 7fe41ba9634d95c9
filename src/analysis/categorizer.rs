// Error categorization by severity
//
// The oracle groups raw error lines into four severity buckets. A malformed
// or failed response degrades to a pattern heuristic so categorization can
// never stall the repair loop.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::artifact;
use crate::oracle::{self, Oracle};

/// Errors grouped by severity, most urgent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedErrors {
    #[serde(default)]
    pub critical: Vec<String>,
    #[serde(default)]
    pub high: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
    #[serde(default)]
    pub low: Vec<String>,
}

impl CategorizedErrors {
    pub fn is_empty(&self) -> bool {
        self.critical.is_empty()
            && self.high.is_empty()
            && self.medium.is_empty()
            && self.low.is_empty()
    }

    pub fn total(&self) -> usize {
        self.critical.len() + self.high.len() + self.medium.len() + self.low.len()
    }
}

pub struct ErrorCategorizer<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> ErrorCategorizer<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Categorize raw error text by severity. Infallible: oracle failures
    /// and unparseable replies fall back to [`categorize_heuristically`].
    pub async fn categorize(&self, errors: &[String]) -> CategorizedErrors {
        if errors.is_empty() {
            return CategorizedErrors::default();
        }

        let system = "You are an expert software developer. Categorize the following errors by \
                      severity.";

        let prompt = format!(
            "Categorize the following errors by severity: critical, high, medium, or low.\n\n\
             - **critical**: errors that prevent the code from compiling or being interpreted at \
             all, such as syntax errors, missing modules, or import failures.\n\
             - **high**: test failures, assertion errors, panics, and runtime exceptions raised \
             while executing tests.\n\
             - **medium**: other errors that affect behavior but do not stop the test run.\n\
             - **low**: warnings and style issues.\n\n\
             Errors:\n{errors}\n\n\
             Return the result in JSON format without any explanation.\n\n\
             JSON Format Example:\n\
             {format}",
            errors = serde_json::to_string_pretty(errors).unwrap_or_default(),
            format = json!({
                "critical": ["..."],
                "high": ["..."],
                "medium": ["..."],
                "low": ["..."]
            }),
        );

        match oracle::complete(self.oracle, system, &prompt).await {
            Ok(response) => match artifact::parse_json_object::<CategorizedErrors>(&response) {
                Some(categorized) if !categorized.is_empty() => categorized,
                _ => {
                    tracing::warn!("Categorization reply did not parse; using heuristic buckets");
                    categorize_heuristically(errors)
                }
            },
            Err(e) => {
                tracing::warn!("Categorization failed ({}); using heuristic buckets", e);
                categorize_heuristically(errors)
            }
        }
    }
}

/// Pattern-based fallback when the oracle cannot be consulted.
pub fn categorize_heuristically(errors: &[String]) -> CategorizedErrors {
    let mut categorized = CategorizedErrors::default();

    for error in errors {
        let lower = error.to_lowercase();
        if lower.contains("syntaxerror")
            || lower.contains("syntax error")
            || lower.contains("cannot find")
            || lower.contains("modulenotfounderror")
            || lower.contains("importerror")
            || lower.contains("compilation failed")
            || lower.contains("could not compile")
        {
            categorized.critical.push(error.clone());
        } else if lower.contains("assertionerror")
            || lower.contains("assertion failed")
            || lower.contains("panicked")
            || lower.contains("failed")
            || lower.contains("exception")
        {
            categorized.high.push(error.clone());
        } else if lower.contains("warning") {
            categorized.low.push(error.clone());
        } else {
            categorized.medium.push(error.clone());
        }
    }

    categorized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleReply, OracleRequest};
    use anyhow::Result;
    use async_trait::async_trait;

    struct FixedOracle(&'static str);

    #[async_trait]
    impl Oracle for FixedOracle {
        async fn complete_once(&self, _request: &OracleRequest) -> Result<OracleReply> {
            Ok(OracleReply {
                text: self.0.to_string(),
                natural_stop: true,
            })
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl Oracle for FailingOracle {
        async fn complete_once(&self, _request: &OracleRequest) -> Result<OracleReply> {
            anyhow::bail!("oracle unavailable")
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_empty_input_skips_oracle() {
        let categorizer = ErrorCategorizer::new(&FailingOracle);
        let categorized = categorizer.categorize(&[]).await;
        assert!(categorized.is_empty());
    }

    #[tokio::test]
    async fn test_oracle_buckets_are_used() {
        let oracle = FixedOracle(r#"{"critical": ["SyntaxError"], "high": [], "medium": [], "low": ["warn"]}"#);
        let categorizer = ErrorCategorizer::new(&oracle);
        let categorized = categorizer
            .categorize(&["SyntaxError".to_string(), "warn".to_string()])
            .await;
        assert_eq!(categorized.critical, vec!["SyntaxError".to_string()]);
        assert_eq!(categorized.low, vec!["warn".to_string()]);
        assert_eq!(categorized.total(), 2);
    }

    #[tokio::test]
    async fn test_oracle_failure_falls_back_to_heuristic() {
        let categorizer = ErrorCategorizer::new(&FailingOracle);
        let categorized = categorizer
            .categorize(&["SyntaxError: invalid syntax".to_string()])
            .await;
        assert_eq!(categorized.critical.len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_reply_falls_back_to_heuristic() {
        let oracle = FixedOracle("sorry, cannot help");
        let categorizer = ErrorCategorizer::new(&oracle);
        let categorized = categorizer
            .categorize(&["test_add failed: assertion failed".to_string()])
            .await;
        assert_eq!(categorized.high.len(), 1);
    }

    #[test]
    fn test_heuristic_buckets() {
        let categorized = categorize_heuristically(&[
            "ModuleNotFoundError: no module named calc".to_string(),
            "AssertionError: 3 != 4".to_string(),
            "DeprecationWarning: old api".to_string(),
            "unexpected value in config".to_string(),
        ]);
        assert_eq!(categorized.critical.len(), 1);
        assert_eq!(categorized.high.len(), 1);
        assert_eq!(categorized.low.len(), 1);
        assert_eq!(categorized.medium.len(), 1);
    }
}
