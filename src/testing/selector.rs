// Test-command selector
//
// Candidate commands come from the project documents and from heuristics
// over the project structure; every candidate is executed once and the full
// result set goes to the oracle, which picks the one that demonstrates
// genuine test execution. No selection means the whole run aborts cleanly.

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

use crate::artifact;
use crate::oracle::{self, Oracle};
use crate::project::{ProjectDocuments, ProjectStructure};

use super::executor::TestExecutor;

#[derive(Debug, Clone, Deserialize)]
struct DocExtraction {
    #[serde(default)]
    test_execution_commands: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Selection {
    #[serde(default)]
    correct_command: Option<String>,
}

pub struct CommandSelector<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> CommandSelector<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Collect candidate test commands from the documents and from the
    /// project structure, de-duplicated in discovery order.
    pub async fn collect_candidates(
        &self,
        docs: &ProjectDocuments,
        structure: &ProjectStructure,
    ) -> Vec<String> {
        let mut candidates = self.candidates_from_docs(docs).await;
        let from_structure = self.candidates_from_structure(structure, &candidates).await;

        for command in from_structure {
            if !candidates.contains(&command) {
                candidates.push(command);
            }
        }
        candidates
    }

    async fn candidates_from_docs(&self, docs: &ProjectDocuments) -> Vec<String> {
        let system = "You are an expert test engineer. Extract all test file paths and test \
                      execution commands from the provided README and TECHNICAL_DESIGN documents.";

        let prompt = format!(
            "Based on the following README and TECHNICAL_DESIGN documents, extract all test file \
             paths and test execution commands.\n\n\
             README:\n{readme}\n\n\
             TECHNICAL_DESIGN:\n{design}\n\n\
             Return the result in JSON format without any explanation.\n\n\
             JSON Format Example:\n\
             {{\n\
                 \"test_files\": A list of test file paths,\n\
                 \"test_execution_commands\": A JSON array of test execution commands\n\
             }}",
            readme = docs.readme,
            design = docs.technical_design,
        );

        match oracle::complete(self.oracle, system, &prompt).await {
            Ok(response) => artifact::parse_json_object::<DocExtraction>(&response)
                .map(|e| e.test_execution_commands)
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Candidate extraction from documents failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn candidates_from_structure(
        &self,
        structure: &ProjectStructure,
        existing: &[String],
    ) -> Vec<String> {
        let system = "You are an expert test engineer. Based on the project structure, predict \
                      possible test execution commands.";

        let prompt = format!(
            "Based on the following project structure, predict possible test execution commands.\n\n\
             The predicted test execution commands should not duplicate any commands already found \
             in the README or TECHNICAL_DESIGN.\n\n\
             Project Structure:\n{structure}\n\n\
             Existing Test Commands from Design Documents:\n{existing}\n\n\
             If there are common testing-related files in the project structure (e.g. `Makefile`, \
             `setup.py`, `Cargo.toml`), suggest appropriate test execution commands based on these \
             files, ensuring that no duplicate commands from the design documents are included.\n\n\
             Return the result in JSON format without any explanation.\n\n\
             JSON Format Example:\n\
             {{\n\
                 \"test_execution_commands\": A JSON array of predicted test execution commands\n\
             }}",
            structure = serde_json::to_string_pretty(structure).unwrap_or_default(),
            existing = serde_json::to_string_pretty(existing).unwrap_or_default(),
        );

        match oracle::complete(self.oracle, system, &prompt).await {
            Ok(response) => artifact::parse_json_object::<DocExtraction>(&response)
                .map(|e| e.test_execution_commands)
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Candidate prediction from structure failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Run every candidate once and ask the oracle which command actually
    /// exercises the test suite. Returns None when nothing qualifies.
    pub async fn select(
        &self,
        executor: &TestExecutor,
        candidates: &[String],
    ) -> Result<Option<String>> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let mut results_by_command = BTreeMap::new();
        for command in candidates {
            let outcome = executor.run(command).await?;
            results_by_command.insert(command.clone(), outcome.output);
        }

        let system = "You are an expert test engineer. Analyze the following test results for \
                      different commands and identify the most effective one.";

        let prompt = format!(
            "You are provided with test results from different test execution commands. Your task \
             is to select the most **effective** test command, considering the following criteria:\n\n\
             1. If the test command returns errors that indicate a **language mismatch** (e.g. \
             trying to run Python tests in a JavaScript project), consider that test command \
             invalid.\n\
             2. Ignore errors that are caused by **incorrect test command usage** (e.g. running a \
             completely unrelated test framework).\n\
             3. Among test commands that return errors from actual **test code** execution, even \
             if the error count is greater than zero, consider them **valid**.\n\
             4. If multiple test commands are valid, select the one that covers the **widest \
             range** of tests or files.\n\
             5. Focus on the test results that best align with the project structure and goals.\n\n\
             Test Results by Command:\n{results}\n\n\
             Return the correct test command in JSON format without any explanation:\n\
             {format}",
            results = serde_json::to_string_pretty(&results_by_command).unwrap_or_default(),
            format = json!({"correct_command": "the most effective test command"}),
        );

        let response = oracle::complete(self.oracle, system, &prompt).await?;
        let selected = artifact::parse_json_object::<Selection>(&response)
            .and_then(|s| s.correct_command)
            .filter(|c| !c.trim().is_empty());

        match &selected {
            Some(command) => tracing::info!("Selected test command: {}", command),
            None => tracing::warn!("No valid test command selected"),
        }

        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleReply, OracleRequest};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Answers each prompt by keyword.
    struct KeywordOracle;

    #[async_trait]
    impl Oracle for KeywordOracle {
        async fn complete_once(&self, request: &OracleRequest) -> Result<OracleReply> {
            let text = if request.prompt.contains("extract all test file paths") {
                r#"{"test_files": [], "test_execution_commands": ["echo doc-tests"]}"#
            } else if request.prompt.contains("predict possible test execution commands") {
                r#"{"test_execution_commands": ["echo structure-tests", "echo doc-tests"]}"#
            } else if request.prompt.contains("select the most **effective** test command") {
                r#"{"correct_command": "echo doc-tests"}"#
            } else {
                "{}"
            };
            Ok(OracleReply {
                text: text.to_string(),
                natural_stop: true,
            })
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    fn docs() -> ProjectDocuments {
        ProjectDocuments {
            readme: "# proj".to_string(),
            technical_design: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn test_candidates_are_deduplicated() {
        let oracle = KeywordOracle;
        let selector = CommandSelector::new(&oracle);
        let candidates = selector
            .collect_candidates(&docs(), &ProjectStructure::new())
            .await;
        assert_eq!(
            candidates,
            vec!["echo doc-tests".to_string(), "echo structure-tests".to_string()]
        );
    }

    #[tokio::test]
    async fn test_select_runs_candidates_and_picks_one() {
        let oracle = KeywordOracle;
        let selector = CommandSelector::new(&oracle);
        let dir = tempfile::tempdir().unwrap();
        let executor = TestExecutor::new(dir.path(), Duration::from_secs(30));

        let selected = selector
            .select(&executor, &["echo doc-tests".to_string()])
            .await
            .unwrap();
        assert_eq!(selected.as_deref(), Some("echo doc-tests"));
    }

    #[tokio::test]
    async fn test_select_with_no_candidates_is_none() {
        let oracle = KeywordOracle;
        let selector = CommandSelector::new(&oracle);
        let dir = tempfile::tempdir().unwrap();
        let executor = TestExecutor::new(dir.path(), Duration::from_secs(30));

        let selected = selector.select(&executor, &[]).await.unwrap();
        assert!(selected.is_none());
    }

    #[tokio::test]
    async fn test_malformed_selection_is_none() {
        struct GarbageOracle;

        #[async_trait]
        impl Oracle for GarbageOracle {
            async fn complete_once(&self, _request: &OracleRequest) -> Result<OracleReply> {
                Ok(OracleReply {
                    text: "no json here".to_string(),
                    natural_stop: true,
                })
            }
            fn name(&self) -> &str {
                "garbage"
            }
        }

        let oracle = GarbageOracle;
        let selector = CommandSelector::new(&oracle);
        let dir = tempfile::tempdir().unwrap();
        let executor = TestExecutor::new(dir.path(), Duration::from_secs(30));

        let selected = selector
            .select(&executor, &["echo hi".to_string()])
            .await
            .unwrap();
        assert!(selected.is_none());
    }
}
