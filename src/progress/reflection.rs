// Reflection on stagnating repairs
//
// When the loop stops making progress, the oracle is asked to step back and
// reason about root causes. Reflections are kept in a bounded log so old
// attempts age out instead of growing the prompt without limit.

use anyhow::Result;
use std::collections::VecDeque;

use crate::analysis::CategorizedErrors;
use crate::oracle::{self, Oracle};

/// Bounded history of reflections, oldest first.
#[derive(Debug, Clone)]
pub struct ReflectionLog {
    entries: VecDeque<(usize, String)>,
    limit: usize,
}

impl ReflectionLog {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, iteration: usize, reflection: String) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back((iteration, reflection));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Render for prompt inclusion, one block per retained reflection.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(iteration, reflection)| {
                format!("Iteration {}:\n{}", iteration, reflection)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub struct ReflectionEngine<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> ReflectionEngine<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Produce a fresh reflection on why the repairs are not converging.
    pub async fn reflect(
        &self,
        test_results: &str,
        errors: &CategorizedErrors,
        log: &ReflectionLog,
    ) -> Result<String> {
        let system = "You are an expert software developer. The previous fixes did not reduce \
                      the errors; reflect on the root cause and propose a different approach.";

        let prompt = format!(
            "The last iterations of fixes did not make progress. Reflect on what may be causing \
             the repeated failures and describe, concretely, what should be done differently in \
             the next attempt.\n\n\
             Test Results:\n{results}\n\n\
             Categorized Errors:\n{errors}\n\n\
             Previous Reflections:\n{previous}\n\n\
             Consider whether the errors point at a deeper structural problem, whether the wrong \
             files are being modified, and whether an earlier fix introduced a regression. Answer \
             in plain prose.",
            results = test_results,
            errors = serde_json::to_string_pretty(errors).unwrap_or_default(),
            previous = if log.is_empty() {
                "None.".to_string()
            } else {
                log.render()
            },
        );

        oracle::complete(self.oracle, system, &prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleReply, OracleRequest};
    use async_trait::async_trait;

    #[test]
    fn test_log_evicts_oldest_beyond_limit() {
        let mut log = ReflectionLog::new(2);
        log.push(1, "first".to_string());
        log.push(2, "second".to_string());
        log.push(3, "third".to_string());

        assert_eq!(log.len(), 2);
        let rendered = log.render();
        assert!(!rendered.contains("first"));
        assert!(rendered.contains("Iteration 2:\nsecond"));
        assert!(rendered.contains("Iteration 3:\nthird"));
    }

    #[test]
    fn test_zero_limit_still_keeps_latest() {
        let mut log = ReflectionLog::new(0);
        log.push(1, "only".to_string());
        log.push(2, "newer".to_string());
        assert_eq!(log.len(), 1);
        assert!(log.render().contains("newer"));
    }

    #[tokio::test]
    async fn test_reflect_includes_history() {
        struct EchoOracle;

        #[async_trait]
        impl Oracle for EchoOracle {
            async fn complete_once(&self, request: &OracleRequest) -> anyhow::Result<OracleReply> {
                assert!(request.prompt.contains("stuck on imports"));
                Ok(OracleReply {
                    text: "try restructuring the module".to_string(),
                    natural_stop: true,
                })
            }
            fn name(&self) -> &str {
                "echo"
            }
        }

        let mut log = ReflectionLog::new(5);
        log.push(2, "stuck on imports".to_string());

        let engine = ReflectionEngine::new(&EchoOracle);
        let reflection = engine
            .reflect("3 failed", &CategorizedErrors::default(), &log)
            .await
            .unwrap();
        assert_eq!(reflection, "try restructuring the module");
    }
}
