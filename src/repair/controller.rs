// Repair loop controller
//
// Drives the whole run: pick the test command once, then iterate
// run-analyze-patch until the suite is clean or the iteration cap is hit.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::analysis::{AnalysisError, CategorizedErrors, ErrorCategorizer, TestResultAnalyzer};
use crate::config::Config;
use crate::oracle::Oracle;
use crate::patch::{PatchApplier, PatchGenerator};
use crate::progress::{ProgressTracker, ReflectionEngine, ReflectionLog};
use crate::project::{
    self, discover_scan_rules, load_configuration_files, FileContentMap, ScanRules,
};
use crate::testing::{CommandSelector, TestExecutor};

use super::context::IterationContext;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The suite reported zero errors
    Success { iterations: usize },
    /// No candidate command demonstrated genuine test execution
    NoTestCommand,
    /// The iteration cap was exhausted with errors remaining
    IterationCap,
}

pub struct RepairLoop<'a> {
    config: &'a Config,
    oracle: &'a dyn Oracle,
}

impl<'a> RepairLoop<'a> {
    pub fn new(config: &'a Config, oracle: &'a dyn Oracle) -> Self {
        Self { config, oracle }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let base = &self.config.project.base_path;
        let docs = project::read_required_documents(base)?;

        let rules = discover_scan_rules(
            self.oracle,
            &self.config.project.language,
            &self.config.project.libraries,
        )
        .await;

        let executor = TestExecutor::new(
            base,
            Duration::from_secs(self.config.tuning.test_timeout_secs),
        );

        let structure = self.scan(&rules)?;
        let selector = CommandSelector::new(self.oracle);
        let candidates = selector.collect_candidates(&docs, &structure).await;
        tracing::info!("Candidate test commands: {:?}", candidates);

        let Some(command) = selector.select(&executor, &candidates).await? else {
            tracing::error!("No usable test command; aborting");
            return Ok(RunOutcome::NoTestCommand);
        };

        let analyzer = TestResultAnalyzer::new(self.oracle, self.config.tuning.analysis_retry_limit);
        let categorizer = ErrorCategorizer::new(self.oracle);
        let generator = PatchGenerator::new(self.oracle);
        let applier = PatchApplier::new(base);
        let reflection_engine = ReflectionEngine::new(self.oracle);
        let tracker = ProgressTracker::new(
            self.config.tuning.stagnation_critical_delta as i64,
            self.config.tuning.stagnation_high_delta as i64,
        );

        let mut files = FileContentMap::new(base);
        let mut reflections = ReflectionLog::new(self.config.tuning.reflection_log_limit);
        let mut previous_errors: Option<CategorizedErrors> = None;

        for iteration in 1..=self.config.tuning.max_iterations {
            tracing::info!(
                "Iteration {}/{}",
                iteration,
                self.config.tuning.max_iterations
            );

            let structure = self.scan(&rules)?;
            let outcome = executor.run(&command).await?;
            let configuration_files = load_configuration_files(base, &structure);

            let mut analysis = match analyzer
                .analyze(
                    &outcome.output,
                    &self.config.project.language,
                    &self.config.project.libraries,
                    &structure,
                    &configuration_files,
                    &reflections.render(),
                )
                .await
            {
                Ok(analysis) => analysis,
                Err(AnalysisError::Unparseable { attempts }) => {
                    tracing::warn!(
                        "Analysis unusable after {} attempts; moving to the next iteration",
                        attempts
                    );
                    continue;
                }
                Err(AnalysisError::Oracle(e)) => {
                    return Err(e.context("Test-result analysis failed"));
                }
            };

            if analysis.error_count == 0 {
                tracing::info!("All tests passed after {} iteration(s)", iteration);
                return Ok(RunOutcome::Success { iterations: iteration });
            }
            tracing::info!("{} error(s) remain", analysis.error_count);

            let mut errors = categorizer.categorize(&analysis.errors).await;

            if tracker.is_stagnant(previous_errors.as_ref(), &errors) {
                match reflection_engine
                    .reflect(&outcome.output, &errors, &reflections)
                    .await
                {
                    Ok(reflection) => {
                        tracing::info!("Reflection recorded for iteration {}", iteration);
                        reflections.push(iteration, reflection);

                        // re-run the analysis with the fresh guidance folded in
                        match analyzer
                            .analyze(
                                &outcome.output,
                                &self.config.project.language,
                                &self.config.project.libraries,
                                &structure,
                                &configuration_files,
                                &reflections.render(),
                            )
                            .await
                        {
                            Ok(reanalysis) => {
                                if reanalysis.error_count == 0 {
                                    tracing::info!(
                                        "All tests passed after {} iteration(s)",
                                        iteration
                                    );
                                    return Ok(RunOutcome::Success { iterations: iteration });
                                }
                                errors = categorizer.categorize(&reanalysis.errors).await;
                                analysis = reanalysis;
                            }
                            Err(e) => {
                                tracing::warn!(
                                    "Re-analysis after reflection failed ({}); keeping the \
                                     earlier analysis",
                                    e
                                );
                            }
                        }
                    }
                    Err(e) => tracing::warn!("Reflection failed: {}", e),
                }
            }

            let mut flagged = analysis.files_to_modify.clone();
            for path in &analysis.configuration_files_to_modify {
                if !flagged.contains(path) {
                    flagged.push(path.clone());
                }
            }
            files.load(&flagged);

            let ctx = IterationContext {
                iteration,
                requirement: self.config.project.requirement.clone(),
                language: self.config.project.language.clone(),
                libraries: self.config.project.libraries.clone(),
                test_results: outcome.output.clone(),
                errors: errors.clone(),
                files: files.subset(&flagged),
                configuration_files,
                structure,
                reflections: reflections.render(),
            };

            let patch = generator.generate(&ctx).await?;
            let report = applier.apply(&patch)?;
            tracing::info!(
                "Applied patch: {} written, {} deleted, {} rejected",
                report.written.len(),
                report.deleted.len(),
                report.rejected.len()
            );

            files.reload().context("Failed to reload project files")?;
            previous_errors = Some(errors);
        }

        tracing::warn!(
            "Iteration cap of {} reached with errors remaining",
            self.config.tuning.max_iterations
        );
        Ok(RunOutcome::IterationCap)
    }

    fn scan(&self, rules: &ScanRules) -> Result<crate::project::ProjectStructure> {
        project::scan(
            &self.config.project.base_path,
            &rules.skip_folders,
            &rules.file_extensions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoopConfig, OracleConfig, ProjectConfig};
    use crate::oracle::{OracleReply, OracleRequest};
    use async_trait::async_trait;
    use std::path::Path;

    fn config(base: &Path) -> Config {
        Config {
            project: ProjectConfig {
                requirement: "A calculator".to_string(),
                language: "Python".to_string(),
                libraries: vec!["pytest".to_string()],
                base_path: base.to_path_buf(),
            },
            oracle: OracleConfig::default(),
            tuning: LoopConfig::default(),
        }
    }

    fn seed_documents(base: &Path) {
        std::fs::write(base.join("README.md"), "# calc").unwrap();
        std::fs::write(base.join("TECHNICAL_DESIGN.json"), "{}").unwrap();
    }

    /// Never proposes a test command.
    struct NoCommandOracle;

    #[async_trait]
    impl Oracle for NoCommandOracle {
        async fn complete_once(&self, _request: &OracleRequest) -> anyhow::Result<OracleReply> {
            Ok(OracleReply {
                text: "{}".to_string(),
                natural_stop: true,
            })
        }
        fn name(&self) -> &str {
            "no-command"
        }
    }

    #[tokio::test]
    async fn test_missing_documents_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let repair = RepairLoop::new(&config, &NoCommandOracle);
        assert!(repair.run().await.is_err());
    }

    #[tokio::test]
    async fn test_no_test_command_aborts_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        seed_documents(dir.path());
        let config = config(dir.path());
        let repair = RepairLoop::new(&config, &NoCommandOracle);
        let outcome = repair.run().await.unwrap();
        assert_eq!(outcome, RunOutcome::NoTestCommand);
    }
}
