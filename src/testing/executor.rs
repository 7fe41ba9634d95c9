// Test executor — runs the suite command with a bounded timeout

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Well-known artifact holding the latest raw outcome, overwritten on every
/// run for external inspection.
pub const TEST_RESULTS_FILE: &str = "TEST_RESULTS.txt";

/// Synthetic outcome text substituted when the command exceeds its timeout.
pub const TIMEOUT_SENTINEL: &str = "Test execution timed out.";

/// Raw result of one test-command execution. Never structured further here;
/// all interpretation is delegated to the oracle.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    /// Combined stdout + stderr
    pub output: String,
    pub timed_out: bool,
}

pub struct TestExecutor {
    base_path: PathBuf,
    timeout: Duration,
}

impl TestExecutor {
    pub fn new(base_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            base_path: base_path.into(),
            timeout,
        }
    }

    /// Execute `command` in a shell rooted at the base path.
    ///
    /// A timeout yields the sentinel outcome rather than an error; the raw
    /// outcome is always persisted to [`TEST_RESULTS_FILE`].
    pub async fn run(&self, command: &str) -> Result<TestOutcome> {
        tracing::debug!("Running test command: {}", command);

        let child = Command::new("bash")
            .arg("-c")
            .arg(command)
            .current_dir(&self.base_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let outcome = match timeout(self.timeout, child).await {
            Ok(result) => {
                let output = result
                    .with_context(|| format!("Failed to spawn test command: {}", command))?;
                let combined = format!(
                    "{}\n{}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                );
                TestOutcome {
                    output: combined,
                    timed_out: false,
                }
            }
            Err(_) => {
                tracing::warn!("Test command timed out after {:?}", self.timeout);
                TestOutcome {
                    output: TIMEOUT_SENTINEL.to_string(),
                    timed_out: true,
                }
            }
        };

        let results_path = self.base_path.join(TEST_RESULTS_FILE);
        std::fs::write(&results_path, &outcome.output)
            .with_context(|| format!("Failed to write {}", results_path.display()))?;

        Ok(outcome)
    }
}
