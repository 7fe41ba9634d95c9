// Configuration structs

use serde::Deserialize;
use std::path::PathBuf;

/// Full agent configuration, loaded from `agent.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default, rename = "loop")]
    pub tuning: LoopConfig,
}

/// The project under repair.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Original feature requirement (context for the oracle; never re-generated)
    #[serde(default)]
    pub requirement: String,

    /// Target programming language name (e.g. "Rust", "Python")
    pub language: String,

    /// Libraries/middleware the project is built on
    #[serde(default)]
    pub libraries: Vec<String>,

    /// Root of the project tree; every path the loop touches resolves under it
    pub base_path: PathBuf,
}

/// Remote completion service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// OpenAI-compatible endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token; may also come from MEND_API_KEY / OPENAI_API_KEY
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,
}

/// Loop tuning knobs.
///
/// The stagnation deltas are heuristic plateau thresholds, not exact-equality
/// semantics; they are exposed here so operators can adjust them.
#[derive(Debug, Clone, Deserialize)]
pub struct LoopConfig {
    /// Hard cap on repair iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Test-command timeout in seconds
    #[serde(default = "default_test_timeout")]
    pub test_timeout_secs: u64,

    /// Stagnation holds when |Δcritical| is at most this
    #[serde(default)]
    pub stagnation_critical_delta: usize,

    /// ...and |Δhigh| is at most this
    #[serde(default = "default_high_delta")]
    pub stagnation_high_delta: usize,

    /// How many reflection entries are carried forward
    #[serde(default = "default_reflection_limit")]
    pub reflection_log_limit: usize,

    /// How many times the analyzer re-asks on a malformed response
    #[serde(default = "default_analysis_retries")]
    pub analysis_retry_limit: u32,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_iterations() -> usize {
    20
}

fn default_test_timeout() -> u64 {
    300
}

fn default_high_delta() -> usize {
    2
}

fn default_reflection_limit() -> usize {
    5
}

fn default_analysis_retries() -> u32 {
    3
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            test_timeout_secs: default_test_timeout(),
            stagnation_critical_delta: 0,
            stagnation_high_delta: default_high_delta(),
            reflection_log_limit: default_reflection_limit(),
            analysis_retry_limit: default_analysis_retries(),
        }
    }
}

impl Config {
    /// Validate configuration and return helpful errors.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.project.language.trim().is_empty() {
            anyhow::bail!("project.language must not be empty");
        }

        if self.oracle.api_key.trim().is_empty() {
            anyhow::bail!(
                "No oracle API key configured.\n\n\
                 Set [oracle] api_key in agent.toml, or export one of:\n  \
                 MEND_API_KEY / OPENAI_API_KEY"
            );
        }

        if !self.oracle.base_url.starts_with("http") {
            anyhow::bail!(
                "Invalid oracle base_url: '{}'\nExpected an http(s) URL",
                self.oracle.base_url
            );
        }

        if self.tuning.max_iterations == 0 {
            anyhow::bail!("loop.max_iterations must be greater than 0");
        }

        if self.tuning.test_timeout_secs == 0 {
            anyhow::bail!("loop.test_timeout_secs must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        toml::from_str(
            r#"
            [project]
            language = "Python"
            base_path = "/tmp/project"

            [oracle]
            api_key = "test-key"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = minimal_config();
        assert_eq!(config.tuning.max_iterations, 20);
        assert_eq!(config.tuning.test_timeout_secs, 300);
        assert_eq!(config.tuning.stagnation_critical_delta, 0);
        assert_eq!(config.tuning.stagnation_high_delta, 2);
        assert_eq!(config.tuning.reflection_log_limit, 5);
        assert_eq!(config.oracle.model, "gpt-4o");
    }

    #[test]
    fn test_validate_ok() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_api_key() {
        let mut config = minimal_config();
        config.oracle.api_key = String::new();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("API key"));
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let mut config = minimal_config();
        config.tuning.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_loop_table_overrides() {
        let config: Config = toml::from_str(
            r#"
            [project]
            language = "Rust"
            libraries = ["tokio", "serde"]
            base_path = "/work/app"

            [oracle]
            api_key = "k"
            model = "local-model"
            base_url = "http://localhost:8080"

            [loop]
            max_iterations = 5
            stagnation_high_delta = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.tuning.max_iterations, 5);
        assert_eq!(config.tuning.stagnation_high_delta, 4);
        assert_eq!(config.project.libraries, vec!["tokio", "serde"]);
        assert_eq!(config.oracle.model, "local-model");
    }
}
