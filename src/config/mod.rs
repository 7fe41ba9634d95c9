// Configuration: agent.toml settings and loader

pub mod loader;
pub mod settings;

pub use loader::load_config;
pub use settings::{Config, LoopConfig, OracleConfig, ProjectConfig};
