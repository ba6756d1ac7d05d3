//! Configuration loading
//!
//! Process settings come from defaults, a TOML file, and the environment
//! (CLI > Env > File > Defaults). Repository documentation preferences come
//! from a YAML file kept in the repository.

pub mod repo_config;
pub mod settings;

pub use repo_config::{load_repo_config, parse_repo_config, RepoConfig, ScopeConfig, StyleConfig};
pub use settings::{load_settings, AnalysisSettings, BackendSettings, GenerationSettings, Settings};
