use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Spawn `ollama serve` when the health probe fails.
    #[serde(default = "default_spawn_if_down")]
    pub spawn_if_down: bool,
    #[serde(default = "default_startup_poll_attempts")]
    pub startup_poll_attempts: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            spawn_if_down: default_spawn_if_down(),
            startup_poll_attempts: default_startup_poll_attempts(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3.2".to_string()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_spawn_if_down() -> bool {
    true
}
fn default_startup_poll_attempts() -> u32 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoaderConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    [".py", ".js", ".java", ".md", ".txt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_summary_path")]
    pub summary_path: PathBuf,
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            summary_path: default_summary_path(),
            index_dir: default_index_dir(),
        }
    }
}

fn default_summary_path() -> PathBuf {
    PathBuf::from("RepoSummary.md")
}
fn default_index_dir() -> PathBuf {
    PathBuf::from(".rchat/index")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

/// Load configuration from a TOML file, falling back to defaults when the
/// file does not exist. Environment overrides are applied after parsing.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config: Config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);
    validate(&config)?;

    Ok(config)
}

/// Some deployments configure the model and endpoint through the
/// environment rather than the config file; the env wins when set.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(model) = std::env::var("RCHAT_MODEL") {
        if !model.is_empty() {
            config.runtime.model = model;
        }
    }
    let endpoint = std::env::var("RCHAT_ENDPOINT").or_else(|_| std::env::var("OLLAMA_HOST"));
    if let Ok(endpoint) = endpoint {
        if !endpoint.is_empty() {
            config.runtime.endpoint = endpoint;
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.chunk_overlap must be < chunking.chunk_size");
    }
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if !(0.0..=2.0).contains(&config.runtime.temperature) {
        anyhow::bail!("runtime.temperature must be in [0.0, 2.0]");
    }
    if config.runtime.endpoint.trim().is_empty() {
        anyhow::bail!("runtime.endpoint must not be empty");
    }
    if config.loader.extensions.is_empty() {
        anyhow::bail!("loader.extensions must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.runtime.model, "llama3.2");
        assert_eq!(config.runtime.embedding_model, "nomic-embed-text");
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.output.summary_path, PathBuf::from("RepoSummary.md"));
        assert!(config.loader.extensions.contains(&".py".to_string()));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [runtime]
            model = "codellama"
            temperature = 0.2

            [retrieval]
            top_k = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.runtime.model, "codellama");
        assert_eq!(config.retrieval.top_k, 3);
        // untouched sections keep their defaults
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.runtime.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_validate_rejects_overlap_ge_size() {
        let mut config = Config::default();
        config.chunking.chunk_size = 100;
        config.chunking.chunk_overlap = 100;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let mut config = Config::default();
        config.runtime.temperature = 3.5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/nonexistent/rchat.toml")).unwrap();
        assert_eq!(config.chunking.chunk_size, 1000);
    }
}
