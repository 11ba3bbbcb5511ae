use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::cli::Cli;

pub const PROJECT_CONFIG_DIR: &str = ".qd";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub project_root: PathBuf,
    pub llm: LlmConfig,
    pub decomposition: DecompositionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            project_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            llm: LlmConfig::default(),
            decomposition: DecompositionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LlmConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_retries: usize,
    pub retry_base_ms: u64,
    pub retry_jitter_ms: u64,
    pub respect_retry_after: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            request_timeout_ms: 60_000,
            max_retries: 2,
            retry_base_ms: 1000,
            retry_jitter_ms: 500,
            respect_retry_after: true,
        }
    }
}

/// Tunables of the decomposition engine
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DecompositionConfig {
    /// Upper bound on generated sub-tasks; extra ones are truncated
    pub max_sub_tasks: usize,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub history_capacity: usize,
    /// Ask the completion service for intents before falling back to patterns
    pub enable_ai_analysis: bool,
    pub ai_temperature: f32,
    pub ai_max_tokens: u32,
    /// Pattern-complexity score at or above which a query is high complexity
    pub high_complexity_threshold: f64,
    /// Sub-tasks estimated above this many seconds raise a timing conflict
    pub long_task_threshold_secs: u64,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            max_sub_tasks: 10,
            cache_ttl_secs: 300,
            cache_capacity: 100,
            history_capacity: 100,
            enable_ai_analysis: true,
            ai_temperature: 0.1,
            ai_max_tokens: 1000,
            high_complexity_threshold: 0.7,
            long_task_threshold_secs: 3600,
        }
    }
}

impl DecompositionConfig {
    /// Returns a description of the first invalid setting
    pub fn validate(&self) -> Result<(), String> {
        if self.max_sub_tasks == 0 {
            return Err("max_sub_tasks must be greater than zero".to_string());
        }
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be greater than zero".to_string());
        }
        if self.history_capacity == 0 {
            return Err("history_capacity must be greater than zero".to_string());
        }
        if !(0.4..=1.0).contains(&self.high_complexity_threshold) {
            return Err(format!(
                "high_complexity_threshold must be within [0.4, 1.0], got {}",
                self.high_complexity_threshold
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub project_root: Option<PathBuf>,
    pub llm: Option<PartialLlmConfig>,
    pub decomposition: Option<PartialDecompositionConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PartialLlmConfig {
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub max_retries: Option<usize>,
    pub retry_base_ms: Option<u64>,
    pub retry_jitter_ms: Option<u64>,
    pub respect_retry_after: Option<bool>,
}

impl PartialLlmConfig {
    /// Fields set in `self` win over `other`
    fn or(self, other: PartialLlmConfig) -> PartialLlmConfig {
        PartialLlmConfig {
            connect_timeout_ms: self.connect_timeout_ms.or(other.connect_timeout_ms),
            request_timeout_ms: self.request_timeout_ms.or(other.request_timeout_ms),
            max_retries: self.max_retries.or(other.max_retries),
            retry_base_ms: self.retry_base_ms.or(other.retry_base_ms),
            retry_jitter_ms: self.retry_jitter_ms.or(other.retry_jitter_ms),
            respect_retry_after: self.respect_retry_after.or(other.respect_retry_after),
        }
    }

    fn resolve(self) -> LlmConfig {
        let d = LlmConfig::default();
        LlmConfig {
            connect_timeout_ms: self.connect_timeout_ms.unwrap_or(d.connect_timeout_ms),
            request_timeout_ms: self.request_timeout_ms.unwrap_or(d.request_timeout_ms),
            max_retries: self.max_retries.unwrap_or(d.max_retries),
            retry_base_ms: self.retry_base_ms.unwrap_or(d.retry_base_ms),
            retry_jitter_ms: self.retry_jitter_ms.unwrap_or(d.retry_jitter_ms),
            respect_retry_after: self.respect_retry_after.unwrap_or(d.respect_retry_after),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PartialDecompositionConfig {
    pub max_sub_tasks: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub cache_capacity: Option<usize>,
    pub history_capacity: Option<usize>,
    pub enable_ai_analysis: Option<bool>,
    pub ai_temperature: Option<f32>,
    pub ai_max_tokens: Option<u32>,
    pub high_complexity_threshold: Option<f64>,
    pub long_task_threshold_secs: Option<u64>,
}

impl PartialDecompositionConfig {
    fn or(self, other: PartialDecompositionConfig) -> PartialDecompositionConfig {
        PartialDecompositionConfig {
            max_sub_tasks: self.max_sub_tasks.or(other.max_sub_tasks),
            cache_ttl_secs: self.cache_ttl_secs.or(other.cache_ttl_secs),
            cache_capacity: self.cache_capacity.or(other.cache_capacity),
            history_capacity: self.history_capacity.or(other.history_capacity),
            enable_ai_analysis: self.enable_ai_analysis.or(other.enable_ai_analysis),
            ai_temperature: self.ai_temperature.or(other.ai_temperature),
            ai_max_tokens: self.ai_max_tokens.or(other.ai_max_tokens),
            high_complexity_threshold: self
                .high_complexity_threshold
                .or(other.high_complexity_threshold),
            long_task_threshold_secs: self
                .long_task_threshold_secs
                .or(other.long_task_threshold_secs),
        }
    }

    fn resolve(self) -> DecompositionConfig {
        let d = DecompositionConfig::default();
        DecompositionConfig {
            max_sub_tasks: self.max_sub_tasks.unwrap_or(d.max_sub_tasks),
            cache_ttl_secs: self.cache_ttl_secs.unwrap_or(d.cache_ttl_secs),
            cache_capacity: self.cache_capacity.unwrap_or(d.cache_capacity),
            history_capacity: self.history_capacity.unwrap_or(d.history_capacity),
            enable_ai_analysis: self.enable_ai_analysis.unwrap_or(d.enable_ai_analysis),
            ai_temperature: self.ai_temperature.unwrap_or(d.ai_temperature),
            ai_max_tokens: self.ai_max_tokens.unwrap_or(d.ai_max_tokens),
            high_complexity_threshold: self
                .high_complexity_threshold
                .unwrap_or(d.high_complexity_threshold),
            long_task_threshold_secs: self
                .long_task_threshold_secs
                .unwrap_or(d.long_task_threshold_secs),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl AppConfig {
    /// Priority: CLI args -> env vars -> project config -> global config -> defaults
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_root = std::env::current_dir().context("resolve current dir")?;

        let project_cfg = load_project_config(&project_root).unwrap_or_default();
        let file_cfg = load_file_config().unwrap_or_default();

        Ok(Self::merge(cli, project_root, project_cfg, file_cfg))
    }

    pub(crate) fn merge(
        cli: &Cli,
        project_root: PathBuf,
        project_cfg: FileConfig,
        file_cfg: FileConfig,
    ) -> Self {
        let api_key = cli
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .or(project_cfg.api_key)
            .or(file_cfg.api_key);
        let base_url = cli
            .base_url
            .clone()
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .or(project_cfg.base_url)
            .or(file_cfg.base_url)
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        let model = cli
            .model
            .clone()
            .or_else(|| std::env::var("OPENAI_MODEL").ok())
            .or(project_cfg.model)
            .or(file_cfg.model)
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        let project_root = project_cfg
            .project_root
            .or(file_cfg.project_root)
            .unwrap_or(project_root);

        let llm = project_cfg
            .llm
            .unwrap_or_default()
            .or(file_cfg.llm.unwrap_or_default())
            .resolve();

        let env_decomposition = PartialDecompositionConfig {
            max_sub_tasks: env_parse("QD_MAX_SUB_TASKS"),
            cache_ttl_secs: env_parse("QD_CACHE_TTL_SECS"),
            ..PartialDecompositionConfig::default()
        };
        let mut decomposition = env_decomposition
            .or(project_cfg.decomposition.unwrap_or_default())
            .or(file_cfg.decomposition.unwrap_or_default())
            .resolve();
        if cli.no_ai {
            decomposition.enable_ai_analysis = false;
        }

        Self {
            base_url,
            model,
            api_key,
            project_root,
            llm,
            decomposition,
        }
    }
}

pub fn load_file_config() -> Result<FileConfig> {
    use std::env;

    fn candidate_paths() -> Vec<PathBuf> {
        let mut v = Vec::new();
        if let Ok(p) = env::var("QD_CONFIG") {
            v.push(PathBuf::from(p));
        }
        if let Ok(xdg_home) = env::var("XDG_CONFIG_HOME") {
            v.push(Path::new(&xdg_home).join("qd/config.toml"));
        } else if let Some(config_dir) = dirs::config_dir() {
            v.push(config_dir.join("qd/config.toml"));
        }
        v
    }

    for p in candidate_paths() {
        if p.exists() {
            let s = fs::read_to_string(&p)
                .with_context(|| format!("read config file: {}", p.display()))?;
            match toml::from_str::<FileConfig>(&s) {
                Ok(cfg) => {
                    info!(path=%p.display(), "loaded config file");
                    return Ok(cfg);
                }
                Err(e) => {
                    warn!(path=%p.display(), error=%e.to_string(), "parse config failed");
                    continue;
                }
            }
        }
    }
    Ok(FileConfig::default())
}

/// Load project-specific configuration from .qd/config.toml
pub fn load_project_config(project_root: &Path) -> Result<FileConfig> {
    let project_config_path = project_root.join(PROJECT_CONFIG_DIR).join("config.toml");

    if project_config_path.exists() {
        let s = fs::read_to_string(&project_config_path).with_context(|| {
            format!(
                "read project config file: {}",
                project_config_path.display()
            )
        })?;
        match toml::from_str::<FileConfig>(&s) {
            Ok(cfg) => {
                info!(path=%project_config_path.display(), "loaded project config file");
                Ok(cfg)
            }
            Err(e) => {
                warn!(path=%project_config_path.display(), error=%e.to_string(), "parse project config failed");
                Ok(FileConfig::default())
            }
        }
    } else {
        Ok(FileConfig::default())
    }
}
