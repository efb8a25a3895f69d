//! PlanMind configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main PlanMind configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Fixed user id; when unset a generated id is kept in the data directory
    #[serde(rename = "user-id")]
    pub user_id: Option<String>,

    /// Generation chain configuration
    pub generation: GenerationConfig,

    /// Persistence chain configuration
    pub persistence: PersistenceConfig,

    /// Document export configuration
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .planmind.yml
        let local_config = PathBuf::from(".planmind.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/planmind/planmind.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("planmind").join("planmind.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(p) => vec![p.clone()],
            None => {
                let mut v = vec![PathBuf::from(".planmind.yml")];
                if let Some(dir) = dirs::config_dir() {
                    v.push(dir.join("planmind").join("planmind.yml"));
                }
                v
            }
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// The user id to attribute sessions to
    ///
    /// Uses `user-id` from config if set, otherwise reads (or creates) the id
    /// file under `data_dir`.
    pub fn resolve_user_id(&self, data_dir: &Path) -> Result<String> {
        debug!(?data_dir, "resolve_user_id: called");
        if let Some(id) = self.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            debug!("resolve_user_id: using configured user id");
            return Ok(id.to_string());
        }

        let id_file = data_dir.join("user-id");
        if let Ok(existing) = fs::read_to_string(&id_file) {
            let existing = existing.trim();
            if !existing.is_empty() {
                debug!("resolve_user_id: using stored user id");
                return Ok(existing.to_string());
            }
        }

        debug!("resolve_user_id: generating new user id");
        let id = uuid::Uuid::new_v4().to_string();
        fs::create_dir_all(data_dir).context("Failed to create data directory")?;
        fs::write(&id_file, &id).context(format!("Failed to write {}", id_file.display()))?;
        Ok(id)
    }
}

/// Default data directory (`~/.local/share/planmind` on Linux)
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("planmind")
}

/// Generation chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Deadline for one provider call in milliseconds
    #[serde(rename = "deadline-ms")]
    pub deadline_ms: u64,

    /// Maximum tokens requested per plan
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Directory holding prompt overrides (`strategy.pmt`)
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,

    /// Providers, tried in order
    pub providers: Vec<ProviderConfig>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 180_000,
            max_tokens: 2048,
            temperature: 0.7,
            prompts_dir: None,
            providers: vec![ProviderConfig::named("anthropic"), ProviderConfig::named("openai")],
        }
    }
}

/// One LLM provider entry; unset fields take the provider's defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name ("anthropic" or "openai")
    pub provider: String,

    /// Set false to keep the entry but skip the tier
    pub enabled: bool,

    /// Model identifier
    pub model: Option<String>,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: Option<String>,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: Option<u32>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::named("anthropic")
    }
}

impl ProviderConfig {
    /// An enabled entry for `provider` with every other field defaulted
    pub fn named(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            enabled: true,
            model: None,
            api_key_env: None,
            base_url: None,
            max_tokens: None,
            timeout_ms: None,
        }
    }

    /// Fill unset fields from the provider's defaults
    pub fn resolve(&self) -> Result<ResolvedLlmConfig> {
        debug!(provider = %self.provider, "ProviderConfig::resolve: called");
        let (model, api_key_env, base_url) = match self.provider.as_str() {
            "anthropic" => {
                debug!("ProviderConfig::resolve: anthropic defaults");
                ("claude-sonnet-4-20250514", "ANTHROPIC_API_KEY", "https://api.anthropic.com")
            }
            "openai" => {
                debug!("ProviderConfig::resolve: openai defaults");
                ("gpt-4o-mini", "OPENAI_API_KEY", "https://api.openai.com")
            }
            other => {
                debug!(provider = %other, "ProviderConfig::resolve: unknown provider");
                return Err(eyre::eyre!(
                    "Unknown LLM provider: '{}'. Supported: anthropic, openai",
                    other
                ));
            }
        };

        Ok(ResolvedLlmConfig {
            provider: self.provider.clone(),
            model: self.model.clone().unwrap_or_else(|| model.to_string()),
            api_key_env: self.api_key_env.clone().unwrap_or_else(|| api_key_env.to_string()),
            base_url: self.base_url.clone().unwrap_or_else(|| base_url.to_string()),
            max_tokens: self.max_tokens.unwrap_or(4096),
            timeout_ms: self.timeout_ms.unwrap_or(120_000),
        })
    }
}

/// Provider configuration with every field decided
#[derive(Debug, Clone)]
pub struct ResolvedLlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key_env: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl ResolvedLlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        debug!(api_key_env = %self.api_key_env, "get_api_key: called");
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(eyre::eyre!("{} is not set", self.api_key_env)),
        }
    }
}

/// Persistence chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Deadline for one store call in milliseconds
    #[serde(rename = "deadline-ms")]
    pub deadline_ms: u64,

    /// Remote structured store (Supabase / PostgREST)
    pub remote: RemoteStoreConfig,

    /// Local JSON file store
    pub local: LocalStoreConfig,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 30_000,
            remote: RemoteStoreConfig::default(),
            local: LocalStoreConfig::default(),
        }
    }
}

/// Remote structured store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteStoreConfig {
    pub enabled: bool,

    /// Environment variable holding the project URL
    #[serde(rename = "url-env")]
    pub url_env: String,

    /// Environment variable holding the API key
    #[serde(rename = "key-env")]
    pub key_env: String,

    /// Table holding the sessions
    pub table: String,

    /// HTTP timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url_env: "SUPABASE_URL".to_string(),
            key_env: "SUPABASE_KEY".to_string(),
            table: "strategy_sessions".to_string(),
            timeout_ms: 15_000,
        }
    }
}

impl RemoteStoreConfig {
    /// URL and key from the environment, if both are present
    pub fn credentials(&self) -> Option<(String, String)> {
        debug!(url_env = %self.url_env, key_env = %self.key_env, "credentials: called");
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        match (read(&self.url_env), read(&self.key_env)) {
            (Some(url), Some(key)) => Some((url.trim_end_matches('/').to_string(), key)),
            _ => {
                debug!("credentials: missing");
                None
            }
        }
    }
}

/// Local JSON file store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalStoreConfig {
    pub enabled: bool,

    /// Path of the session array file
    pub path: PathBuf,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: sessionstore::default_store_path(),
        }
    }
}

/// Document export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Set false to always return the placeholder payload
    pub enabled: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
