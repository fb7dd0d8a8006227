use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are the Knowledge Base Assistant, an AI support tool.
Answer questions using the provided knowledge base. Be professional and concise.
If the answer isn't in the documents, say so honestly.";

pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root for `training_docs/` and `sessions/`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub sessions: SessionsConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

// ── Gateway ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Gateway port (default: 5000)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Upper bound for request bodies, uploads included
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    5000
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ── Admin ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_password")]
    pub password: String,
    /// Key for signing the session cookie. `None` means a random per-process
    /// key, so cookies do not survive a restart.
    #[serde(default)]
    pub session_secret: Option<String>,
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.into()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: default_admin_password(),
            session_secret: None,
        }
    }
}

impl AdminConfig {
    pub fn uses_default_password(&self) -> bool {
        self.password == DEFAULT_ADMIN_PASSWORD
    }
}

// ── LLM endpoint ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_api_version")]
    pub api_version: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_llm_endpoint() -> String {
    "https://YOUR-RESOURCE.services.ai.azure.com".into()
}

fn default_llm_model() -> String {
    "claude-sonnet-4-20250514".into()
}

fn default_llm_api_version() -> String {
    "2024-05-01-preview".into()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: None,
            model: default_llm_model(),
            api_version: default_llm_api_version(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

// ── Assistant ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Initial system prompt; admin edits replace it until restart
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
        }
    }
}

// ── Sessions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Rebuild in-memory history from the transcript log when a known
    /// session id shows up after a restart.
    #[serde(default = "default_true")]
    pub rehydrate_from_log: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            rehydrate_from_log: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            gateway: GatewayConfig::default(),
            admin: AdminConfig::default(),
            llm: LlmConfig::default(),
            assistant: AssistantConfig::default(),
            sessions: SessionsConfig::default(),
        }
    }
}

impl Config {
    /// Load from an optional TOML file, then layer environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("KBCHAT_CONFIG").map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.data_dir = expand_tilde(&config.data_dir);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))
            .context("Failed to parse config file")
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Config::apply_env_overrides`] with an injectable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |primary: &str, fallback: &str| {
            lookup(primary)
                .or_else(|| lookup(fallback))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        // Data directory: KBCHAT_DATA_DIR
        if let Some(dir) = lookup("KBCHAT_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }

        // Gateway host/port: KBCHAT_HOST or HOST, KBCHAT_PORT or PORT
        if let Some(host) = get("KBCHAT_HOST", "HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = get("KBCHAT_PORT", "PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.gateway.port = port;
        }

        // Admin: KBCHAT_ADMIN_PASSWORD or ADMIN_PASSWORD
        if let Some(password) = get("KBCHAT_ADMIN_PASSWORD", "ADMIN_PASSWORD") {
            self.admin.password = password;
        }
        if let Some(secret) = get("KBCHAT_SESSION_SECRET", "SESSION_SECRET") {
            self.admin.session_secret = Some(secret);
        }

        // LLM endpoint: KBCHAT_LLM_* or the AZURE_AI_* names
        if let Some(endpoint) = get("KBCHAT_LLM_ENDPOINT", "AZURE_AI_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
        if let Some(key) = get("KBCHAT_LLM_API_KEY", "AZURE_AI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get("KBCHAT_LLM_MODEL", "AZURE_AI_MODEL") {
            self.llm.model = model;
        }
        if let Some(version) = get("KBCHAT_LLM_API_VERSION", "AZURE_AI_API_VERSION") {
            self.llm.api_version = version;
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.gateway.port == 0 {
            return Err(ConfigError::Validation("gateway.port must be non-zero".into()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation("llm.model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Validation(format!(
                "llm.temperature {} is outside 0.0..=2.0",
                self.llm.temperature
            )));
        }
        Ok(())
    }

    pub fn knowledge_dir(&self) -> PathBuf {
        self.data_dir.join("training_docs")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned())
}
