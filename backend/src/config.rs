use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DEFAULT_CONFIG_PATH: &str = "config/chromavision.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid model base URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: None,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub name: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            name: "gemini-2.5-flash".to_string(),
            timeout_secs: 30,
            api_key: None,
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
}

impl AppConfig {
    /// Loads `.env`, the optional YAML file, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let explicit = env::var("CHROMAVISION_CONFIG").ok().map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };

        config.apply_overrides(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(config_str)?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_env("PORT", port)?;
        }
        if let Some(limit) = lookup("MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = parse_env("MAX_UPLOAD_BYTES", limit)?;
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Some(name) = lookup("GEMINI_MODEL") {
            self.model.name = name;
        }
        if let Some(base_url) = lookup("GEMINI_BASE_URL") {
            self.model.base_url = base_url;
        }
        if let Some(timeout) = lookup("MODEL_TIMEOUT_SECS") {
            self.model.timeout_secs = parse_env("MODEL_TIMEOUT_SECS", timeout)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.model.base_url)?;
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::InvalidEnv {
                name: "MODEL_TIMEOUT_SECS",
                value: self.model.timeout_secs.to_string(),
            });
        }
        match self.model.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}
