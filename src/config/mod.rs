//! Configuration management

pub mod commands;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::BackendArgs;
use crate::translate::llm::{Backend, LlmConfig};

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "meditongue";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub glossary: GlossaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Completion backend (ollama, openai)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Client-side request timeout; unset means wait for the upstream
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_provider() -> String {
    Backend::Ollama.as_str().to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base")]
    pub base_url: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_base() -> String {
    Backend::Ollama.default_base_url().to_string()
}

fn default_ollama_model() -> String {
    Backend::Ollama.default_model().to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base(),
            model: default_ollama_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base")]
    pub base_url: String,

    /// Sent as a bearer token; local servers usually ignore it
    #[serde(default = "default_openai_key")]
    pub api_key: String,

    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_openai_base() -> String {
    Backend::OpenAI.default_base_url().to_string()
}

fn default_openai_key() -> String {
    "not-needed".to_string()
}

fn default_openai_model() -> String {
    Backend::OpenAI.default_model().to_string()
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base(),
            api_key: default_openai_key(),
            model: default_openai_model(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GlossaryConfig {
    /// Glossary JSON file; the bundled glossary is used when unset
    #[serde(default)]
    pub path: Option<String>,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_NAME))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config path")?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Save config to default location
    pub fn save(&self) -> Result<PathBuf> {
        let dir = Self::config_dir().context("Could not determine config directory")?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content).context("Failed to write config file")?;

        Ok(path)
    }

    /// Config file, then environment, then command-line flags.
    pub fn resolve(args: &BackendArgs) -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(_) => Self::load()?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_args(args);
        Ok(config)
    }

    /// Applies the environment variables the server has always honoured.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MODEL_BACKEND") {
            self.backend.provider = v;
        }
        if let Some(v) = lookup("OLLAMA_URL") {
            self.ollama.base_url = v;
        }
        if let Some(v) = lookup("OLLAMA_MODEL") {
            self.ollama.model = v;
        }
        if let Some(v) = lookup("OPENAI_BASE_URL") {
            self.openai.base_url = v;
        }
        if let Some(v) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = v;
        }
        if let Some(v) = lookup("OPENAI_MODEL") {
            self.openai.model = v;
        }
        if let Some(v) = lookup("MEDITONGUE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = v
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {:?}", v))?;
        }
        if let Some(v) = lookup("GLOSSARY_PATH") {
            self.glossary.path = Some(v);
        }
        Ok(())
    }

    pub fn apply_args(&mut self, args: &BackendArgs) {
        if let Some(ref backend) = args.backend {
            self.backend.provider = backend.clone();
        }
        if let Some(ref path) = args.glossary {
            self.glossary.path = Some(path.display().to_string());
        }

        let backend = self.backend();
        if let Some(ref model) = args.model {
            match backend {
                Backend::Ollama => self.ollama.model = model.clone(),
                Backend::OpenAI => self.openai.model = model.clone(),
            }
        }
        if let Some(ref base) = args.base_url {
            match backend {
                Backend::Ollama => self.ollama.base_url = base.clone(),
                Backend::OpenAI => self.openai.base_url = base.clone(),
            }
        }
        if let Some(ref key) = args.api_key {
            self.openai.api_key = key.clone();
        }
    }

    pub fn backend(&self) -> Backend {
        Backend::from_str(&self.backend.provider)
    }

    /// Provider settings for the selected backend.
    pub fn llm_config(&self) -> LlmConfig {
        let timeout = self.backend.request_timeout_secs.map(Duration::from_secs);
        match self.backend() {
            Backend::Ollama => LlmConfig::new(Backend::Ollama)
                .with_base_url(Some(self.ollama.base_url.clone()))
                .with_model(Some(self.ollama.model.clone()))
                .with_timeout(timeout),
            Backend::OpenAI => LlmConfig::new(Backend::OpenAI)
                .with_base_url(Some(self.openai.base_url.clone()))
                .with_model(Some(self.openai.model.clone()))
                .with_api_key(Some(self.openai.api_key.clone()))
                .with_temperature(self.openai.temperature)
                .with_timeout(timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend(), Backend::Ollama);
        assert_eq!(config.server.port, 4000);

        let llm = config.llm_config();
        assert_eq!(llm.base_url, "http://localhost:11434");
        assert_eq!(llm.model, "llama3.1");
        assert!(llm.timeout.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
[backend]
provider = "openai"
request_timeout_secs = 30

[openai]
model = "medllm"
"#,
        )
        .unwrap();

        assert_eq!(config.backend(), Backend::OpenAI);
        let llm = config.llm_config();
        assert_eq!(llm.model, "medllm");
        assert_eq!(llm.base_url, "http://localhost:8000/v1");
        assert_eq!(llm.api_key.as_deref(), Some("not-needed"));
        assert_eq!(llm.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.ollama.model, "llama3.1");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("MODEL_BACKEND", "openai"),
                ("OPENAI_BASE_URL", "http://vllm:8000/v1"),
                ("OPENAI_API_KEY", "sk-local"),
                ("PORT", "8080"),
                ("GLOSSARY_PATH", "/etc/meditongue/glossary.json"),
            ]))
            .unwrap();

        assert_eq!(config.backend(), Backend::OpenAI);
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.glossary.path.as_deref(),
            Some("/etc/meditongue/glossary.json")
        );
        let llm = config.llm_config();
        assert_eq!(llm.base_url, "http://vllm:8000/v1");
        assert_eq!(llm.api_key.as_deref(), Some("sk-local"));
    }

    #[test]
    fn test_invalid_port_env() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_args_override_selected_backend() {
        let mut config = Config::default();
        config.apply_args(&BackendArgs {
            backend: Some("openai".to_string()),
            model: Some("medllm".to_string()),
            base_url: Some("http://gpu:9000/v1".to_string()),
            api_key: None,
            glossary: Some(PathBuf::from("terms.json")),
        });

        assert_eq!(config.openai.model, "medllm");
        assert_eq!(config.openai.base_url, "http://gpu:9000/v1");
        assert_eq!(config.ollama.model, "llama3.1");
        assert_eq!(config.glossary.path.as_deref(), Some("terms.json"));
    }
}
