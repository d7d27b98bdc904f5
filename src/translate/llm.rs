//! LLM completion providers

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::prompt::{Message, Prompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Ollama,
    OpenAI,
}

impl Backend {
    /// Unknown names fall back to the local backend.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "openai" => Self::OpenAI,
            _ => Self::Ollama,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434",
            Self::OpenAI => "http://localhost:8000/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Ollama => "llama3.1",
            Self::OpenAI => "gpt-oss-20b",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    // Display omits `body`; read it through `upstream_body`.
    #[error("{backend} request failed ({status})")]
    UpstreamStatus {
        backend: Backend,
        status: u16,
        body: String,
    },

    #[error("failed to reach {backend} at {url}: {source}")]
    Transport {
        backend: Backend,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode {backend} response: {source}")]
    Decode {
        backend: Backend,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ProviderError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body of a non-success upstream reply, for logs only.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            Self::UpstreamStatus { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// What `/health` reports about the active provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendInfo {
    pub backend: Backend,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: Backend,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Option<Duration>,
}

impl LlmConfig {
    pub fn new(backend: Backend) -> Self {
        Self {
            base_url: backend.default_base_url().to_string(),
            model: backend.default_model().to_string(),
            backend,
            api_key: None,
            temperature: 0.2,
            timeout: None,
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub fn with_base_url(mut self, url: Option<String>) -> Self {
        if let Some(u) = url {
            self.base_url = u.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(m) = model {
            self.model = m;
        }
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn info(&self) -> BackendInfo {
        BackendInfo {
            backend: self.backend,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
        }
    }

    fn http_client(&self) -> Result<reqwest::Client, ProviderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(ProviderError::Client)
    }
}

/// A text-generation backend: prompt in, raw model text out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError>;

    fn describe(&self) -> BackendInfo;
}

/// Builds the provider selected by `config.backend`.
pub fn create_provider(config: LlmConfig) -> Result<Box<dyn CompletionProvider>, ProviderError> {
    let provider: Box<dyn CompletionProvider> = match config.backend {
        Backend::Ollama => Box::new(OllamaProvider::new(config)?),
        Backend::OpenAI => Box::new(OpenAiProvider::new(config)?),
    };
    Ok(provider)
}

async fn check_status(
    backend: Backend,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::UpstreamStatus {
        backend,
        status: status.as_u16(),
        body,
    })
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Local `/api/generate` endpoint taking a single prompt string.
pub struct OllamaProvider {
    config: LlmConfig,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: LlmConfig) -> Result<Self, ProviderError> {
        let client = config.http_client()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let request = OllamaRequest {
            model: &self.config.model,
            prompt: prompt.to_single_string(),
            stream: false,
        };

        let url = format!("{}/api/generate", self.config.base_url);
        tracing::debug!(url = %url, model = %self.config.model, "Sending generate request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                backend: Backend::Ollama,
                url: url.clone(),
                source,
            })?;

        let result: OllamaResponse = check_status(Backend::Ollama, response)
            .await?
            .json()
            .await
            .map_err(|source| ProviderError::Decode {
                backend: Backend::Ollama,
                source,
            })?;

        Ok(result.response.unwrap_or_default().trim().to_string())
    }

    fn describe(&self) -> BackendInfo {
        self.config.info()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` endpoint taking role-tagged messages.
pub struct OpenAiProvider {
    config: LlmConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: LlmConfig) -> Result<Self, ProviderError> {
        let client = config.http_client()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: prompt.messages(),
            temperature: self.config.temperature,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        tracing::debug!(url = %url, model = %self.config.model, "Sending chat request");

        let mut req = self.client.post(&url).json(&request);
        if let Some(ref key) = self.config.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|source| ProviderError::Transport {
            backend: Backend::OpenAI,
            url: url.clone(),
            source,
        })?;

        let result: ChatResponse = check_status(Backend::OpenAI, response)
            .await?
            .json()
            .await
            .map_err(|source| ProviderError::Decode {
                backend: Backend::OpenAI,
                source,
            })?;

        Ok(result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    fn describe(&self) -> BackendInfo {
        self.config.info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    /// Serves `app` on an ephemeral local port and returns its base URL.
    async fn spawn_upstream(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "system text".to_string(),
            user: "user text".to_string(),
        }
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!(Backend::from_str("openai"), Backend::OpenAI);
        assert_eq!(Backend::from_str(" OpenAI "), Backend::OpenAI);
        assert_eq!(Backend::from_str("ollama"), Backend::Ollama);
        assert_eq!(Backend::from_str("something"), Backend::Ollama);
    }

    #[test]
    fn test_config_defaults_and_overrides() {
        let config = LlmConfig::new(Backend::OpenAI);
        assert_eq!(config.base_url, "http://localhost:8000/v1");
        assert_eq!(config.model, "gpt-oss-20b");

        let config = LlmConfig::new(Backend::Ollama)
            .with_base_url(Some("http://gpu-box:11434/".to_string()))
            .with_model(None);
        assert_eq!(config.base_url, "http://gpu-box:11434");
        assert_eq!(config.model, "llama3.1");
    }

    #[tokio::test]
    async fn test_ollama_complete() {
        let app = Router::new().route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "llama3.1");
                assert_eq!(body["stream"], false);
                assert_eq!(body["prompt"], "system text\n\nuser text");
                Json(json!({ "response": "  {\"translated\":\"hola\"}\n" }))
            }),
        );
        let base = spawn_upstream(app).await;

        let provider =
            OllamaProvider::new(LlmConfig::new(Backend::Ollama).with_base_url(Some(base)))
                .unwrap();
        let raw = provider.complete(&prompt()).await.unwrap();
        assert_eq!(raw, "{\"translated\":\"hola\"}");
    }

    #[tokio::test]
    async fn test_ollama_missing_response_field() {
        let app = Router::new().route("/api/generate", post(|| async { Json(json!({})) }));
        let base = spawn_upstream(app).await;

        let provider =
            OllamaProvider::new(LlmConfig::new(Backend::Ollama).with_base_url(Some(base)))
                .unwrap();
        assert_eq!(provider.complete(&prompt()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_ollama_upstream_status() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model loading") }),
        );
        let base = spawn_upstream(app).await;

        let provider =
            OllamaProvider::new(LlmConfig::new(Backend::Ollama).with_base_url(Some(base)))
                .unwrap();
        let err = provider.complete(&prompt()).await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "ollama request failed (503)");
        assert!(err.upstream_body().unwrap().contains("model loading"));
    }

    #[tokio::test]
    async fn test_openai_complete() {
        let app = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer secret");
                assert_eq!(body["model"], "gpt-oss-20b");
                assert_eq!(body["temperature"], 0.5);
                assert_eq!(body["messages"][0]["role"], "system");
                assert_eq!(body["messages"][1]["content"], "user text");
                Json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": "{\"translated\":\"hola\"}" } }]
                }))
            }),
        );
        let base = spawn_upstream(app).await;

        let config = LlmConfig::new(Backend::OpenAI)
            .with_base_url(Some(base))
            .with_api_key(Some("secret".to_string()))
            .with_temperature(0.5);
        let provider = OpenAiProvider::new(config).unwrap();
        let raw = provider.complete(&prompt()).await.unwrap();
        assert_eq!(raw, "{\"translated\":\"hola\"}");
    }

    #[tokio::test]
    async fn test_openai_empty_choices() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let base = spawn_upstream(app).await;

        let provider =
            OpenAiProvider::new(LlmConfig::new(Backend::OpenAI).with_base_url(Some(base)))
                .unwrap();
        assert_eq!(provider.complete(&prompt()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_openai_upstream_status() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = spawn_upstream(app).await;

        let provider =
            OpenAiProvider::new(LlmConfig::new(Backend::OpenAI).with_base_url(Some(base)))
                .unwrap();
        let err = provider.complete(&prompt()).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::UpstreamStatus {
                backend: Backend::OpenAI,
                status: 401,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let provider =
            OllamaProvider::new(LlmConfig::new(Backend::Ollama).with_base_url(Some(base)))
                .unwrap();
        let err = provider.complete(&prompt()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_create_provider_describes_backend() {
        let provider = create_provider(
            LlmConfig::new(Backend::OpenAI).with_model(Some("medllm".to_string())),
        )
        .unwrap();
        let info = provider.describe();
        assert_eq!(info.backend, Backend::OpenAI);
        assert_eq!(info.model, "medllm");
        assert_eq!(info.base_url, "http://localhost:8000/v1");
    }
}
